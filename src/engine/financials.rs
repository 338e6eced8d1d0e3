// ==========================================
// 菌菇加工运营系统 - 包装结算
// ==========================================
// 成本 = 合格重量 × 原料单价 + 人工固定费 + 装罐数 × 包材单价
// 收入 = 装罐数 × 单罐售价
// 毛利率 = round((收入 - 成本) / 收入 × 100)，四舍五入方向为 +∞
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::batch::Financials;
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// PackingPricing - 结算单价
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PackingPricing {
    pub unit_raw_cost: f64,  // 每 kg 合格原料成本
    pub labor_flat: f64,     // 每批人工固定费
    pub unit_pack_cost: f64, // 每罐包材成本
    pub unit_tin_price: f64, // 每罐售价
}

impl Default for PackingPricing {
    fn default() -> Self {
        Self {
            unit_raw_cost: 5.0,
            labor_flat: 20.0,
            unit_pack_cost: 0.1,
            unit_tin_price: 0.40,
        }
    }
}

impl PackingPricing {
    /// 计算包装结算
    ///
    /// # 错误
    /// - InvalidOperation: 装罐数为 0 或售价非正（收入为 0 无法计算毛利率）
    pub fn compute(&self, good_weight: f64, pack_count: u32) -> EngineResult<Financials> {
        if pack_count == 0 {
            return Err(EngineError::InvalidOperation(
                "装罐数为 0，无法计算毛利率".to_string(),
            ));
        }

        let revenue = f64::from(pack_count) * self.unit_tin_price;
        if !revenue.is_finite() || revenue <= 0.0 {
            return Err(EngineError::InvalidOperation(format!(
                "收入非正，无法计算毛利率: {}",
                revenue
            )));
        }

        let cost = good_weight * self.unit_raw_cost
            + self.labor_flat
            + f64::from(pack_count) * self.unit_pack_cost;
        let margin = ((revenue - cost) / revenue * 100.0 + 0.5).floor() as i64;

        Ok(Financials {
            cost: round_cents(cost),
            revenue: round_cents(revenue),
            margin,
        })
    }
}

/// 金额保留两位小数
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
