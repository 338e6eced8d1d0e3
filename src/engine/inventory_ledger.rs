// ==========================================
// 菌菇加工运营系统 - 库存台账
// ==========================================
// 职责: 维护耗材数量；跌破阈值时发出预警
// 规则: 边沿触发，仅在 quantity > threshold 跌至 <= threshold 时预警一次
//       持续低位不重复预警；回升不预警
// ==========================================

use tracing::{info, warn};

use crate::domain::inventory::InventoryItem;
use crate::domain::types::{AlertSource, AlertType};
use crate::engine::alert_log::AlertLog;
use crate::engine::error::{EngineError, EngineResult};
use crate::i18n::t_with_args;

#[derive(Debug, Clone, Default)]
pub struct InventoryLedger {
    items: Vec<InventoryItem>,
}

impl InventoryLedger {
    /// 以固定物料清单初始化
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&InventoryItem> {
        self.items.iter().find(|i| i.id == id)
    }

    /// 设置物料数量
    ///
    /// # 返回
    /// - (更新后的物料, 是否发出了预警)
    ///
    /// # 错误
    /// - NotFound: 物料不存在
    /// - Validation: 数量为负或非有限值
    pub fn set_quantity(
        &mut self,
        id: &str,
        new_quantity: f64,
        alerts: &mut AlertLog,
    ) -> EngineResult<(InventoryItem, bool)> {
        if !new_quantity.is_finite() || new_quantity < 0.0 {
            return Err(EngineError::Validation(format!(
                "库存数量不能为负: {}",
                new_quantity
            )));
        }

        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| EngineError::not_found("InventoryItem", id))?;

        let was_above = item.quantity > item.threshold;
        item.quantity = new_quantity;
        let crossed = was_above && item.is_at_or_below_threshold();

        info!(
            item_id = %id,
            quantity = new_quantity,
            status = %item.status(),
            "库存已更新"
        );

        if crossed {
            warn!(item_id = %id, threshold = item.threshold, "库存跌破阈值");
            let quantity = format_quantity(new_quantity);
            alerts.add(
                t_with_args(
                    "alert.low_stock",
                    &[("name", item.name.as_str()), ("quantity", quantity.as_str())],
                ),
                AlertType::Warning,
                AlertSource::Inventory,
            );
        }

        Ok((item.clone(), crossed))
    }

    /// 扣减物料（不足时扣至 0），经 set_quantity 以保持预警规则
    pub fn deduct(
        &mut self,
        id: &str,
        amount: f64,
        alerts: &mut AlertLog,
    ) -> EngineResult<(InventoryItem, bool)> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(EngineError::Validation(format!("扣减数量不能为负: {}", amount)));
        }
        let current = self
            .get(id)
            .ok_or_else(|| EngineError::not_found("InventoryItem", id))?
            .quantity;
        self.set_quantity(id, (current - amount).max(0.0), alerts)
    }
}

// 整数数量不带小数点
fn format_quantity(quantity: f64) -> String {
    if quantity.fract() == 0.0 {
        format!("{}", quantity as i64)
    } else {
        format!("{}", quantity)
    }
}
