// ==========================================
// 菌菇加工运营系统 - 批次领域模型
// ==========================================
// 批次: 一份可追溯的收货物料，从收货到包装
// 不变量: good_weight = max(0, total_weight - spoiled_weight)
// 生命周期: 只追加，不删除
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::delivery::PendingDelivery;
use crate::domain::types::{BatchStatus, QcResult};

// ==========================================
// Batch - 生产批次
// ==========================================
// 字段命名与云端表格一致 (camelCase)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    // ===== 标识 =====
    pub id: String, // 批次号，创建后不可变

    // ===== 收货信息 =====
    pub farmer_name: String,
    pub farm_id: String,
    pub received_at: DateTime<Utc>,
    pub mushroom_type: String,
    pub total_weight: f64,   // kg
    pub spoiled_weight: f64, // kg
    pub good_weight: f64,    // kg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spoilage_reason: Option<String>,
    pub status: BatchStatus,

    // ===== 加工数据 =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wash_time: Option<f64>, // 分钟
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_usage: Option<f64>, // 升
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drying_time: Option<f64>, // 分钟

    // ===== 质检数据 =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qc_status: Option<QcResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qc_notes: Option<String>,

    // ===== 包装数据 =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packed_tins: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,

    // ===== 财务数据 =====
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<i64>, // 百分比，已取整
}

/// 计算合格重量（非负）
pub fn compute_good_weight(total_weight: f64, spoiled_weight: f64) -> f64 {
    (total_weight - spoiled_weight).max(0.0)
}

impl Batch {
    /// 应用状态推进附带的字段（仅覆盖提供了值的字段）
    pub fn apply_update(&mut self, update: BatchUpdate) {
        if let Some(recipe) = update.recipe {
            self.recipe = Some(recipe);
        }
        if let Some(metrics) = update.metrics {
            self.wash_time = Some(metrics.wash_time);
            self.water_usage = Some(metrics.water_usage);
            self.drying_time = Some(metrics.drying_time);
        }
        if let Some(qc) = update.qc_status {
            self.qc_status = Some(qc);
        }
        if let Some(notes) = update.qc_notes {
            self.qc_notes = Some(notes);
        }
        if let Some(tins) = update.packed_tins {
            self.packed_tins = Some(tins);
        }
        if let Some(qr) = update.qr_code {
            self.qr_code = Some(qr);
        }
        if let Some(fin) = update.financials {
            self.cost = Some(fin.cost);
            self.estimated_revenue = Some(fin.revenue);
            self.margin = Some(fin.margin);
        }
    }

    /// 是否已完成包装（带财务数据）
    pub fn is_packed(&self) -> bool {
        self.packed_tins.is_some()
    }
}

// ==========================================
// NewBatch - 创建批次的输入
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewBatch {
    /// 指定批次号（来自到货单）；None 时由仓储生成
    pub id: Option<String>,
    pub farmer_name: String,
    pub farm_id: String,
    pub mushroom_type: String,
    pub total_weight: f64,
    pub spoiled_weight: f64,
    /// 损耗原因（如 "Mold / Bruising"、"Pest Damage"），空白视为未填写
    pub spoilage_reason: Option<String>,
    /// 收货时间；None 时取创建时刻
    pub received_at: Option<DateTime<Utc>>,
}

impl NewBatch {
    /// 以待验收到货为种子构造批次输入
    ///
    /// 缺失字段用空值占位，由 `BatchStore::create` 统一校验
    pub fn from_pending(delivery: &PendingDelivery) -> Self {
        Self {
            id: delivery.id.clone(),
            farmer_name: delivery.farmer_name.clone().unwrap_or_default(),
            farm_id: delivery.farm_id.clone().unwrap_or_default(),
            mushroom_type: delivery.mushroom_type.clone().unwrap_or_default(),
            total_weight: delivery.total_weight.unwrap_or(0.0),
            spoiled_weight: delivery.spoiled_weight.unwrap_or(0.0),
            spoilage_reason: delivery.spoilage_reason.clone(),
            received_at: delivery.received_at,
        }
    }
}

// ==========================================
// ProcessMetrics - 加工工艺参数
// ==========================================
// 由调用方的配方公式计算得出
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessMetrics {
    pub wash_time: f64,   // 分钟
    pub water_usage: f64, // 升
    pub drying_time: f64, // 分钟
}

// ==========================================
// Financials - 包装结算
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Financials {
    pub cost: f64,
    pub revenue: f64,
    pub margin: i64,
}

// ==========================================
// BatchUpdate - 状态推进时合并的字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchUpdate {
    pub recipe: Option<String>,
    pub metrics: Option<ProcessMetrics>,
    pub qc_status: Option<QcResult>,
    pub qc_notes: Option<String>,
    pub packed_tins: Option<u32>,
    pub qr_code: Option<String>,
    pub financials: Option<Financials>,
}
