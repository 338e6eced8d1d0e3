// ==========================================
// 菌菇加工运营系统 - 库存物料模型
// ==========================================
// 不变量: status 永远由 quantity/threshold 派生，不单独存储
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::StockStatus;

// ==========================================
// InventoryItem - 可追踪耗材
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub threshold: f64,
}

impl InventoryItem {
    pub fn new(id: &str, name: &str, quantity: f64, unit: &str, threshold: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            threshold,
        }
    }

    /// 当前库存状态
    pub fn status(&self) -> StockStatus {
        StockStatus::derive(self.quantity, self.threshold)
    }

    /// 是否处于阈值以下（含阈值）
    pub fn is_at_or_below_threshold(&self) -> bool {
        self.quantity <= self.threshold
    }

    /// 带状态的只读视图（看板/云端推送使用）
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            item: self.clone(),
            status: self.status(),
        }
    }
}

// ==========================================
// InventorySnapshot - 带派生状态的库存视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub status: StockStatus,
}

/// 初始耗材清单
pub fn default_inventory() -> Vec<InventoryItem> {
    vec![
        InventoryItem::new("inv1", "Packaging Tins", 45.0, "units", 50.0),
        InventoryItem::new("inv2", "QR Labels", 120.0, "units", 100.0),
        InventoryItem::new("inv3", "Spicy Mix A", 5000.0, "g", 1000.0),
        InventoryItem::new("inv4", "Cooking Oil", 20.0, "L", 10.0),
    ]
}
