// ==========================================
// 菌菇加工运营系统 - 领域类型定义
// ==========================================
// 序列化格式与看板/云端表格一致（人类可读的显示值）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 批次状态 (Batch Status)
// ==========================================
// 单向状态机:
// Received → Washing → Drying → Cooking → QcPending → {ReadyToPack | Completed} → Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatchStatus {
    #[serde(rename = "Received")]
    Received, // 已收货
    #[serde(rename = "Washing")]
    Washing, // 清洗中
    #[serde(rename = "Drying")]
    Drying, // 干燥中
    #[serde(rename = "Cooking")]
    Cooking, // 烹制中
    #[serde(rename = "QC Pending")]
    QcPending, // 待质检
    #[serde(rename = "Ready to Pack")]
    ReadyToPack, // 待包装
    #[serde(rename = "Completed")]
    Completed, // 已完结（包装完成或质检不合格）
}

impl BatchStatus {
    /// 全部状态（按生命周期顺序）
    pub const ALL: [BatchStatus; 7] = [
        BatchStatus::Received,
        BatchStatus::Washing,
        BatchStatus::Drying,
        BatchStatus::Cooking,
        BatchStatus::QcPending,
        BatchStatus::ReadyToPack,
        BatchStatus::Completed,
    ];

    /// 生命周期序号（只允许向更大的序号推进）
    pub fn stage(&self) -> u8 {
        match self {
            BatchStatus::Received => 0,
            BatchStatus::Washing => 1,
            BatchStatus::Drying => 2,
            BatchStatus::Cooking => 3,
            BatchStatus::QcPending => 4,
            BatchStatus::ReadyToPack => 5,
            BatchStatus::Completed => 6,
        }
    }

    /// 是否允许推进到目标状态（仅前向，不允许原地或回退）
    pub fn can_advance_to(&self, target: BatchStatus) -> bool {
        target.stage() > self.stage()
    }

    /// 是否处于加工环节（收货到待质检）
    pub fn is_in_processing(&self) -> bool {
        self.stage() <= BatchStatus::QcPending.stage()
    }

    /// 显示名（与序列化值一致）
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Received => "Received",
            BatchStatus::Washing => "Washing",
            BatchStatus::Drying => "Drying",
            BatchStatus::Cooking => "Cooking",
            BatchStatus::QcPending => "QC Pending",
            BatchStatus::ReadyToPack => "Ready to Pack",
            BatchStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 质检结果 (QC Result)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QcResult {
    Pass,
    Fail,
}

impl fmt::Display for QcResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QcResult::Pass => write!(f, "Pass"),
            QcResult::Fail => write!(f, "Fail"),
        }
    }
}

// ==========================================
// 库存状态 (Stock Status)
// ==========================================
// 纯派生值: 由 quantity 与 threshold 计算，不单独存储
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Low Stock")]
    LowStock,
    #[serde(rename = "Critical")]
    Critical,
}

impl StockStatus {
    /// 派生库存状态
    ///
    /// - quantity <= threshold/2 → Critical
    /// - threshold/2 < quantity <= threshold → LowStock
    /// - 其余 → Ok
    pub fn derive(quantity: f64, threshold: f64) -> Self {
        if quantity <= threshold / 2.0 {
            StockStatus::Critical
        } else if quantity <= threshold {
            StockStatus::LowStock
        } else {
            StockStatus::Ok
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockStatus::Ok => write!(f, "OK"),
            StockStatus::LowStock => write!(f, "Low Stock"),
            StockStatus::Critical => write!(f, "Critical"),
        }
    }
}

// ==========================================
// 预警类型 (Alert Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Warning,
    Error,
    Info,
}

impl fmt::Display for AlertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertType::Warning => write!(f, "warning"),
            AlertType::Error => write!(f, "error"),
            AlertType::Info => write!(f, "info"),
        }
    }
}

// ==========================================
// 预警来源 (Alert Source)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    Inventory, // 库存台账
    Delivery,  // 到货对账
    Sync,      // 云端同步
    Operator,  // 人工录入
}

impl fmt::Display for AlertSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSource::Inventory => write!(f, "inventory"),
            AlertSource::Delivery => write!(f, "delivery"),
            AlertSource::Sync => write!(f, "sync"),
            AlertSource::Operator => write!(f, "operator"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_status_derivation() {
        assert_eq!(StockStatus::derive(10.0, 20.0), StockStatus::Critical);
        assert_eq!(StockStatus::derive(15.0, 20.0), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(25.0, 20.0), StockStatus::Ok);

        // 边界: 恰好等于阈值/半阈值
        assert_eq!(StockStatus::derive(20.0, 20.0), StockStatus::LowStock);
        assert_eq!(StockStatus::derive(0.0, 20.0), StockStatus::Critical);
    }

    #[test]
    fn test_batch_status_forward_only() {
        assert!(BatchStatus::Received.can_advance_to(BatchStatus::Washing));
        assert!(BatchStatus::QcPending.can_advance_to(BatchStatus::Completed));
        assert!(BatchStatus::QcPending.can_advance_to(BatchStatus::ReadyToPack));
        assert!(!BatchStatus::Drying.can_advance_to(BatchStatus::Washing));
        assert!(!BatchStatus::Completed.can_advance_to(BatchStatus::Completed));
    }

    #[test]
    fn test_batch_status_serde_uses_display_names() {
        let json = serde_json::to_string(&BatchStatus::QcPending).unwrap();
        assert_eq!(json, "\"QC Pending\"");

        let parsed: BatchStatus = serde_json::from_str("\"Ready to Pack\"").unwrap();
        assert_eq!(parsed, BatchStatus::ReadyToPack);
    }
}
