// ==========================================
// 菌菇加工运营系统 - 引擎层
// ==========================================
// 职责: 批次生命周期 + 到货对账 + 库存台账 + 预警日志 + 口令校验
// 红线: 不访问数据库、不发网络请求
// ==========================================

pub mod alert_log;
pub mod batch_store;
pub mod credentials;
pub mod delivery_reconciler;
pub mod error;
pub mod facility;
pub mod financials;
pub mod inventory_ledger;

// 重导出核心类型
pub use alert_log::AlertLog;
pub use batch_store::{BatchStore, InMemoryBatchStore};
pub use delivery_reconciler::{accept, merge, DeliveryQueue, MergeOutcome};
pub use error::{EngineError, EngineResult};
pub use facility::{FacilityState, SharedFacility};
pub use financials::{round_cents, PackingPricing};
pub use inventory_ledger::InventoryLedger;
