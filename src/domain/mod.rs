// ==========================================
// 菌菇加工运营系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod alert;
pub mod batch;
pub mod delivery;
pub mod inventory;
pub mod types;
pub mod user;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use alert::Alert;
pub use batch::{compute_good_weight, Batch, BatchUpdate, Financials, NewBatch, ProcessMetrics};
pub use delivery::{CandidateBatch, DeliveryRef, PendingDelivery};
pub use inventory::{default_inventory, InventoryItem, InventorySnapshot};
pub use types::{AlertSource, AlertType, BatchStatus, QcResult, StockStatus};
pub use user::{AccessScope, NewUser, Role, User, WorkArea};
