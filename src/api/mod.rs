// ==========================================
// 菌菇加工运营系统 - API 层
// ==========================================
// 职责: 面向界面的业务工作流接口
// 所有 API 共享同一个 FacilityState；写操作先校验操作员角色，再记录操作日志
// ==========================================

pub mod alert_api;
pub mod common;
pub mod dashboard_api;
pub mod error;
pub mod inventory_api;
pub mod packing_api;
pub mod processing_api;
pub mod receiving_api;
pub mod sync_api;
pub mod user_api;

// 重导出核心类型
pub use alert_api::AlertApi;
pub use common::{AccessControl, AuditTrail};
pub use dashboard_api::{DashboardApi, DashboardSummary};
pub use error::{ApiError, ApiResult};
pub use inventory_api::{InventoryApi, StockChange};
pub use packing_api::{PackingApi, PackingReceipt};
pub use processing_api::ProcessingApi;
pub use receiving_api::{DeliveryImportReport, ReceivingApi};
pub use sync_api::SyncApi;
pub use user_api::UserApi;
