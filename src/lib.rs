// ==========================================
// 菌菇加工运营系统 - 核心库
// ==========================================
// 范围: 批次生命周期状态机 + 云端到货对账
// 技术栈: Rust + SQLite (配置/审计) + 内存仓储
// 系统定位: 单租户运营看板后端 (单一逻辑执行者)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 批次仓储/到货对账/库存台账/预警日志
pub mod engine;

// 云端同步层 - push/pull 交换
pub mod sync;

// 导入层 - 到货表 (CSV/Excel)
pub mod importer;

// 数据仓储层 - 操作日志/操作员账号
pub mod repository;

// 口令重置通知
pub mod notify;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务工作流接口
pub mod api;

// 应用层 - 共享状态装配
pub mod app;

// 交互式会话
pub mod shell;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    Alert, AlertSource, AlertType, Batch, BatchStatus, BatchUpdate, CandidateBatch, DeliveryRef,
    InventoryItem, NewBatch, NewUser, PendingDelivery, ProcessMetrics, QcResult, Role, StockStatus,
    User, WorkArea,
};

pub use engine::{
    AlertLog, BatchStore, DeliveryQueue, EngineError, EngineResult, FacilityState,
    InMemoryBatchStore, InventoryLedger, MergeOutcome, PackingPricing, SharedFacility,
};

pub use api::{
    AlertApi, ApiError, ApiResult, DashboardApi, InventoryApi, PackingApi, ProcessingApi,
    ReceivingApi, SyncApi, UserApi,
};

pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "菌菇加工运营系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
