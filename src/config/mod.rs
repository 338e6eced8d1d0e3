// ==========================================
// 菌菇加工运营系统 - 配置层
// ==========================================
// 职责: 系统配置管理（结算单价/耗材映射/同步端点/语言）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

pub use config_manager::{config_keys, ConfigManager, SyncSettings};
