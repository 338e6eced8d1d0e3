// ==========================================
// 菌菇加工运营系统 - 应用层
// ==========================================
// 职责: 装配共享状态与各 API，供界面/命令行调用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
