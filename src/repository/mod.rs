// ==========================================
// 菌菇加工运营系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 审计日志与操作员账号落库，屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod user_repo;

pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use user_repo::{StoredUser, UserRepository};
