// ==========================================
// 菌菇加工运营系统 - API层错误类型
// ==========================================
// 职责: 汇总各层错误，转换为面向操作员的消息
// 约束: 任何单次失败都不致命；同步失败统一为一条可重试消息
// ==========================================

use crate::engine::error::EngineError;
use crate::i18n::{t, t_with_args};
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use crate::sync::error::SyncError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 身份与权限错误
    // ==========================================
    #[error("身份验证失败: {0}")]
    Unauthorized(String),

    #[error("权限不足: {actor}（{role}）无权操作 {area}")]
    PermissionDenied {
        actor: String,
        role: String,
        area: String,
    },

    // ==========================================
    // 云端同步错误
    // ==========================================
    #[error("未配置云端同步地址")]
    SyncNotConfigured,

    #[error("已有同步任务进行中")]
    SyncBusy,

    #[error("云端同步失败: {0}")]
    SyncFailed(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("文件不存在: {0}")]
    FileNotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向操作员的本地化消息
    pub fn user_message(&self) -> String {
        match self {
            ApiError::SyncNotConfigured => t("sync.not_configured"),
            ApiError::SyncBusy => t("sync.busy"),
            ApiError::SyncFailed(reason) => t_with_args("sync.failed", &[("reason", reason)]),
            ApiError::FileNotFound(path) => t_with_args("import.file_not_found", &[("path", path)]),
            ApiError::Unauthorized(reason) => t_with_args("auth.unauthorized", &[("reason", reason)]),
            ApiError::PermissionDenied { actor, role, area } => t_with_args(
                "auth.permission_denied",
                &[("actor", actor), ("role", role), ("area", area)],
            ),
            other => other.to_string(),
        }
    }

    /// 是否可由操作员直接重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::SyncFailed(_) | ApiError::SyncBusy)
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg) => ApiError::InvalidInput(msg),
            EngineError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            EngineError::InvalidOperation(msg) => ApiError::BusinessRuleViolation(msg),
            EngineError::InvalidStateTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }
        }
    }
}

// ==========================================
// 从 SyncError 转换
// ==========================================
impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::NotConfigured => ApiError::SyncNotConfigured,
            SyncError::AlreadyRunning => ApiError::SyncBusy,
            SyncError::NothingToPush => ApiError::BusinessRuleViolation(err.to_string()),
            SyncError::LockError(msg) => ApiError::InternalError(msg),
            other => ApiError::SyncFailed(other.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::FileNotFound(path) => ApiError::FileNotFound(path),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
