// ==========================================
// 菌菇加工运营系统 - 云端同步错误类型
// ==========================================
// 网络/超时/状态码/解析失败统一视为“网络错误”，不得破坏内存状态
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("未配置云端同步地址")]
    NotConfigured,

    #[error("已有同步任务进行中")]
    AlreadyRunning,

    #[error("没有可推送的批次")]
    NothingToPush,

    #[error("同步超时: {secs}秒未响应")]
    Timeout { secs: u64 },

    #[error("网络请求失败: {0}")]
    Network(String),

    #[error("云端返回错误状态: status={status}, body={body}")]
    Status { status: u16, body: String },

    #[error("响应解析失败: {0}")]
    Parse(String),

    #[error("共享状态锁获取失败: {0}")]
    LockError(String),
}

impl SyncError {
    /// 是否属于网络类失败（可重试）
    pub fn is_network_failure(&self) -> bool {
        matches!(
            self,
            SyncError::Timeout { .. }
                | SyncError::Network(_)
                | SyncError::Status { .. }
                | SyncError::Parse(_)
        )
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SyncError::Parse(err.to_string())
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

/// Result 类型别名
pub type SyncResult<T> = Result<T, SyncError>;
