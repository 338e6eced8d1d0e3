// ==========================================
// 菌菇加工运营系统 - 云端同步层
// ==========================================
// 职责: 与表格后端的 push/pull 交换
// 红线: 失败不得破坏内存状态；不重试
// ==========================================

pub mod error;
pub mod service;
pub mod transport;
pub mod wire;

pub use error::{SyncError, SyncResult};
pub use service::{CloudSyncService, PullReport, PushReport, DEFAULT_SYNC_TIMEOUT_SECS};
pub use transport::{HttpSyncTransport, SyncTransport};
pub use wire::{PullResponse, PushRequest, PushResponse};
