// ==========================================
// 菌菇加工运营系统 - 云端同步服务
// ==========================================
// 约束:
// - 同一时刻最多一个同步操作（push/pull 共用一把在途锁）
// - 网络等待期间不持有车间状态锁
// - pull 失败不改动任何状态；成功后一次性替换待验收队列
// ==========================================

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::engine::facility::SharedFacility;
use crate::sync::error::{SyncError, SyncResult};
use crate::sync::transport::SyncTransport;
use crate::sync::wire::PushRequest;

/// 默认同步超时（秒）
pub const DEFAULT_SYNC_TIMEOUT_SECS: u64 = 10;

/// push 结果
#[derive(Debug, Clone, PartialEq)]
pub struct PushReport {
    pub message: String,
    pub pushed_at: DateTime<Utc>,
    pub batch_count: usize,
    pub inventory_count: usize,
}

/// pull 结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullReport {
    pub received: usize,
    pub admitted: usize,
    pub duplicates: usize,
    pub queue_len: usize,
}

pub struct CloudSyncService {
    transport: Option<Arc<dyn SyncTransport>>,
    timeout: Duration,
    state: SharedFacility,
    in_flight: tokio::sync::Mutex<()>,
    last_push_at: Mutex<Option<DateTime<Utc>>>,
}

impl CloudSyncService {
    pub fn new(
        transport: Option<Arc<dyn SyncTransport>>,
        timeout: Duration,
        state: SharedFacility,
    ) -> Self {
        Self {
            transport,
            timeout,
            state,
            in_flight: tokio::sync::Mutex::new(()),
            last_push_at: Mutex::new(None),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    /// 是否有同步正在进行（界面据此禁用按钮）
    pub fn is_busy(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// 最近一次成功 push 的时间
    pub fn last_push_at(&self) -> Option<DateTime<Utc>> {
        self.last_push_at
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }

    /// 推送全量批次与库存快照
    #[instrument(skip(self))]
    pub async fn push(&self) -> SyncResult<PushReport> {
        let transport = self.transport.as_ref().ok_or(SyncError::NotConfigured)?;
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;

        let request = {
            let state = self
                .state
                .lock()
                .map_err(|e| SyncError::LockError(e.to_string()))?;
            let batches = state.batches.list();
            // 空快照会覆盖云端已有数据
            if batches.is_empty() {
                return Err(SyncError::NothingToPush);
            }
            let snapshot = state.inventory.items().iter().map(|i| i.snapshot()).collect();
            PushRequest::new(batches, snapshot)
        };
        let batch_count = request.batches.len();
        let inventory_count = request.inventory.len();

        let response = self.with_timeout(transport.push(&request)).await?;

        let pushed_at = Utc::now();
        match self.last_push_at.lock() {
            Ok(mut last) => *last = Some(pushed_at),
            Err(poisoned) => *poisoned.into_inner() = Some(pushed_at),
        }

        info!(batch_count, inventory_count, message = %response.message, "云端推送成功");
        Ok(PushReport {
            message: response.message,
            pushed_at,
            batch_count,
            inventory_count,
        })
    }

    /// 拉取外部到货并合并进待验收队列
    #[instrument(skip(self))]
    pub async fn pull(&self) -> SyncResult<PullReport> {
        let transport = self.transport.as_ref().ok_or(SyncError::NotConfigured)?;
        let _guard = self
            .in_flight
            .try_lock()
            .map_err(|_| SyncError::AlreadyRunning)?;

        let response = self.with_timeout(transport.pull()).await?;
        let candidates = response.into_candidates();

        let mut state = self
            .state
            .lock()
            .map_err(|e| SyncError::LockError(e.to_string()))?;
        let outcome = state.ingest_candidates(&candidates);

        let report = PullReport {
            received: candidates.len(),
            admitted: outcome.admitted_count(),
            duplicates: outcome.duplicates,
            queue_len: state.deliveries.len(),
        };
        info!(
            received = report.received,
            admitted = report.admitted,
            duplicates = report.duplicates,
            "云端拉取完成"
        );
        Ok(report)
    }

    async fn with_timeout<T, F>(&self, fut: F) -> SyncResult<T>
    where
        F: std::future::Future<Output = SyncResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => {
                if let Err(e) = &result {
                    warn!(error = %e, "云端同步失败");
                }
                result
            }
            Err(_) => {
                let secs = self.timeout.as_secs().max(1);
                warn!(timeout_secs = secs, "云端同步超时");
                Err(SyncError::Timeout { secs })
            }
        }
    }
}

impl std::fmt::Debug for CloudSyncService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudSyncService")
            .field("configured", &self.is_configured())
            .field("timeout", &self.timeout)
            .field("busy", &self.is_busy())
            .finish()
    }
}
