// ==========================================
// 菌菇加工运营系统 - 云端同步 API
// ==========================================
// 职责: push/pull 入口，错误统一转为 ApiError
// 约束: 同步进行中再次调用返回 SyncBusy；失败不改动任何状态；仅管理岗可同步
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::api::common::{AccessControl, AuditTrail};
use crate::api::error::ApiResult;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::user::WorkArea;
use crate::i18n::t_with_args;
use crate::sync::service::{CloudSyncService, PullReport, PushReport};

pub struct SyncApi {
    service: Arc<CloudSyncService>,
    audit: AuditTrail,
    access: AccessControl,
}

impl SyncApi {
    pub fn new(service: Arc<CloudSyncService>, audit: AuditTrail, access: AccessControl) -> Self {
        Self {
            service,
            audit,
            access,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.service.is_configured()
    }

    /// 界面据此禁用同步按钮
    pub fn is_busy(&self) -> bool {
        self.service.is_busy()
    }

    pub fn last_push_at(&self) -> Option<DateTime<Utc>> {
        self.service.last_push_at()
    }

    /// 推送全量数据
    pub async fn push(&self, actor: &str) -> ApiResult<PushReport> {
        self.access.authorize(actor, WorkArea::Sync)?;
        let report = self.service.push().await.map_err(|e| {
            warn!(error = %e, "云端推送失败");
            e
        })?;

        self.audit.record(
            ActionLog::new(ActionType::SyncPush, actor)
                .with_payload(serde_json::json!({
                    "batches": report.batch_count,
                    "inventory": report.inventory_count,
                }))
                .with_detail(report.message.as_str()),
        );
        Ok(report)
    }

    /// 拉取外部到货
    pub async fn pull(&self, actor: &str) -> ApiResult<PullReport> {
        self.access.authorize(actor, WorkArea::Sync)?;
        let report = self.service.pull().await.map_err(|e| {
            warn!(error = %e, "云端拉取失败");
            e
        })?;

        self.audit.record(
            ActionLog::new(ActionType::SyncPull, actor).with_payload(serde_json::json!({
                "received": report.received,
                "admitted": report.admitted,
                "duplicates": report.duplicates,
            })),
        );
        Ok(report)
    }

    /// 推送成功提示
    pub fn push_message(report: &PushReport) -> String {
        t_with_args("sync.push_ok", &[("message", report.message.as_str())])
    }
}
