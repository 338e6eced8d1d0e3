// ==========================================
// 菌菇加工运营系统 - 加工 API
// ==========================================
// 工序: Received → Washing → Drying → Cooking → QC Pending
// 质检: Pass → Ready to Pack；Fail → Completed
// 约束: 每一步要求批次处于该步的源状态，不允许跳步
// ==========================================

use tracing::info;

use crate::api::common::{lock_facility, AccessControl, AuditTrail};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::batch::{Batch, BatchUpdate, ProcessMetrics};
use crate::domain::types::{BatchStatus, QcResult};
use crate::domain::user::WorkArea;
use crate::engine::facility::SharedFacility;

pub struct ProcessingApi {
    state: SharedFacility,
    audit: AuditTrail,
    access: AccessControl,
}

impl ProcessingApi {
    pub fn new(state: SharedFacility, audit: AuditTrail, access: AccessControl) -> Self {
        Self { state, audit, access }
    }

    /// 加工中的批次（Received..=QC Pending），新的在前
    pub fn list_active(&self) -> ApiResult<Vec<Batch>> {
        let state = lock_facility(&self.state)?;
        Ok(state
            .batches
            .list()
            .into_iter()
            .filter(|b| b.status.is_in_processing())
            .collect())
    }

    /// 开始清洗: 记录配方与工艺参数
    pub fn start_processing(
        &self,
        id: &str,
        recipe: &str,
        metrics: ProcessMetrics,
        actor: &str,
    ) -> ApiResult<Batch> {
        self.access.authorize(actor, WorkArea::Processing)?;
        if recipe.trim().is_empty() {
            return Err(ApiError::InvalidInput("配方不能为空".to_string()));
        }
        let update = BatchUpdate {
            recipe: Some(recipe.trim().to_string()),
            metrics: Some(metrics),
            ..Default::default()
        };
        self.step(id, BatchStatus::Received, BatchStatus::Washing, update, actor)
    }

    pub fn start_drying(&self, id: &str, actor: &str) -> ApiResult<Batch> {
        self.step(
            id,
            BatchStatus::Washing,
            BatchStatus::Drying,
            BatchUpdate::default(),
            actor,
        )
    }

    pub fn finish_drying(&self, id: &str, actor: &str) -> ApiResult<Batch> {
        self.step(
            id,
            BatchStatus::Drying,
            BatchStatus::Cooking,
            BatchUpdate::default(),
            actor,
        )
    }

    pub fn request_qc(&self, id: &str, actor: &str) -> ApiResult<Batch> {
        self.step(
            id,
            BatchStatus::Cooking,
            BatchStatus::QcPending,
            BatchUpdate::default(),
            actor,
        )
    }

    /// 录入质检结果
    pub fn submit_qc(
        &self,
        id: &str,
        result: QcResult,
        notes: Option<&str>,
        actor: &str,
    ) -> ApiResult<Batch> {
        self.access.authorize(actor, WorkArea::Processing)?;
        let target = match result {
            QcResult::Pass => BatchStatus::ReadyToPack,
            QcResult::Fail => BatchStatus::Completed,
        };
        let update = BatchUpdate {
            qc_status: Some(result),
            qc_notes: notes
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            ..Default::default()
        };

        let batch = self.transition(id, BatchStatus::QcPending, target, update)?;
        info!(batch_id = %id, result = %result, "质检已录入");
        self.audit.record(
            ActionLog::new(ActionType::SubmitQc, actor)
                .with_target(id)
                .with_payload(serde_json::json!({
                    "result": result,
                    "notes": batch.qc_notes,
                })),
        );
        Ok(batch)
    }

    fn step(
        &self,
        id: &str,
        from: BatchStatus,
        to: BatchStatus,
        update: BatchUpdate,
        actor: &str,
    ) -> ApiResult<Batch> {
        self.access.authorize(actor, WorkArea::Processing)?;
        let batch = self.transition(id, from, to, update)?;
        self.audit.record(
            ActionLog::new(ActionType::AdvanceBatch, actor)
                .with_target(id)
                .with_detail(format!("{} → {}", from, to)),
        );
        Ok(batch)
    }

    /// 校验源状态后推进
    fn transition(
        &self,
        id: &str,
        from: BatchStatus,
        to: BatchStatus,
        update: BatchUpdate,
    ) -> ApiResult<Batch> {
        let mut state = lock_facility(&self.state)?;
        let current = state
            .batches
            .get(id)
            .map(|b| b.status)
            .ok_or_else(|| ApiError::NotFound(format!("Batch(id={})不存在", id)))?;

        if current != from {
            return Err(ApiError::InvalidStateTransition {
                from: current.to_string(),
                to: to.to_string(),
            });
        }

        Ok(state.batches.advance(id, to, update)?)
    }
}
