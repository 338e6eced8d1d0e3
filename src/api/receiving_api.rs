// ==========================================
// 菌菇加工运营系统 - 收货 API
// ==========================================
// 职责: 手工建批、待验收队列查看/验收/丢弃、到货表导入
// 约束: 验收时先建批成功，再整体替换队列；写操作限收货岗
// ==========================================

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::api::common::{lock_facility, AccessControl, AuditTrail};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::batch::{Batch, NewBatch};
use crate::domain::delivery::{DeliveryRef, PendingDelivery};
use crate::domain::user::WorkArea;
use crate::engine::delivery_reconciler;
use crate::engine::facility::SharedFacility;
use crate::importer::DeliverySheetImporter;

/// 到货表导入结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryImportReport {
    pub rows: usize,
    pub admitted: usize,
    pub duplicates: usize,
    pub queue_len: usize,
}

// ==========================================
// ReceivingApi - 收货 API
// ==========================================
pub struct ReceivingApi {
    state: SharedFacility,
    audit: AuditTrail,
    access: AccessControl,
}

impl ReceivingApi {
    pub fn new(state: SharedFacility, audit: AuditTrail, access: AccessControl) -> Self {
        Self { state, audit, access }
    }

    /// 手工登记收货并建批
    pub fn create_batch(&self, data: NewBatch, actor: &str) -> ApiResult<Batch> {
        self.access.authorize(actor, WorkArea::Receiving)?;
        let batch = {
            let mut state = lock_facility(&self.state)?;
            state.batches.create(data)?
        };

        self.audit.record(
            ActionLog::new(ActionType::CreateBatch, actor)
                .with_target(batch.id.as_str())
                .with_payload(serde_json::json!({
                    "farmerName": batch.farmer_name,
                    "mushroomType": batch.mushroom_type,
                    "totalWeight": batch.total_weight,
                    "spoiledWeight": batch.spoiled_weight,
                    "spoilageReason": batch.spoilage_reason,
                })),
        );
        Ok(batch)
    }

    /// 查询单个批次
    pub fn get_batch(&self, id: &str) -> ApiResult<Batch> {
        let state = lock_facility(&self.state)?;
        state
            .batches
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("Batch(id={})不存在", id)))
    }

    /// 全部批次（新的在前）
    pub fn list_batches(&self) -> ApiResult<Vec<Batch>> {
        let state = lock_facility(&self.state)?;
        Ok(state.batches.list())
    }

    /// 待验收队列（队首为最早到货）
    pub fn list_pending(&self) -> ApiResult<Vec<PendingDelivery>> {
        let state = lock_facility(&self.state)?;
        Ok(state.deliveries.items().to_vec())
    }

    /// 验收到货: 转为正式批次
    ///
    /// 到货带批次号且未被占用时沿用该批次号，后续拉取可按标识去重
    pub fn accept_delivery(&self, target: &DeliveryRef, actor: &str) -> ApiResult<Batch> {
        self.access.authorize(actor, WorkArea::Receiving)?;
        let batch = {
            let mut state = lock_facility(&self.state)?;
            let (taken, remainder) = delivery_reconciler::accept(state.deliveries.items(), target)?;

            let mut data = NewBatch::from_pending(&taken);
            if data
                .id
                .as_deref()
                .is_some_and(|id| state.batches.contains(id))
            {
                data.id = None;
            }

            let batch = state.batches.create(data)?;
            state.deliveries.replace(remainder);
            batch
        };

        info!(delivery = %target, batch_id = %batch.id, "到货已验收");
        self.audit.record(
            ActionLog::new(ActionType::AcceptDelivery, actor)
                .with_target(batch.id.as_str())
                .with_detail(format!("验收到货 {}", target)),
        );
        Ok(batch)
    }

    /// 丢弃到货（不建批）
    pub fn discard_delivery(&self, target: &DeliveryRef, actor: &str) -> ApiResult<PendingDelivery> {
        self.access.authorize(actor, WorkArea::Receiving)?;
        let taken = {
            let mut state = lock_facility(&self.state)?;
            let (taken, remainder) = delivery_reconciler::accept(state.deliveries.items(), target)?;
            state.deliveries.replace(remainder);
            taken
        };

        info!(delivery = %target, "到货已丢弃");
        let mut log = ActionLog::new(ActionType::DiscardDelivery, actor)
            .with_detail(format!("丢弃到货 {}", target));
        if let Some(id) = &taken.id {
            log = log.with_target(id.as_str());
        }
        if let Ok(payload) = serde_json::to_value(&taken) {
            log = log.with_payload(payload);
        }
        self.audit.record(log);
        Ok(taken)
    }

    /// 导入到货表（CSV/Excel），与云端拉取走同一对账路径
    pub fn import_delivery_sheet(&self, path: &Path, actor: &str) -> ApiResult<DeliveryImportReport> {
        self.access.authorize(actor, WorkArea::Receiving)?;
        let candidates = DeliverySheetImporter::new().load(path)?;

        let report = {
            let mut state = lock_facility(&self.state)?;
            let outcome = state.ingest_candidates(&candidates);
            DeliveryImportReport {
                rows: candidates.len(),
                admitted: outcome.admitted_count(),
                duplicates: outcome.duplicates,
                queue_len: state.deliveries.len(),
            }
        };

        self.audit.record(
            ActionLog::new(ActionType::ImportDeliveries, actor)
                .with_payload(serde_json::json!({
                    "file": path.display().to_string(),
                    "rows": report.rows,
                    "admitted": report.admitted,
                    "duplicates": report.duplicates,
                })),
        );
        Ok(report)
    }
}
