// ==========================================
// 菌菇加工运营系统 - 包装 API
// ==========================================
// 流程: 待包装批次 → 打印标签（扣 1 张二维码标签）→ 扫码完成
// 完成时: 结算成本/收入/毛利率，状态 → Completed，扣减包装罐
// ==========================================

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::common::{lock_facility, AccessControl, AuditTrail};
use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::batch::{Batch, BatchUpdate};
use crate::domain::types::BatchStatus;
use crate::domain::user::WorkArea;
use crate::engine::facility::{FacilityState, SharedFacility};

/// 包装完成结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingReceipt {
    pub batch: Batch,
    /// 包装罐剩余数量（物料不存在时为 None）
    pub tins_remaining: Option<f64>,
    pub low_stock_alerted: bool,
}

/// 标签二维码内容
pub fn label_payload(batch: &Batch) -> String {
    format!(
        "MUSHROOM|{}|{}|{}|{}",
        batch.id,
        batch.mushroom_type,
        batch.farmer_name,
        batch.received_at.format("%Y-%m-%d")
    )
}

pub struct PackingApi {
    state: SharedFacility,
    audit: AuditTrail,
    access: AccessControl,
    config: Arc<ConfigManager>,
}

impl PackingApi {
    pub fn new(
        state: SharedFacility,
        audit: AuditTrail,
        access: AccessControl,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            state,
            audit,
            access,
            config,
        }
    }

    /// 待包装批次，新的在前
    pub fn list_ready(&self) -> ApiResult<Vec<Batch>> {
        let state = lock_facility(&self.state)?;
        Ok(state
            .batches
            .list()
            .into_iter()
            .filter(|b| b.status == BatchStatus::ReadyToPack)
            .collect())
    }

    /// 生成标签并扣减一张二维码标签
    pub fn generate_label(&self, id: &str, actor: &str) -> ApiResult<String> {
        self.access.authorize(actor, WorkArea::Packing)?;
        let label_item = self.config.get_label_item_id()?;

        let payload = {
            let mut state = lock_facility(&self.state)?;
            let batch = ready_batch(&state, id)?;
            let payload = label_payload(batch);

            let state = &mut *state;
            if let Err(e) = state.inventory.deduct(&label_item, 1.0, &mut state.alerts) {
                // 标签物料缺失不阻断包装
                warn!(item_id = %label_item, error = %e, "二维码标签扣减失败");
            }
            payload
        };

        info!(batch_id = %id, "标签已生成");
        self.audit.record(
            ActionLog::new(ActionType::GenerateLabel, actor)
                .with_target(id)
                .with_detail(payload.clone()),
        );
        Ok(payload)
    }

    /// 扫码完成包装
    ///
    /// # 错误
    /// - NotFound: 批次不存在
    /// - InvalidStateTransition: 批次不处于 Ready to Pack
    /// - BusinessRuleViolation: 装罐数为 0
    pub fn complete_packing(&self, id: &str, pack_count: u32, actor: &str) -> ApiResult<PackingReceipt> {
        self.access.authorize(actor, WorkArea::Packing)?;
        let pricing = self.config.get_packing_pricing()?;
        let tin_item = self.config.get_tin_item_id()?;

        let receipt = {
            let mut state = lock_facility(&self.state)?;
            let batch = ready_batch(&state, id)?;
            let financials = pricing.compute(batch.good_weight, pack_count)?;
            let qr_code = label_payload(batch);

            let batch = state.batches.advance(
                id,
                BatchStatus::Completed,
                BatchUpdate {
                    packed_tins: Some(pack_count),
                    qr_code: Some(qr_code),
                    financials: Some(financials),
                    ..Default::default()
                },
            )?;

            let state = &mut *state;
            let (tins_remaining, low_stock_alerted) =
                match state
                    .inventory
                    .deduct(&tin_item, f64::from(pack_count), &mut state.alerts)
                {
                    Ok((item, alerted)) => (Some(item.quantity), alerted),
                    Err(e) => {
                        warn!(item_id = %tin_item, error = %e, "包装罐扣减失败");
                        (None, false)
                    }
                };

            PackingReceipt {
                batch,
                tins_remaining,
                low_stock_alerted,
            }
        };

        info!(
            batch_id = %id,
            pack_count,
            revenue = ?receipt.batch.estimated_revenue,
            margin = ?receipt.batch.margin,
            "包装完成"
        );
        self.audit.record(
            ActionLog::new(ActionType::CompletePacking, actor)
                .with_target(id)
                .with_payload(serde_json::json!({
                    "packCount": pack_count,
                    "cost": receipt.batch.cost,
                    "revenue": receipt.batch.estimated_revenue,
                    "margin": receipt.batch.margin,
                })),
        );
        Ok(receipt)
    }
}

fn ready_batch<'a>(state: &'a FacilityState, id: &str) -> ApiResult<&'a Batch> {
    let batch = state
        .batches
        .get(id)
        .ok_or_else(|| ApiError::NotFound(format!("Batch(id={})不存在", id)))?;
    if batch.status != BatchStatus::ReadyToPack {
        return Err(ApiError::InvalidStateTransition {
            from: batch.status.to_string(),
            to: BatchStatus::Completed.to_string(),
        });
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::common::test_support;
    use crate::domain::batch::NewBatch;
    use crate::domain::inventory::default_inventory;
    use crate::domain::types::QcResult;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn setup() -> (PackingApi, SharedFacility, String) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let config = Arc::new(ConfigManager::from_connection(Arc::new(Mutex::new(conn))));
        let (audit, access, _) = test_support::context();
        let state = FacilityState::in_memory(default_inventory()).into_shared();

        let id = {
            let mut s = state.lock().unwrap();
            let id = s
                .batches
                .create(NewBatch {
                    farmer_name: "Village A".to_string(),
                    mushroom_type: "Oyster Mushrooms".to_string(),
                    total_weight: 50.0,
                    spoiled_weight: 2.0,
                    ..Default::default()
                })
                .unwrap()
                .id;
            s.batches
                .advance(
                    &id,
                    BatchStatus::ReadyToPack,
                    BatchUpdate {
                        qc_status: Some(QcResult::Pass),
                        ..Default::default()
                    },
                )
                .unwrap();
            id
        };

        (
            PackingApi::new(state.clone(), audit, access, config),
            state,
            id,
        )
    }

    #[test]
    fn test_generate_label_deducts_one_label() {
        let (api, state, id) = setup();
        let payload = api.generate_label(&id, "op").unwrap();

        assert!(payload.contains(&id));
        assert_eq!(state.lock().unwrap().inventory.get("inv2").unwrap().quantity, 119.0);
    }

    #[test]
    fn test_complete_packing_financials() {
        let (api, state, id) = setup();
        let receipt = api.complete_packing(&id, 200, "op").unwrap();

        let batch = receipt.batch;
        assert_eq!(batch.status, BatchStatus::Completed);
        assert_eq!(batch.packed_tins, Some(200));
        assert_eq!(batch.estimated_revenue, Some(80.0));
        assert_eq!(batch.cost, Some(280.0));
        assert_eq!(batch.margin, Some(-250));
        assert!(batch.qr_code.is_some());

        // 45 罐不足 200，扣至 0
        assert_eq!(receipt.tins_remaining, Some(0.0));
        assert!(!receipt.low_stock_alerted); // 45 已低于阈值 50，不重复预警
        assert_eq!(state.lock().unwrap().inventory.get("inv1").unwrap().quantity, 0.0);
        assert!(api.list_ready().unwrap().is_empty());
    }

    #[test]
    fn test_zero_pack_count_rejected() {
        let (api, state, id) = setup();
        let err = api.complete_packing(&id, 0, "op").unwrap_err();

        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
        assert_eq!(
            state.lock().unwrap().batches.get(&id).unwrap().status,
            BatchStatus::ReadyToPack
        );
    }

    #[test]
    fn test_packing_requires_ready_status() {
        let (api, _, id) = setup();
        api.complete_packing(&id, 10, "op").unwrap();

        let err = api.complete_packing(&id, 10, "op").unwrap_err();
        assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
    }

    #[test]
    fn test_packing_station_roles() {
        let (api, state, id) = setup();

        for actor in ["worker", "finance"] {
            let err = api.complete_packing(&id, 10, actor).unwrap_err();
            assert!(matches!(err, ApiError::PermissionDenied { .. }));
        }
        assert_eq!(
            state.lock().unwrap().batches.get(&id).unwrap().status,
            BatchStatus::ReadyToPack
        );
        // 越权请求不扣标签
        assert!(api.generate_label(&id, "finance").is_err());
        assert_eq!(state.lock().unwrap().inventory.get("inv2").unwrap().quantity, 120.0);

        let receipt = api.complete_packing(&id, 10, "packer").unwrap();
        assert_eq!(receipt.batch.status, BatchStatus::Completed);
    }
}
