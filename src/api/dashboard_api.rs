// ==========================================
// 菌菇加工运营系统 - 看板 API
// ==========================================
// 职责: 当日运营汇总（投料/损耗/包装/收入）与操作日志查询
// 损耗率 = 损耗 / 总投料 × 100，保留 1 位小数；超过 3% 触发损耗提示
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::api::common::lock_facility;
use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::ActionLog;
use crate::domain::inventory::InventorySnapshot;
use crate::domain::types::{BatchStatus, StockStatus};
use crate::engine::facility::SharedFacility;
use crate::engine::financials::round_cents;
use crate::repository::action_log_repo::ActionLogRepository;

/// 损耗率提示阈值（%）
pub const SPOILAGE_ALERT_RATE: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_input_kg: f64,
    pub total_spoilage_kg: f64,
    pub spoilage_rate: f64,
    pub spoilage_alert: bool,
    pub packed_tins: u64,
    pub estimated_revenue: f64,
    pub status_counts: BTreeMap<String, usize>,
    pub pending_deliveries: usize,
    pub active_alerts: usize,
    pub items_needing_attention: Vec<InventorySnapshot>,
}

pub struct DashboardApi {
    state: SharedFacility,
    action_log_repo: Arc<ActionLogRepository>,
}

impl DashboardApi {
    pub fn new(state: SharedFacility, action_log_repo: Arc<ActionLogRepository>) -> Self {
        Self {
            state,
            action_log_repo,
        }
    }

    /// 运营汇总
    pub fn summary(&self) -> ApiResult<DashboardSummary> {
        let state = lock_facility(&self.state)?;
        let batches = state.batches.list();

        let total_input: f64 = batches.iter().map(|b| b.total_weight).sum();
        let total_spoilage: f64 = batches.iter().map(|b| b.spoiled_weight).sum();
        let spoilage_rate = if total_input > 0.0 {
            (total_spoilage / total_input * 1000.0).round() / 10.0
        } else {
            0.0
        };

        let mut status_counts: BTreeMap<String, usize> = BatchStatus::ALL
            .iter()
            .map(|s| (s.to_string(), 0))
            .collect();
        for batch in &batches {
            *status_counts.entry(batch.status.to_string()).or_insert(0) += 1;
        }

        Ok(DashboardSummary {
            total_input_kg: round_cents(total_input),
            total_spoilage_kg: round_cents(total_spoilage),
            spoilage_rate,
            spoilage_alert: spoilage_rate > SPOILAGE_ALERT_RATE,
            packed_tins: batches
                .iter()
                .filter_map(|b| b.packed_tins)
                .map(u64::from)
                .sum(),
            estimated_revenue: round_cents(
                batches.iter().filter_map(|b| b.estimated_revenue).sum(),
            ),
            status_counts,
            pending_deliveries: state.deliveries.len(),
            active_alerts: state.alerts.len(),
            items_needing_attention: state
                .inventory
                .items()
                .iter()
                .filter(|i| i.status() != StockStatus::Ok)
                .map(|i| i.snapshot())
                .collect(),
        })
    }

    /// 最近操作日志
    pub fn recent_actions(&self, limit: usize) -> ApiResult<Vec<ActionLog>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("查询条数必须大于 0".to_string()));
        }
        Ok(self.action_log_repo.list_recent(limit)?)
    }

    /// 某个批次/物料/预警的操作日志
    pub fn actions_for(&self, target_id: &str) -> ApiResult<Vec<ActionLog>> {
        if target_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("目标ID不能为空".to_string()));
        }
        Ok(self.action_log_repo.find_by_target(target_id.trim())?)
    }
}
