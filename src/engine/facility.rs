// ==========================================
// 菌菇加工运营系统 - 车间共享状态
// ==========================================
// 职责: 聚合四个核心组件（批次仓储/待验收队列/库存台账/预警日志）
// 约束: 进程启动时构造一次，通过引用传递给所有工作流；不使用全局单例
// ==========================================

use std::sync::{Arc, Mutex};
use tracing::info;

use crate::domain::delivery::CandidateBatch;
use crate::domain::inventory::InventoryItem;
use crate::domain::types::{AlertSource, AlertType};
use crate::engine::alert_log::AlertLog;
use crate::engine::batch_store::{BatchStore, InMemoryBatchStore};
use crate::engine::delivery_reconciler::{self, DeliveryQueue, MergeOutcome};
use crate::engine::inventory_ledger::InventoryLedger;
use crate::i18n::t_with_args;

/// 跨工作流共享的车间状态句柄
pub type SharedFacility = Arc<Mutex<FacilityState>>;

pub struct FacilityState {
    pub batches: Box<dyn BatchStore>,
    pub deliveries: DeliveryQueue,
    pub inventory: InventoryLedger,
    pub alerts: AlertLog,
}

impl FacilityState {
    /// 使用指定批次仓储与物料清单构造
    pub fn new(batches: Box<dyn BatchStore>, inventory: Vec<InventoryItem>) -> Self {
        Self {
            batches,
            deliveries: DeliveryQueue::new(),
            inventory: InventoryLedger::new(inventory),
            alerts: AlertLog::new(),
        }
    }

    /// 内存仓储 + 指定物料清单
    pub fn in_memory(inventory: Vec<InventoryItem>) -> Self {
        Self::new(Box::new(InMemoryBatchStore::new()), inventory)
    }

    /// 包装为共享句柄
    pub fn into_shared(self) -> SharedFacility {
        Arc::new(Mutex::new(self))
    }

    /// 合并外部候选到货并对新增部分发出预警
    ///
    /// 两步分离: 先完整计算新队列（纯函数），再整体替换并逐条预警；
    /// 被丢弃的候选不会产生任何预警
    pub fn ingest_candidates(&mut self, candidates: &[CandidateBatch]) -> MergeOutcome {
        let existing = self.batches.list();
        let outcome = delivery_reconciler::merge(candidates, &existing, self.deliveries.items());

        self.deliveries.replace(outcome.queue.clone());

        for delivery in outcome.admitted() {
            let weight = delivery
                .total_weight
                .map(|w| w.to_string())
                .unwrap_or_else(|| "?".to_string());
            let message = t_with_args(
                "alert.new_delivery",
                &[
                    ("farmer", delivery.farmer_name.as_deref().unwrap_or("?")),
                    ("type", delivery.mushroom_type.as_deref().unwrap_or("?")),
                    ("weight", weight.as_str()),
                ],
            );
            self.alerts.add(message, AlertType::Info, AlertSource::Delivery);
        }

        info!(
            candidates = candidates.len(),
            admitted = outcome.admitted_count(),
            duplicates = outcome.duplicates,
            queue_len = self.deliveries.len(),
            "到货对账完成"
        );
        outcome
    }
}

impl std::fmt::Debug for FacilityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacilityState")
            .field("batches", &self.batches.len())
            .field("deliveries", &self.deliveries.len())
            .field("inventory", &self.inventory.items().len())
            .field("alerts", &self.alerts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::batch::NewBatch;
    use crate::domain::inventory::default_inventory;

    fn candidate(id: Option<&str>, farmer: &str, weight: f64) -> CandidateBatch {
        CandidateBatch {
            id: id.map(str::to_string),
            farmer_name: Some(farmer.to_string()),
            mushroom_type: Some("Oyster Mushrooms".to_string()),
            total_weight: Some(weight),
            ..Default::default()
        }
    }

    #[test]
    fn test_ingest_alerts_only_for_admitted() {
        let mut state = FacilityState::in_memory(default_inventory());
        state
            .batches
            .create(NewBatch {
                id: Some("B-1".to_string()),
                farmer_name: "Village A".to_string(),
                mushroom_type: "Oyster Mushrooms".to_string(),
                total_weight: 10.0,
                ..Default::default()
            })
            .unwrap();

        let outcome = state.ingest_candidates(&[
            candidate(Some("B-1"), "Village A", 10.0),
            candidate(Some("N-1"), "Village B", 20.0),
        ]);

        assert_eq!(outcome.admitted_count(), 1);
        assert_eq!(state.deliveries.len(), 1);
        assert_eq!(state.alerts.len(), 1);
        assert_eq!(state.alerts.list()[0].source, AlertSource::Delivery);
    }

    #[test]
    fn test_ingest_twice_does_not_double_count() {
        let mut state = FacilityState::in_memory(default_inventory());
        let candidates = vec![candidate(Some("N-1"), "A", 10.0), candidate(None, "B", 11.0)];

        state.ingest_candidates(&candidates);
        let second = state.ingest_candidates(&candidates);

        assert_eq!(second.admitted_count(), 0);
        assert_eq!(state.deliveries.len(), 2);
        assert_eq!(state.alerts.len(), 2);
    }
}
