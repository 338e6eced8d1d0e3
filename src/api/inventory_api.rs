// ==========================================
// 菌菇加工运营系统 - 库存 API
// ==========================================
// 职责: 耗材查看、数量调整、扣减、补货下单
// 约束: 所有数量变更经 InventoryLedger::set_quantity，保证边沿预警；仅管理岗可调整
// ==========================================

use tracing::info;

use crate::api::common::{lock_facility, AccessControl, AuditTrail};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::inventory::InventorySnapshot;
use crate::domain::types::{AlertSource, AlertType};
use crate::domain::user::WorkArea;
use crate::engine::facility::SharedFacility;
use crate::i18n::t_with_args;

/// 数量调整结果
#[derive(Debug, Clone, PartialEq)]
pub struct StockChange {
    pub item: InventorySnapshot,
    pub low_stock_alerted: bool,
}

pub struct InventoryApi {
    state: SharedFacility,
    audit: AuditTrail,
    access: AccessControl,
}

impl InventoryApi {
    pub fn new(state: SharedFacility, audit: AuditTrail, access: AccessControl) -> Self {
        Self { state, audit, access }
    }

    /// 全部耗材（带派生状态）
    pub fn list(&self) -> ApiResult<Vec<InventorySnapshot>> {
        let state = lock_facility(&self.state)?;
        Ok(state.inventory.items().iter().map(|i| i.snapshot()).collect())
    }

    /// 设置物料数量
    pub fn set_quantity(&self, id: &str, quantity: f64, actor: &str) -> ApiResult<StockChange> {
        self.access.authorize(actor, WorkArea::Inventory)?;
        let (item, alerted) = {
            let mut state = lock_facility(&self.state)?;
            let state = &mut *state;
            state.inventory.set_quantity(id, quantity, &mut state.alerts)?
        };

        self.audit.record(
            ActionLog::new(ActionType::SetInventory, actor)
                .with_target(id)
                .with_payload(serde_json::json!({ "quantity": quantity, "alerted": alerted })),
        );
        Ok(StockChange {
            item: item.snapshot(),
            low_stock_alerted: alerted,
        })
    }

    /// 扣减物料（不足时扣至 0）
    pub fn deduct(&self, id: &str, amount: f64, actor: &str) -> ApiResult<StockChange> {
        self.access.authorize(actor, WorkArea::Inventory)?;
        let (item, alerted) = {
            let mut state = lock_facility(&self.state)?;
            let state = &mut *state;
            state.inventory.deduct(id, amount, &mut state.alerts)?
        };

        self.audit.record(
            ActionLog::new(ActionType::SetInventory, actor)
                .with_target(id)
                .with_payload(serde_json::json!({
                    "deducted": amount,
                    "quantity": item.quantity,
                    "alerted": alerted,
                })),
        );
        Ok(StockChange {
            item: item.snapshot(),
            low_stock_alerted: alerted,
        })
    }

    /// 补货下单（仅生成一条信息预警，实际采购在系统外完成）
    pub fn request_reorder(&self, id: &str, actor: &str) -> ApiResult<()> {
        self.access.authorize(actor, WorkArea::Inventory)?;
        {
            let mut state = lock_facility(&self.state)?;
            let name = state
                .inventory
                .get(id)
                .map(|i| i.name.clone())
                .ok_or_else(|| ApiError::NotFound(format!("InventoryItem(id={})不存在", id)))?;
            state.alerts.add(
                t_with_args("alert.reorder_placed", &[("name", name.as_str())]),
                AlertType::Info,
                AlertSource::Inventory,
            );
        }

        info!(item_id = %id, "补货已下单");
        self.audit
            .record(ActionLog::new(ActionType::RequestReorder, actor).with_target(id));
        Ok(())
    }
}
