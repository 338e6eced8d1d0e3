// ==========================================
// 菌菇加工运营系统 - 预警 API
// ==========================================
// 财务岗只读；其余岗位均可上报与处理
// ==========================================

use crate::api::common::{lock_facility, AccessControl, AuditTrail};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::alert::Alert;
use crate::domain::types::{AlertSource, AlertType};
use crate::domain::user::WorkArea;
use crate::engine::facility::SharedFacility;

pub struct AlertApi {
    state: SharedFacility,
    audit: AuditTrail,
    access: AccessControl,
}

impl AlertApi {
    pub fn new(state: SharedFacility, audit: AuditTrail, access: AccessControl) -> Self {
        Self { state, audit, access }
    }

    /// 活动预警，最新在前
    pub fn list(&self) -> ApiResult<Vec<Alert>> {
        let state = lock_facility(&self.state)?;
        Ok(state.alerts.list().to_vec())
    }

    /// 人工新增预警
    pub fn add(
        &self,
        message: &str,
        alert_type: AlertType,
        source: AlertSource,
        actor: &str,
    ) -> ApiResult<Alert> {
        self.access.authorize(actor, WorkArea::Alerts)?;
        let message = message.trim();
        if message.is_empty() {
            return Err(ApiError::InvalidInput("预警内容不能为空".to_string()));
        }

        let alert = {
            let mut state = lock_facility(&self.state)?;
            state.alerts.add(message, alert_type, source)
        };

        self.audit.record(
            ActionLog::new(ActionType::AddAlert, actor)
                .with_target(alert.id.as_str())
                .with_detail(message),
        );
        Ok(alert)
    }

    /// 处理（移除）预警
    pub fn resolve(&self, id: &str, actor: &str) -> ApiResult<Alert> {
        self.access.authorize(actor, WorkArea::Alerts)?;
        let alert = {
            let mut state = lock_facility(&self.state)?;
            state.alerts.resolve(id)?
        };

        self.audit.record(
            ActionLog::new(ActionType::ResolveAlert, actor)
                .with_target(id)
                .with_detail(alert.message.as_str()),
        );
        Ok(alert)
    }
}
