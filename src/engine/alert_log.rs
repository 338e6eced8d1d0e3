// ==========================================
// 菌菇加工运营系统 - 预警日志
// ==========================================
// 只追加的操作员提示列表，最新在前
// 处理预警 = 从活动列表删除（不保留归档）
// ==========================================

use chrono::Utc;
use tracing::info;

use crate::domain::alert::Alert;
use crate::domain::types::{AlertSource, AlertType};
use crate::engine::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    // 最新在前
    alerts: Vec<Alert>,
}

impl AlertLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 新增预警（分配新 ID、记录当前时刻、插入队首）
    pub fn add(&mut self, message: impl Into<String>, alert_type: AlertType, source: AlertSource) -> Alert {
        let alert = Alert {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.into(),
            alert_type,
            timestamp: Utc::now(),
            source,
            resolved: false,
        };

        info!(
            alert_id = %alert.id,
            alert_type = %alert_type,
            source = %source,
            message = %alert.message,
            "新增预警"
        );
        self.alerts.insert(0, alert.clone());
        alert
    }

    /// 处理预警（删除）
    ///
    /// # 错误
    /// - NotFound: 预警不存在或已处理
    pub fn resolve(&mut self, id: &str) -> EngineResult<Alert> {
        let pos = self
            .alerts
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| EngineError::not_found("Alert", id))?;

        let mut alert = self.alerts.remove(pos);
        alert.resolved = true;
        info!(alert_id = %id, "预警已处理");
        Ok(alert)
    }

    /// 活动预警，最新在前
    pub fn list(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }
}
