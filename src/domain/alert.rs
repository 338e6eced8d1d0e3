// ==========================================
// 菌菇加工运营系统 - 预警模型
// ==========================================
// 预警创建后不可变；处理（resolve）即从活动列表移除
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{AlertSource, AlertType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub message: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub timestamp: DateTime<Utc>,
    pub source: AlertSource,
    pub resolved: bool,
}
