// ==========================================
// 菌菇加工运营系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写操作必须记录
// 用途: 审计追踪（谁在何时对哪个批次/物料做了什么）
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,            // 日志ID
    pub action_type: String,          // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,     // 操作时间戳 (UTC)
    pub actor: String,                // 操作人
    pub target_id: Option<String>,    // 目标对象（批次号/物料ID/预警ID）
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)
    pub detail: Option<String>,       // 详细描述
}

impl ActionLog {
    /// 以当前时刻构造日志
    pub fn new(action_type: ActionType, actor: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            target_id: None,
            payload_json: None,
            detail: None,
        }
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload_json = Some(payload);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateBatch,      // 收货建批
    AdvanceBatch,     // 工序推进
    SubmitQc,         // 质检录入
    GenerateLabel,    // 打印标签
    CompletePacking,  // 包装结算
    AcceptDelivery,   // 验收到货
    DiscardDelivery,  // 丢弃到货
    ImportDeliveries, // 到货表导入
    SetInventory,     // 库存调整
    RequestReorder,   // 补货下单
    AddAlert,         // 人工预警
    ResolveAlert,     // 处理预警
    SyncPush,         // 云端推送
    SyncPull,         // 云端拉取
    RegisterUser,     // 操作员注册
    ChangePassword,   // 修改口令
    ResetPassword,    // 重置口令
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateBatch => "CreateBatch",
            ActionType::AdvanceBatch => "AdvanceBatch",
            ActionType::SubmitQc => "SubmitQc",
            ActionType::GenerateLabel => "GenerateLabel",
            ActionType::CompletePacking => "CompletePacking",
            ActionType::AcceptDelivery => "AcceptDelivery",
            ActionType::DiscardDelivery => "DiscardDelivery",
            ActionType::ImportDeliveries => "ImportDeliveries",
            ActionType::SetInventory => "SetInventory",
            ActionType::RequestReorder => "RequestReorder",
            ActionType::AddAlert => "AddAlert",
            ActionType::ResolveAlert => "ResolveAlert",
            ActionType::SyncPush => "SyncPush",
            ActionType::SyncPull => "SyncPull",
            ActionType::RegisterUser => "RegisterUser",
            ActionType::ChangePassword => "ChangePassword",
            ActionType::ResetPassword => "ResetPassword",
        }
    }
}
