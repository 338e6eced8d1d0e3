// ==========================================
// 菌菇加工运营系统 - 口令重置通知
// ==========================================
// ResetNotifier: 把一次性重置码投递到操作员邮箱
// 未接入邮件服务时使用 LogResetNotifier（仅写日志，供现场管理员转达）
// ==========================================

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::domain::user::User;

/// 重置码投递接口
pub trait ResetNotifier: Send + Sync {
    fn send_reset_code(&self, user: &User, code: &str, expires_at: DateTime<Utc>) -> anyhow::Result<()>;
}

/// 模拟投递：重置码写入日志
#[derive(Debug, Default)]
pub struct LogResetNotifier;

impl ResetNotifier for LogResetNotifier {
    fn send_reset_code(&self, user: &User, code: &str, expires_at: DateTime<Utc>) -> anyhow::Result<()> {
        warn!(
            user_id = %user.id,
            email = %user.email,
            code = code,
            expires_at = %expires_at.to_rfc3339(),
            "未接入邮件服务，重置码仅写入日志"
        );
        Ok(())
    }
}
