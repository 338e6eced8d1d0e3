// ==========================================
// 菌菇加工运营系统 - API 公共设施
// ==========================================
// lock_facility: 获取共享车间状态（锁中毒 → InternalError）
// AuditTrail: 操作日志写入，失败只告警不影响业务结果
// AccessControl: 写操作前按操作员角色校验工作区权限
// ==========================================

use std::sync::{Arc, MutexGuard};

use tracing::{debug, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::ActionLog;
use crate::domain::user::{User, WorkArea};
use crate::engine::facility::{FacilityState, SharedFacility};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::user_repo::UserRepository;

pub(crate) fn lock_facility(state: &SharedFacility) -> ApiResult<MutexGuard<'_, FacilityState>> {
    state
        .lock()
        .map_err(|e| ApiError::InternalError(format!("车间状态锁获取失败: {}", e)))
}

/// 审计日志写入器
#[derive(Clone)]
pub struct AuditTrail {
    repo: Arc<ActionLogRepository>,
}

impl AuditTrail {
    pub fn new(repo: Arc<ActionLogRepository>) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &Arc<ActionLogRepository> {
        &self.repo
    }

    /// 记录操作日志（尽力而为）
    pub fn record(&self, log: ActionLog) {
        if let Err(e) = self.repo.insert(&log) {
            warn!(
                action_type = %log.action_type,
                target_id = ?log.target_id,
                error = %e,
                "操作日志写入失败"
            );
        }
    }
}

/// 工作区权限校验
#[derive(Clone)]
pub struct AccessControl {
    users: Arc<UserRepository>,
}

impl AccessControl {
    pub fn new(users: Arc<UserRepository>) -> Self {
        Self { users }
    }

    /// 校验操作员可在该工作区执行写操作
    ///
    /// 未注册的操作员 → Unauthorized；角色不覆盖该工作区 → PermissionDenied
    pub fn authorize(&self, actor: &str, area: WorkArea) -> ApiResult<User> {
        let user = self
            .users
            .find_by_id(actor.trim())?
            .map(|stored| stored.user)
            .ok_or_else(|| ApiError::Unauthorized(format!("未注册的操作员: {}", actor)))?;

        if !user.role.scope().allows(area) {
            warn!(actor = %user.id, role = %user.role, area = %area, "越权操作被拒绝");
            return Err(ApiError::PermissionDenied {
                actor: user.id,
                role: user.role.to_string(),
                area: area.to_string(),
            });
        }

        debug!(actor = %user.id, area = %area, "权限校验通过");
        Ok(user)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::domain::user::Role;
    use rusqlite::Connection;
    use std::sync::Mutex;

    /// 单元测试用的审计与权限（共享一个内存库）
    ///
    /// 预置 "op" / "operator"（Processing Manager）、"worker"（Processing Worker）、
    /// "packer"（Packing Staff）、"finance"（Finance Clerk）
    pub(crate) fn context() -> (AuditTrail, AccessControl, Arc<ActionLogRepository>) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));

        let users = Arc::new(UserRepository::new(conn.clone()));
        for (id, role) in [
            ("op", Role::ProcessingManager),
            ("operator", Role::ProcessingManager),
            ("worker", Role::ProcessingWorker),
            ("packer", Role::PackingStaff),
            ("finance", Role::FinanceClerk),
        ] {
            let user = User {
                id: id.to_string(),
                name: id.to_string(),
                email: format!("{}@gmail.com", id),
                role,
                created_at: chrono::Utc::now(),
            };
            users.insert(&user, "unused").unwrap();
        }

        let repo = Arc::new(ActionLogRepository::new(conn));
        (AuditTrail::new(repo.clone()), AccessControl::new(users), repo)
    }
}
