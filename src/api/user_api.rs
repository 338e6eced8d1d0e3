// ==========================================
// 菌菇加工运营系统 - 操作员账号 API
// ==========================================
// 注册 / 登录 / 修改口令 / 找回口令（重置码经 ResetNotifier 投递）
// 登录失败不区分“账号不存在”与“口令错误”
// 找回口令对未注册邮箱同样返回成功
// ==========================================

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::api::common::AuditTrail;
use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::user::{NewUser, User};
use crate::engine::credentials;
use crate::notify::ResetNotifier;
use crate::repository::user_repo::UserRepository;

/// 重置码有效期（分钟）
pub const RESET_CODE_TTL_MINUTES: i64 = 30;

pub struct UserApi {
    users: Arc<UserRepository>,
    config: Arc<ConfigManager>,
    notifier: Arc<dyn ResetNotifier>,
    audit: AuditTrail,
}

impl UserApi {
    pub fn new(
        users: Arc<UserRepository>,
        config: Arc<ConfigManager>,
        notifier: Arc<dyn ResetNotifier>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            users,
            config,
            notifier,
            audit,
        }
    }

    /// 注册操作员
    ///
    /// # 错误
    /// - InvalidInput: 字段为空、邮箱不合规、口令过短
    /// - BusinessRuleViolation: 登录名或邮箱已被占用
    pub fn register(&self, data: NewUser) -> ApiResult<User> {
        let domain = self.config.get_user_email_domain()?;
        credentials::validate_new_user(&data, domain.as_deref())?;

        let id = data.id.trim();
        let email = data.email.trim();
        if self.users.find_by_id(id)?.is_some() {
            return Err(ApiError::BusinessRuleViolation(format!("登录名已存在: {}", id)));
        }
        if self.users.find_by_email(email)?.is_some() {
            return Err(ApiError::BusinessRuleViolation(format!("邮箱已注册: {}", email)));
        }

        let hash = credentials::hash_password(&data.password)?;
        let user = User {
            id: id.to_string(),
            name: data.name.trim().to_string(),
            email: email.to_string(),
            role: data.role,
            created_at: Utc::now(),
        };
        self.users.insert(&user, &hash)?;

        info!(user_id = %user.id, role = %user.role, "操作员已注册");
        self.audit.record(
            ActionLog::new(ActionType::RegisterUser, &user.id)
                .with_target(user.id.as_str())
                .with_payload(serde_json::json!({
                    "role": user.role,
                    "email": user.email,
                })),
        );
        Ok(user)
    }

    /// 登录校验
    pub fn login(&self, id: &str, password: &str) -> ApiResult<User> {
        match self.users.find_by_id(id.trim())? {
            Some(stored) if credentials::verify_password(password, &stored.password_hash) => {
                info!(user_id = %stored.user.id, "登录成功");
                Ok(stored.user)
            }
            _ => {
                warn!(user_id = %id.trim(), "登录失败");
                Err(ApiError::Unauthorized("登录名或口令错误".to_string()))
            }
        }
    }

    /// 修改口令（需验证旧口令）
    pub fn change_password(&self, id: &str, old_password: &str, new_password: &str) -> ApiResult<()> {
        let user = self.login(id, old_password)?;
        credentials::validate_password(new_password)?;

        let hash = credentials::hash_password(new_password)?;
        self.users.update_password_hash(&user.id, &hash)?;

        info!(user_id = %user.id, "口令已修改");
        self.audit.record(
            ActionLog::new(ActionType::ChangePassword, &user.id).with_target(user.id.as_str()),
        );
        Ok(())
    }

    /// 申请重置口令：生成一次性重置码并投递到注册邮箱
    pub fn request_password_reset(&self, email: &str) -> ApiResult<()> {
        let Some(stored) = self.users.find_by_email(email.trim())? else {
            info!(email = %email.trim(), "找回口令: 邮箱未注册");
            return Ok(());
        };
        let user = stored.user;

        let code = uuid::Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now() + Duration::minutes(RESET_CODE_TTL_MINUTES);
        self.users.insert_reset_token(&code, &user.id, expires_at)?;

        if let Err(e) = self.notifier.send_reset_code(&user, &code, expires_at) {
            if let Err(cleanup) = self.users.delete_reset_token(&code) {
                warn!(user_id = %user.id, error = %cleanup, "重置码清理失败");
            }
            return Err(ApiError::InternalError(format!("重置码投递失败: {}", e)));
        }

        self.audit.record(
            ActionLog::new(ActionType::ResetPassword, &user.id)
                .with_target(user.id.as_str())
                .with_detail("已发送重置码"),
        );
        Ok(())
    }

    /// 以重置码设置新口令（重置码一次有效）
    pub fn reset_password(&self, code: &str, new_password: &str) -> ApiResult<()> {
        credentials::validate_password(new_password)?;

        let (user_id, expires_at) = self
            .users
            .take_reset_token(code.trim())?
            .ok_or_else(|| ApiError::Unauthorized("重置码无效".to_string()))?;
        if expires_at < Utc::now() {
            return Err(ApiError::Unauthorized("重置码已过期".to_string()));
        }

        let hash = credentials::hash_password(new_password)?;
        self.users.update_password_hash(&user_id, &hash)?;

        info!(user_id = %user_id, "口令已重置");
        self.audit.record(
            ActionLog::new(ActionType::ResetPassword, &user_id)
                .with_target(user_id.as_str())
                .with_detail("已通过重置码设置新口令"),
        );
        Ok(())
    }

    pub fn get_user(&self, id: &str) -> ApiResult<User> {
        self.users
            .find_by_id(id.trim())?
            .map(|stored| stored.user)
            .ok_or_else(|| ApiError::NotFound(format!("User(id={})不存在", id.trim())))
    }

    pub fn list_users(&self) -> ApiResult<Vec<User>> {
        Ok(self.users.list()?)
    }
}
