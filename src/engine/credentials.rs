// ==========================================
// 菌菇加工运营系统 - 口令与注册校验
// ==========================================
// 口令只以 argon2id 哈希（PHC 字符串）保存
// ==========================================

use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::domain::user::NewUser;
use crate::engine::error::{EngineError, EngineResult};

/// 口令最短长度
pub const MIN_PASSWORD_LEN: usize = 6;

/// 生成 argon2id 哈希
pub fn hash_password(password: &str) -> EngineResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| EngineError::InvalidOperation(format!("口令哈希失败: {}", e)))
}

/// 校验口令；哈希格式损坏视为不匹配
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

pub fn validate_password(password: &str) -> EngineResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(EngineError::Validation(format!(
            "口令至少 {} 个字符",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// 注册校验
///
/// `email_domain` 为 Some 时只接受该域名的邮箱（找回口令的投递渠道）
pub fn validate_new_user(user: &NewUser, email_domain: Option<&str>) -> EngineResult<()> {
    let id = user.id.trim();
    if id.is_empty() {
        return Err(EngineError::Validation("登录名不能为空".to_string()));
    }
    if id.chars().any(char::is_whitespace) {
        return Err(EngineError::Validation("登录名不能包含空白".to_string()));
    }
    if user.name.trim().is_empty() {
        return Err(EngineError::Validation("姓名不能为空".to_string()));
    }

    let email = user.email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(EngineError::Validation(format!("邮箱格式错误: {}", email)));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(EngineError::Validation(format!("邮箱格式错误: {}", email)));
    }
    if let Some(required) = email_domain {
        if !domain.eq_ignore_ascii_case(required) {
            return Err(EngineError::Validation(format!(
                "仅接受 @{} 邮箱",
                required
            )));
        }
    }

    validate_password(&user.password)
}
