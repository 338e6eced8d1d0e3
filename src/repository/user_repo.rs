// ==========================================
// 菌菇加工运营系统 - 操作员账号仓储
// ==========================================
// 表: app_user（邮箱忽略大小写唯一）、password_reset（一次性令牌）
// 红线: 只存口令哈希，不做校验逻辑
// ==========================================

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

use crate::domain::user::{Role, User};
use crate::repository::error::{RepositoryError, RepositoryResult};

const SELECT_COLUMNS: &str = r#"
    SELECT user_id, name, email, role, password_hash, created_at
    FROM app_user
"#;

/// 账号记录（含口令哈希，仅供认证使用）
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: String,
}

pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 账号
    // ==========================================

    /// 插入账号；登录名或邮箱重复返回 UniqueConstraintViolation
    pub fn insert(&self, user: &User, password_hash: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = user.created_at.to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO app_user (
                user_id, name, email, role, password_hash, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                user.id,
                user.name,
                user.email,
                user.role.as_str(),
                password_hash,
                now,
                now,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, user_id: &str) -> RepositoryResult<Option<StoredUser>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE user_id = ?", SELECT_COLUMNS);
        let stored = conn
            .query_row(&sql, params![user_id], map_row)
            .optional()?;
        Ok(stored)
    }

    /// 按邮箱查询（忽略大小写）
    pub fn find_by_email(&self, email: &str) -> RepositoryResult<Option<StoredUser>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE email = ? COLLATE NOCASE", SELECT_COLUMNS);
        let stored = conn.query_row(&sql, params![email], map_row).optional()?;
        Ok(stored)
    }

    /// 全部账号，按注册时间
    pub fn list(&self) -> RepositoryResult<Vec<User>> {
        let conn = self.get_conn()?;
        let sql = format!("{} ORDER BY created_at ASC, user_id ASC", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map([], map_row)?
            .map(|r| r.map(|s| s.user))
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(users)
    }

    pub fn update_password_hash(&self, user_id: &str, password_hash: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE app_user SET password_hash = ?, updated_at = ? WHERE user_id = ?",
            params![password_hash, Utc::now().to_rfc3339(), user_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "User".to_string(),
                id: user_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 重置令牌
    // ==========================================

    /// 登记重置令牌（同一账号的旧令牌作废）
    pub fn insert_reset_token(
        &self,
        token: &str,
        user_id: &str,
        expires_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM password_reset WHERE user_id = ?", params![user_id])?;
        tx.execute(
            "INSERT INTO password_reset (token, user_id, expires_at) VALUES (?, ?, ?)",
            params![token, user_id, expires_at.to_rfc3339()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// 取出并删除令牌，返回 (user_id, expires_at)
    pub fn take_reset_token(&self, token: &str) -> RepositoryResult<Option<(String, DateTime<Utc>)>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let found: Option<(String, String)> = tx
            .query_row(
                "SELECT user_id, expires_at FROM password_reset WHERE token = ?",
                params![token],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        tx.execute("DELETE FROM password_reset WHERE token = ?", params![token])?;
        tx.commit()?;

        match found {
            Some((user_id, expires_at)) => {
                let expires_at = DateTime::parse_from_rfc3339(&expires_at)
                    .map_err(|e| RepositoryError::FieldValueError {
                        field: "expires_at".to_string(),
                        message: e.to_string(),
                    })?
                    .with_timezone(&Utc);
                Ok(Some((user_id, expires_at)))
            }
            None => Ok(None),
        }
    }

    pub fn delete_reset_token(&self, token: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM password_reset WHERE token = ?", params![token])?;
        Ok(())
    }
}

fn map_row(row: &Row) -> SqliteResult<StoredUser> {
    let role_str: String = row.get(3)?;
    let created_at_str: String = row.get(5)?;

    let role = role_str.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(RepositoryError::FieldValueError {
                field: "role".to_string(),
                message: e,
            }),
        )
    })?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);

    Ok(StoredUser {
        user: User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            role,
            created_at,
        },
        password_hash: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn repo() -> UserRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        UserRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: "Sarah Smith".to_string(),
            email: email.to_string(),
            role: Role::FinanceClerk,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let repo = repo();
        repo.insert(&user("sarah", "sarah@gmail.com"), "hash-1").unwrap();

        let by_id = repo.find_by_id("sarah").unwrap().unwrap();
        assert_eq!(by_id.user.role, Role::FinanceClerk);
        assert_eq!(by_id.password_hash, "hash-1");

        let by_email = repo.find_by_email("SARAH@gmail.com").unwrap().unwrap();
        assert_eq!(by_email.user.id, "sarah");
        assert!(repo.find_by_id("nobody").unwrap().is_none());
    }

    #[test]
    fn test_email_unique_ignoring_case() {
        let repo = repo();
        repo.insert(&user("sarah", "sarah@gmail.com"), "h").unwrap();
        let err = repo
            .insert(&user("sarah2", "Sarah@Gmail.com"), "h")
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_reset_token_is_single_use() {
        let repo = repo();
        repo.insert(&user("sarah", "sarah@gmail.com"), "h").unwrap();
        let expires = Utc::now() + Duration::minutes(30);
        repo.insert_reset_token("tok-1", "sarah", expires).unwrap();
        // 新令牌使旧令牌作废
        repo.insert_reset_token("tok-2", "sarah", expires).unwrap();

        assert!(repo.take_reset_token("tok-1").unwrap().is_none());
        let (user_id, _) = repo.take_reset_token("tok-2").unwrap().unwrap();
        assert_eq!(user_id, "sarah");
        assert!(repo.take_reset_token("tok-2").unwrap().is_none());
    }

    #[test]
    fn test_update_password_for_missing_user() {
        let repo = repo();
        let err = repo.update_password_hash("ghost", "h").unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
