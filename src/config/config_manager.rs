// ==========================================
// 菌菇加工运营系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// 约束: 数值格式错误时回退默认值并告警，不阻断业务
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::financials::PackingPricing;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// 全局作用域
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

/// 云端同步配置
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

impl ConfigManager {
    /// 以数据库文件路径创建（幂等建表）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与审计仓储共用同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 删除 global scope 的配置值
    pub fn remove_global_config_value(&self, key: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(rows > 0)
    }

    /// 全部 global 配置快照（按 key 排序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut snapshot = BTreeMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string()))
    }

    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };
        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    // ===== 包装结算 =====

    /// 包装结算单价
    pub fn get_packing_pricing(&self) -> RepositoryResult<PackingPricing> {
        let defaults = PackingPricing::default();
        Ok(PackingPricing {
            unit_raw_cost: self
                .get_parsed_or_default(config_keys::UNIT_RAW_COST, defaults.unit_raw_cost)?,
            labor_flat: self
                .get_parsed_or_default(config_keys::LABOR_FLAT_COST, defaults.labor_flat)?,
            unit_pack_cost: self
                .get_parsed_or_default(config_keys::UNIT_PACK_COST, defaults.unit_pack_cost)?,
            unit_tin_price: self
                .get_parsed_or_default(config_keys::UNIT_TIN_PRICE, defaults.unit_tin_price)?,
        })
    }

    /// 包装罐对应的物料ID
    pub fn get_tin_item_id(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::TIN_ITEM_ID, "inv1")
    }

    /// 二维码标签对应的物料ID
    pub fn get_label_item_id(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::LABEL_ITEM_ID, "inv2")
    }

    // ===== 云端同步 =====

    pub fn get_sync_settings(&self) -> RepositoryResult<SyncSettings> {
        let endpoint = self
            .get_global_config_value(config_keys::SYNC_ENDPOINT)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let secs = self.get_parsed_or_default(
            config_keys::SYNC_TIMEOUT_SECS,
            crate::sync::DEFAULT_SYNC_TIMEOUT_SECS,
        )?;

        Ok(SyncSettings {
            endpoint,
            timeout: Duration::from_secs(secs.max(1)),
        })
    }

    // ===== 操作员账号 =====

    /// 注册邮箱限定域名；配置为 "*" 时不限
    pub fn get_user_email_domain(&self) -> RepositoryResult<Option<String>> {
        let domain = self.get_config_or_default(config_keys::USER_EMAIL_DOMAIN, "gmail.com")?;
        let domain = domain.trim_start_matches('@').to_string();
        Ok(if domain == "*" { None } else { Some(domain) })
    }

    // ===== 国际化 =====

    pub fn get_locale(&self) -> RepositoryResult<String> {
        self.get_config_or_default(config_keys::LOCALE, "zh-CN")
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 云端同步
    pub const SYNC_ENDPOINT: &str = "sync_endpoint";
    pub const SYNC_TIMEOUT_SECS: &str = "sync_timeout_secs";

    // 包装结算
    pub const UNIT_RAW_COST: &str = "unit_raw_cost";
    pub const LABOR_FLAT_COST: &str = "labor_flat_cost";
    pub const UNIT_PACK_COST: &str = "unit_pack_cost";
    pub const UNIT_TIN_PRICE: &str = "unit_tin_price";

    // 耗材映射
    pub const TIN_ITEM_ID: &str = "tin_item_id";
    pub const LABEL_ITEM_ID: &str = "label_item_id";

    // 操作员账号
    pub const USER_EMAIL_DOMAIN: &str = "user_email_domain";

    // 界面语言
    pub const LOCALE: &str = "locale";
}
