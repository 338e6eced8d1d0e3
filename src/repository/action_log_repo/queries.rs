use super::core::{ActionLogRepository, TS_FORMAT};
use crate::domain::action_log::ActionLog;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::{params, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT action_id, action_type, action_ts, actor,
           target_id, payload_json, detail
    FROM action_log
"#;

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE action_id = ?", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![action_id], |row| self.map_row(row)) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询某个对象（批次/物料/预警）的全部日志，新的在前
    pub fn find_by_target(&self, target_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE target_id = ? ORDER BY action_ts DESC, rowid DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![target_id], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 查询最近的操作日志
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} ORDER BY action_ts DESC, rowid DESC LIMIT ?",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![limit as i64], |row| self.map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }

    /// 按操作类型计数
    pub fn count_by_type(&self, action_type: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM action_log WHERE action_type = ?",
            params![action_type],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    fn map_row(&self, row: &Row) -> SqliteResult<ActionLog> {
        let action_ts_str: String = row.get(2)?;
        let payload_json_str: Option<String> = row.get(5)?;

        // 解析时间戳
        let action_ts = NaiveDateTime::parse_from_str(&action_ts_str, TS_FORMAT).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?;

        // 解析 JSON 字段
        let payload_json = payload_json_str.and_then(|s| serde_json::from_str(&s).ok());

        Ok(ActionLog {
            action_id: row.get(0)?,
            action_type: row.get(1)?,
            action_ts,
            actor: row.get(3)?,
            target_id: row.get(4)?,
            payload_json,
            detail: row.get(6)?,
        })
    }
}
