use super::core::ActionLogRepository;
use crate::domain::action_log::ActionLog;
use crate::repository::error::RepositoryResult;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT action_id, menu_plan_id, menu_item_id, action_type, action_ts, actor,
           payload_json, date_range_start, date_range_end, detail
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

        match stmt.query_row(params![action_id], map_row) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询菜单项的全部操作日志（按时间正序，删除后依然可查）
    pub fn find_by_menu_item(&self, menu_item_id: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let sql = format!(
            "{} WHERE menu_item_id = ? ORDER BY action_ts ASC, rowid ASC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;

        let logs = stmt
            .query_map(params![menu_item_id], map_row)?
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
            .query_map(params![limit as i64], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 统计操作日志条数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM action_log", [], |row| row.get(0))?;
        Ok(n)
    }
}

/// 映射数据库行到 ActionLog 对象
fn map_row(row: &Row) -> SqliteResult<ActionLog> {
    let action_ts_str: String = row.get(4)?;
    let payload_json_str: Option<String> = row.get(6)?;
    let date_range_start_str: Option<String> = row.get(7)?;
    let date_range_end_str: Option<String> = row.get(8)?;

    let action_ts = NaiveDateTime::parse_from_str(&action_ts_str, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e)))?;

    Ok(ActionLog {
        action_id: row.get(0)?,
        menu_plan_id: row.get(1)?,
        menu_item_id: row.get(2)?,
        action_type: row.get(3)?,
        action_ts,
        actor: row.get(5)?,
        payload_json: payload_json_str.and_then(|s| serde_json::from_str(&s).ok()),
        date_range_start: date_range_start_str
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        date_range_end: date_range_end_str
            .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        detail: row.get(9)?,
    })
}
