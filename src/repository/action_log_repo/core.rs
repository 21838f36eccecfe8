use crate::domain::action_log::ActionLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的操作日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入操作日志（独立连接，自动提交）
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入,返回action_id
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_action_log(&conn, log)
    }
}

/// 在调用方给定的连接/事务上插入操作日志
///
/// 菜单项写操作在同一事务内调用，保证“业务写入成功 ⇔ 日志存在”
pub fn insert_action_log(conn: &Connection, log: &ActionLog) -> RepositoryResult<String> {
    conn.execute(
        r#"
        INSERT INTO action_log (
            action_id, menu_plan_id, menu_item_id, action_type, action_ts, actor,
            payload_json, date_range_start, date_range_end, detail
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            log.action_id,
            log.menu_plan_id,
            log.menu_item_id,
            log.action_type,
            log.action_ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            log.actor,
            log.payload_json.as_ref().map(|v| v.to_string()),
            log.date_range_start.map(|d| d.format("%Y-%m-%d").to_string()),
            log.date_range_end.map(|d| d.format("%Y-%m-%d").to_string()),
            log.detail,
        ],
    )?;

    Ok(log.action_id.clone())
}
