// ==========================================
// 学校供餐分量分配系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键/busy_timeout）
// - 统一建表脚本，测试与二进制共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
///
/// 说明：存储层约束（UNIQUE/CHECK/外键）只是兜底，
/// 业务正确性由校验器与写入器自行保证。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS school (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT NOT NULL CHECK (category IN ('SD', 'SMP', 'SMA'))
        );

        CREATE TABLE IF NOT EXISTS menu_plan (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS menu_item (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            menu_plan_id INTEGER NOT NULL REFERENCES menu_plan(id),
            date TEXT NOT NULL,
            recipe_id INTEGER NOT NULL REFERENCES recipe(id),
            portions INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS menu_item_school_allocation (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            menu_item_id INTEGER NOT NULL REFERENCES menu_item(id) ON DELETE CASCADE,
            school_id INTEGER NOT NULL REFERENCES school(id) ON DELETE RESTRICT,
            portion_size TEXT NOT NULL CHECK (portion_size IN ('small', 'large')),
            portions INTEGER NOT NULL CHECK (portions > 0),
            date TEXT NOT NULL,
            UNIQUE (menu_item_id, school_id, portion_size)
        );

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            menu_plan_id INTEGER,
            menu_item_id INTEGER,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            date_range_start TEXT,
            date_range_end TEXT,
            detail TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_menu_item_plan ON menu_item(menu_plan_id);
        CREATE INDEX IF NOT EXISTS idx_allocation_menu_item ON menu_item_school_allocation(menu_item_id);
        CREATE INDEX IF NOT EXISTS idx_allocation_date ON menu_item_school_allocation(date);
        CREATE INDEX IF NOT EXISTS idx_allocation_school ON menu_item_school_allocation(school_id);
        CREATE INDEX IF NOT EXISTS idx_action_menu_item ON action_log(menu_item_id, action_ts);
        CREATE INDEX IF NOT EXISTS idx_action_ts ON action_log(action_ts);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
