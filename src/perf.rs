// ==========================================
// 学校供餐分量分配系统 - 性能观测
// ==========================================
// 每个 API 操作: 耗时 + 执行语句数 + 慢语句数（target = "perf"）
// 语句统计来自 SQLite profile 回调（每条语句执行完成回调一次）
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// 开关环境变量
pub const PERF_SQL_ENV: &str = "SCHOOL_MEAL_ALLOCATION_PERF_SQL";
/// 慢 SQL 阈值环境变量（毫秒）
pub const SLOW_SQL_MS_ENV: &str = "SCHOOL_MEAL_ALLOCATION_SLOW_SQL_MS";

const SQL_LOG_MAX_LEN: usize = 420;

static SQL_PROFILE_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_MS: AtomicU64 = AtomicU64::new(0);

// 语句在调用方线程上同步执行，计数按线程累计
thread_local! {
    static OPEN_GUARDS: Cell<u32> = Cell::new(0);
    static STATEMENTS: Cell<u64> = Cell::new(0);
    static SLOW_STATEMENTS: Cell<u64> = Cell::new(0);
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

fn slow_threshold_from_env() -> u64 {
    std::env::var(SLOW_SQL_MS_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 })
}

fn one_line_sql(sql: &str) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() <= SQL_LOG_MAX_LEN {
        return flat;
    }
    let mut end = SQL_LOG_MAX_LEN;
    while !flat.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &flat[..end])
}

fn bump(counter: &'static std::thread::LocalKey<Cell<u64>>) {
    counter.with(|c| c.set(c.get().saturating_add(1)));
}

/// 在连接上安装语句 profile 回调
///
/// - Debug 构建默认开启，Release 默认关闭；`SCHOOL_MEAL_ALLOCATION_PERF_SQL` 覆盖
/// - 慢语句阈值 `SCHOOL_MEAL_ALLOCATION_SLOW_SQL_MS`（默认 debug 50ms / release 200ms）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let enabled = env_flag(PERF_SQL_ENV, cfg!(debug_assertions));
    SQL_PROFILE_ENABLED.store(enabled, Ordering::Relaxed);

    if enabled {
        SLOW_SQL_MS.store(slow_threshold_from_env(), Ordering::Relaxed);
        conn.profile(Some(on_statement_done));
    } else {
        conn.profile(None);
    }
}

fn on_statement_done(sql: &str, duration: Duration) {
    if !SQL_PROFILE_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let inside_guard = OPEN_GUARDS.with(|g| g.get() > 0);
    if inside_guard {
        bump(&STATEMENTS);
    }

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_MS.load(Ordering::Relaxed);
    if threshold == 0 || ms < threshold {
        return;
    }
    tracing::warn!(target: "slow_sql", duration_ms = ms, sql = %one_line_sql(sql), "slow sql");
    if inside_guard {
        bump(&SLOW_STATEMENTS);
    }
}

/// 操作级性能统计；drop 时输出一条 perf 日志
///
/// ```ignore
/// let _perf = PerfGuard::new("create_menu_item_with_allocations");
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    statements_before: u64,
    slow_before: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        OPEN_GUARDS.with(|g| g.set(g.get().saturating_add(1)));
        Self {
            op,
            start: Instant::now(),
            statements_before: STATEMENTS.with(|c| c.get()),
            slow_before: SLOW_STATEMENTS.with(|c| c.get()),
        }
    }

    /// 自创建以来当前线程执行的语句数
    pub fn sql_count(&self) -> u64 {
        STATEMENTS.with(|c| c.get()).saturating_sub(self.statements_before)
    }

    fn slow_sql_count(&self) -> u64 {
        SLOW_STATEMENTS.with(|c| c.get()).saturating_sub(self.slow_before)
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        tracing::debug!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            sql_count = self.sql_count(),
            slow_sql_count = self.slow_sql_count(),
            "done"
        );
        OPEN_GUARDS.with(|g| g.set(g.get().saturating_sub(1)));
    }
}
