// ==========================================
// 学校供餐分量分配系统 - 日志初始化
// ==========================================
// 输出: 文本（默认）/ JSON（SCHOOL_MEAL_ALLOCATION_LOG_FORMAT=json）
// 过滤: RUST_LOG，缺省时业务 info + 性能 debug + 慢 SQL warn
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志格式环境变量（json / text）
pub const LOG_FORMAT_ENV: &str = "SCHOOL_MEAL_ALLOCATION_LOG_FORMAT";

const DEFAULT_DIRECTIVES: &str = "info,perf=debug,slow_sql=warn";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// 解析格式名，无法识别时回落为文本
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    fn from_env() -> Self {
        std::env::var(LOG_FORMAT_ENV)
            .map(|v| Self::parse(&v))
            .unwrap_or(LogFormat::Text)
    }
}

fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

/// 按环境变量选择格式并初始化（命令行入口使用）
///
/// ```no_run
/// school_meal_allocation::logging::init_from_env();
/// ```
pub fn init_from_env() {
    init(LogFormat::from_env());
}

/// 初始化全局订阅者；已初始化时静默忽略
pub fn init(format: LogFormat) {
    let builder = fmt()
        .with_env_filter(filter_from_env())
        .with_target(true)
        .with_line_number(true);

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(false).try_init(),
    };
}

/// 测试日志：debug 级别，输出交给测试框架捕获
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
