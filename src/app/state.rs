// ==========================================
// 学校供餐分量分配系统 - 应用状态
// ==========================================
// 职责: 组装共享连接、配置、仓储与 API 实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::MenuItemApi;
use crate::config::{AllocationConfigReader, CategoryPolicyTable, ConfigManager};
use crate::engine::MenuItemEventPublisher;
use crate::repository::{ActionLogRepository, SchoolRepository};

/// 默认数据库路径环境变量
pub const DB_PATH_ENV: &str = "SCHOOL_MEAL_ALLOCATION_DB_PATH";

/// 应用状态
///
/// 类别策略表在此构建一次，按 Arc 传给 API
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 类别分配策略（启动时从 config_kv 读取）
    pub policies: Arc<CategoryPolicyTable>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 菜单项分配API
    pub menu_item_api: Arc<MenuItemApi>,

    /// 学校仓储（维护用）
    pub school_repo: Arc<SchoolRepository>,

    /// 操作日志仓储（用于审计追踪）
    pub action_log_repo: Arc<ActionLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例（不发布变更事件）
    pub async fn new(db_path: String) -> Result<Self, String> {
        Self::with_event_publisher(db_path, None).await
    }

    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 1. 打开共享连接并初始化 schema
    /// 2. 读取类别策略与审计操作人
    /// 3. 创建仓储与 API
    pub async fn with_event_publisher(
        db_path: String,
        event_publisher: Option<Arc<dyn MenuItemEventPublisher>>,
    ) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let mut conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::perf::install_sqlite_tracing(&mut conn);
        crate::db::init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("配置管理器初始化失败: {}", e))?,
        );

        let policies = Arc::new(
            config_manager
                .get_category_policy_table()
                .await
                .map_err(|e| format!("读取类别策略失败: {}", e))?,
        );
        for (category, policy) in policies.iter() {
            tracing::info!("类别策略: {} -> {}", category, policy);
        }

        let actor = config_manager
            .get_audit_actor()
            .await
            .map_err(|e| format!("读取审计操作人失败: {}", e))?;

        let menu_item_api = Arc::new(MenuItemApi::new(
            conn.clone(),
            policies.clone(),
            actor,
            event_publisher,
        ));

        Ok(Self {
            db_path,
            policies,
            config_manager,
            menu_item_api,
            school_repo: Arc::new(SchoolRepository::new(conn.clone())),
            action_log_repo: Arc::new(ActionLogRepository::new(conn)),
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./school_meal_allocation.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("school-meal-allocation");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("school_meal_allocation.db");
        }
    }

    path.to_string_lossy().to_string()
}
