// ==========================================
// 学校供餐分量分配系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 菜单项按学校 / 份量规格分配，事务化写入
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分配规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能观测
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组合根
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{AllocationPolicy, PortionSize, PortionSizeType, SchoolCategory};

// 领域实体
pub use domain::{
    ActionLog, ActionType, Allocation, MenuItem, MenuItemInput, School,
    SchoolAllocationDisplay, SchoolAllocationInput,
};

// 引擎
pub use engine::{AllocationExpander, AllocationGrouper, AllocationValidationError, AllocationValidator};

// 配置
pub use config::CategoryPolicyTable;

// API
pub use api::{ApiError, ApiResult, MenuItemApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "学校供餐分量分配系统";
