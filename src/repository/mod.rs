// ==========================================
// 学校供餐分量分配系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod menu_item_repo;
pub mod school_repo;
pub mod tx;

// 重导出核心仓储
pub use action_log_repo::{insert_action_log, ActionLogRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use menu_item_repo::{MenuItemStore, SqliteMenuItemStore};
pub use school_repo::SchoolRepository;
pub use tx::run_in_transaction;
