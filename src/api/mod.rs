// ==========================================
// 学校供餐分量分配系统 - API 层
// ==========================================
// 职责: 提供菜单项分配业务接口，供命令行与上层服务调用
// ==========================================

pub mod error;
pub mod menu_item_api;
pub mod report;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use menu_item_api::MenuItemApi;
pub use report::{write_daily_csv, write_grouped_csv};
