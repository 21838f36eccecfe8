// ==========================================
// 学校供餐分量分配系统 - 应用层
// ==========================================
// 职责: 组合根，连接配置、仓储与 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
