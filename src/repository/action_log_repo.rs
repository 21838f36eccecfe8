// ==========================================
// 学校供餐分量分配系统 - 操作日志数据仓储
// ==========================================
// 红线: 菜单项写操作必须留痕
// ==========================================

mod core;
mod queries;


pub use core::{insert_action_log, ActionLogRepository};
