// ==========================================
// 学校供餐分量分配系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod menu_item;
pub mod school;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use menu_item::{
    Allocation, AllocationMenuItemRef, MenuItem, MenuItemInput, NewAllocation,
    SchoolAllocationDisplay, SchoolAllocationInput,
};
pub use school::{MenuPlan, Recipe, School};
pub use types::{AllocationPolicy, PortionSize, PortionSizeType, SchoolCategory};
