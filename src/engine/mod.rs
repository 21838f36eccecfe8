// ==========================================
// 学校供餐分量分配系统 - 引擎层
// ==========================================
// 职责: 实现分配规则（校验 / 展开 / 分组），不拼 SQL
// 红线: Engine 无 I/O，所有拒绝必须输出原因
// ==========================================

pub mod events;
pub mod expansion;
pub mod grouper;
pub mod validator;

// 重导出核心引擎
pub use events::{
    MenuItemEvent, MenuItemEventPublisher, MenuItemEventType, NoOpEventPublisher,
    OptionalEventPublisher,
};
pub use expansion::{AllocationExpander, ExpansionError};
pub use grouper::AllocationGrouper;
pub use validator::{AllocationValidationError, AllocationValidator};
