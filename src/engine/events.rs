// ==========================================
// 学校供餐分量分配系统 - 菜单项变更事件
// ==========================================
// 职责: 定义变更事件发布 trait（镜像库同步 / 推送通知由外部实现）
// 约束: 仅在事务提交后发布；发布失败不影响操作结果
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 事件类型
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenuItemEventType {
    Created,
    Updated,
    Deleted,
}

impl MenuItemEventType {
    pub fn as_str(&self) -> &str {
        match self {
            MenuItemEventType::Created => "Created",
            MenuItemEventType::Updated => "Updated",
            MenuItemEventType::Deleted => "Deleted",
        }
    }
}

/// 菜单项变更事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemEvent {
    pub event_type: MenuItemEventType,
    pub menu_plan_id: i64,
    pub menu_item_id: i64,
    /// 受影响的供餐日期
    pub date: NaiveDate,
}

impl MenuItemEvent {
    pub fn new(event_type: MenuItemEventType, menu_plan_id: i64, menu_item_id: i64, date: NaiveDate) -> Self {
        Self {
            event_type,
            menu_plan_id,
            menu_item_id,
            date,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 菜单项事件发布者
///
/// # 返回
/// - `Ok(id)`: 下游回执 ID（如果支持）或空字符串
/// - `Err`: 发布失败
pub trait MenuItemEventPublisher: Send + Sync {
    fn publish(&self, event: MenuItemEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl MenuItemEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: MenuItemEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - menu_item_id={}, event_type={}",
            event.menu_item_id,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn MenuItemEventPublisher>> 的使用
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn MenuItemEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn MenuItemEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: MenuItemEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(event),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - menu_item_id={}, event_type={}",
                    event.menu_item_id,
                    event.event_type.as_str()
                );
                Ok(String::new())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
