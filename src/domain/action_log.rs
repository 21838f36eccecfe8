// ==========================================
// 学校供餐分量分配系统 - 操作日志领域模型
// ==========================================
// 红线: 所有写操作必须留痕，且与业务写入同事务
// 对齐: action_log 表
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,           // 日志ID (UUID)
    pub menu_plan_id: Option<i64>,   // 关联菜单计划
    pub menu_item_id: Option<i64>,   // 关联菜单项（删除后仍保留原值）
    pub action_type: String,         // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime,    // 操作时间戳
    pub actor: String,               // 操作人

    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)

    pub date_range_start: Option<NaiveDate>,
    pub date_range_end: Option<NaiveDate>,
    pub detail: Option<String>,
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateMenuItem,
    UpdateMenuItem,
    DeleteMenuItem,
}

impl ActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::CreateMenuItem => "CREATE_MENU_ITEM",
            ActionType::UpdateMenuItem => "UPDATE_MENU_ITEM",
            ActionType::DeleteMenuItem => "DELETE_MENU_ITEM",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE_MENU_ITEM" => Some(ActionType::CreateMenuItem),
            "UPDATE_MENU_ITEM" => Some(ActionType::UpdateMenuItem),
            "DELETE_MENU_ITEM" => Some(ActionType::DeleteMenuItem),
            _ => None,
        }
    }
}

// ==========================================
// ActionLog 辅助方法
// ==========================================
impl ActionLog {
    /// 创建新的操作日志（action_id 自动生成）
    pub fn new(action_type: ActionType, actor: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            menu_plan_id: None,
            menu_item_id: None,
            action_type: action_type.as_str().to_string(),
            action_ts: chrono::Local::now().naive_local(),
            actor: actor.to_string(),
            payload_json: None,
            date_range_start: None,
            date_range_end: None,
            detail: None,
        }
    }

    /// 关联菜单项
    pub fn with_menu_item(mut self, menu_plan_id: i64, menu_item_id: i64) -> Self {
        self.menu_plan_id = Some(menu_plan_id);
        self.menu_item_id = Some(menu_item_id);
        self
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }

    /// 设置影响日期（单日）
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date_range_start = Some(date);
        self.date_range_end = Some(date);
        self
    }

    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }

    /// 解析操作类型
    pub fn typed_action(&self) -> Option<ActionType> {
        ActionType::parse(&self.action_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_type_roundtrip() {
        for t in [
            ActionType::CreateMenuItem,
            ActionType::UpdateMenuItem,
            ActionType::DeleteMenuItem,
        ] {
            assert_eq!(ActionType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ActionType::parse("Recalc"), None);
    }

    #[test]
    fn test_builder_fields() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let log = ActionLog::new(ActionType::CreateMenuItem, "planner")
            .with_menu_item(7, 42)
            .with_date(date)
            .with_payload(&serde_json::json!({"portions": 300}));

        assert_eq!(log.action_id.len(), 36);
        assert_eq!(log.menu_plan_id, Some(7));
        assert_eq!(log.menu_item_id, Some(42));
        assert_eq!(log.date_range_start, Some(date));
        assert_eq!(log.date_range_end, Some(date));
        assert_eq!(log.typed_action(), Some(ActionType::CreateMenuItem));
        assert_eq!(log.payload_json.unwrap()["portions"], 300);
    }
}
