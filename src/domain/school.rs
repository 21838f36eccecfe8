// ==========================================
// 学校供餐分量分配系统 - 参考数据模型
// ==========================================
// 学校 / 菜单计划 / 菜谱均为外部主数据，本模块只读
// ==========================================

use crate::domain::types::SchoolCategory;
use serde::{Deserialize, Serialize};

// ==========================================
// School - 学校
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub id: i64,
    pub name: String,
    pub category: SchoolCategory,
}

// ==========================================
// MenuPlan - 周菜单计划（仅作为挂载目标）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuPlan {
    pub id: i64,
    pub name: String,
}

// ==========================================
// Recipe - 菜谱（只引用，不解析营养数据）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
}
