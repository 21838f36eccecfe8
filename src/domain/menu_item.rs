// ==========================================
// 学校供餐分量分配系统 - 菜单项与分配领域模型
// ==========================================
// 不变量:
// - 同一菜单项下所有分配行 portions 之和 == MenuItem.portions
// - 每行 portions > 0，零份量不落库
// - (menu_item_id, school_id, portion_size) 唯一
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::school::{Recipe, School};
use crate::domain::types::{PortionSize, PortionSizeType, SchoolCategory};

// ==========================================
// MenuItem - 菜单项
// ==========================================
// 拥有 0..n 条分配行；随菜单项创建/更新/删除整体替换
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub menu_plan_id: i64,
    pub date: NaiveDate,
    pub recipe_id: i64,
    pub portions: i32,
    /// 按学校名称升序
    pub allocations: Vec<Allocation>,
}

impl MenuItem {
    /// 已分配份量合计
    pub fn allocated_portions(&self) -> i64 {
        self.allocations.iter().map(|a| a.portions as i64).sum()
    }
}

// ==========================================
// Allocation - 分配行
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub id: i64,
    pub menu_item_id: i64,
    pub school_id: i64,
    pub portion_size: PortionSize,
    pub portions: i32,
    pub date: NaiveDate,

    // ===== 预加载字段 =====
    pub school: Option<School>,
    /// 仅按日期查询时填充
    pub menu_item: Option<AllocationMenuItemRef>,
}

/// 按日期查询时随分配行一并加载的菜单项摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationMenuItemRef {
    pub id: i64,
    pub menu_plan_id: i64,
    pub date: NaiveDate,
    pub recipe_id: i64,
    pub portions: i32,
    pub recipe: Option<Recipe>,
}

// ==========================================
// 写入输入
// ==========================================

/// 单个学校的分配输入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolAllocationInput {
    pub school_id: i64,
    pub portions_small: i32,
    pub portions_large: i32,
}

impl SchoolAllocationInput {
    pub fn new(school_id: i64, portions_small: i32, portions_large: i32) -> Self {
        Self {
            school_id,
            portions_small,
            portions_large,
        }
    }

    pub fn total(&self) -> i64 {
        self.portions_small as i64 + self.portions_large as i64
    }
}

/// 创建/更新菜单项的输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemInput {
    pub date: NaiveDate,
    pub recipe_id: i64,
    pub portions: i32,
    pub school_allocations: Vec<SchoolAllocationInput>,
}

/// 待插入的分配行（展开后、尚未分配主键）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAllocation {
    pub menu_item_id: i64,
    pub school_id: i64,
    pub portion_size: PortionSize,
    pub portions: i32,
    pub date: NaiveDate,
}

// ==========================================
// SchoolAllocationDisplay - 分组视图
// ==========================================
// 每个学校一条，合并 small/large 行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolAllocationDisplay {
    pub school_id: i64,
    pub school_name: String,
    pub school_category: SchoolCategory,
    pub portions_small: i32,
    pub portions_large: i32,
    pub total_portions: i32,
    pub portion_size_type: PortionSizeType,
}
