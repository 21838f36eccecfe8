// ==========================================
// 学校供餐分量分配系统 - 分配分组视图
// ==========================================
// 职责: 将同一学校的 small/large 行合并为一条展示记录
// 红线: 纯函数；输出按学校名称升序
// ==========================================

use std::collections::HashMap;

use crate::config::policy_table::CategoryPolicyTable;
use crate::domain::menu_item::{Allocation, SchoolAllocationDisplay};
use crate::domain::types::PortionSize;

pub struct AllocationGrouper<'a> {
    policies: &'a CategoryPolicyTable,
}

impl<'a> AllocationGrouper<'a> {
    pub fn new(policies: &'a CategoryPolicyTable) -> Self {
        Self { policies }
    }

    /// 按学校合并分配行
    ///
    /// # 规则
    /// - 缺失的规格计 0
    /// - total_portions = small + large
    /// - portion_size_type 由学校类别的分配策略决定（SD → mixed，其余 → large）
    /// - 未预加载学校的行无法展示，记 warn 后跳过
    pub fn group(&self, allocations: &[Allocation]) -> Vec<SchoolAllocationDisplay> {
        let mut index: HashMap<i64, usize> = HashMap::new();
        let mut out: Vec<SchoolAllocationDisplay> = Vec::new();

        for allocation in allocations {
            let Some(school) = allocation.school.as_ref() else {
                tracing::warn!(
                    allocation_id = allocation.id,
                    school_id = allocation.school_id,
                    "分配行缺少学校信息，分组视图跳过"
                );
                continue;
            };

            let slot = *index.entry(school.id).or_insert_with(|| {
                out.push(SchoolAllocationDisplay {
                    school_id: school.id,
                    school_name: school.name.clone(),
                    school_category: school.category,
                    portions_small: 0,
                    portions_large: 0,
                    total_portions: 0,
                    portion_size_type: self.policies.policy_for(school.category).display_type(),
                });
                out.len() - 1
            });

            let display = &mut out[slot];
            match allocation.portion_size {
                PortionSize::Small => display.portions_small += allocation.portions,
                PortionSize::Large => display.portions_large += allocation.portions,
            }
            display.total_portions = display.portions_small + display.portions_large;
        }

        out.sort_by(|a, b| {
            a.school_name
                .cmp(&b.school_name)
                .then(a.school_id.cmp(&b.school_id))
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::school::School;
    use crate::domain::types::{PortionSizeType, SchoolCategory};
    use chrono::NaiveDate;

    fn row(id: i64, school: (i64, &str, SchoolCategory), size: PortionSize, portions: i32) -> Allocation {
        Allocation {
            id,
            menu_item_id: 1,
            school_id: school.0,
            portion_size: size,
            portions,
            date: NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
            school: Some(School {
                id: school.0,
                name: school.1.to_string(),
                category: school.2,
            }),
            menu_item: None,
        }
    }

    fn group(rows: &[Allocation]) -> Vec<SchoolAllocationDisplay> {
        let table = CategoryPolicyTable::default();
        AllocationGrouper::new(&table).group(rows)
    }

    #[test]
    fn test_empty_input() {
        assert!(group(&[]).is_empty());
    }

    #[test]
    fn test_fold_and_order() {
        let zebra = (1, "Zebra", SchoolCategory::Sd);
        let alpha = (2, "Alpha", SchoolCategory::Sd);
        let mango = (3, "Mango", SchoolCategory::Smp);

        let rows = vec![
            row(1, zebra, PortionSize::Small, 10),
            row(2, zebra, PortionSize::Large, 20),
            row(3, alpha, PortionSize::Large, 30),
            row(4, mango, PortionSize::Large, 40),
        ];

        let grouped = group(&rows);
        let names: Vec<_> = grouped.iter().map(|d| d.school_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Mango", "Zebra"]);

        let alpha = &grouped[0];
        assert_eq!((alpha.portions_small, alpha.portions_large, alpha.total_portions), (0, 30, 30));
        assert_eq!(alpha.portion_size_type, PortionSizeType::Mixed);

        let mango = &grouped[1];
        assert_eq!(mango.portion_size_type, PortionSizeType::Large);
        assert_eq!(mango.school_category, SchoolCategory::Smp);

        let zebra = &grouped[2];
        assert_eq!((zebra.portions_small, zebra.portions_large, zebra.total_portions), (10, 20, 30));
    }

    #[test]
    fn test_row_without_school_skipped() {
        let mut orphan = row(1, (9, "Ghost", SchoolCategory::Sd), PortionSize::Large, 5);
        orphan.school = None;
        assert!(group(&[orphan]).is_empty());
    }
}
