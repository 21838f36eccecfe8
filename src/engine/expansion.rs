// ==========================================
// 学校供餐分量分配系统 - 分配行展开
// ==========================================
// 职责: 将每个学校的 (small, large) 输入展开为具体分配行
// 红线: 不落 0 份的行；按学校分配策略分派，不比较类别字符串
// ==========================================

use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::policy_table::CategoryPolicyTable;
use crate::domain::menu_item::{NewAllocation, SchoolAllocationInput};
use crate::domain::school::School;
use crate::domain::types::{AllocationPolicy, PortionSize};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpansionError {
    #[error("school_id {0} not found")]
    SchoolNotFound(i64),
}

// ==========================================
// AllocationExpander
// ==========================================
pub struct AllocationExpander<'a> {
    policies: &'a CategoryPolicyTable,
}

impl<'a> AllocationExpander<'a> {
    pub fn new(policies: &'a CategoryPolicyTable) -> Self {
        Self { policies }
    }

    /// 展开全部学校输入（保持输入顺序，每个学校内 small 在前）
    ///
    /// # 错误
    /// - `SchoolNotFound`: 输入引用的学校不在 `schools` 中
    pub fn expand(
        &self,
        menu_item_id: i64,
        date: NaiveDate,
        inputs: &[SchoolAllocationInput],
        schools: &HashMap<i64, School>,
    ) -> Result<Vec<NewAllocation>, ExpansionError> {
        let mut rows = Vec::with_capacity(inputs.len() * 2);

        for input in inputs {
            let school = schools
                .get(&input.school_id)
                .ok_or(ExpansionError::SchoolNotFound(input.school_id))?;

            let policy = self.policies.policy_for(school.category);
            let before = rows.len();
            expand_one(policy, menu_item_id, date, input, &mut rows);

            tracing::debug!(
                school_id = input.school_id,
                category = %school.category,
                policy = %policy,
                rows = rows.len() - before,
                "分配行展开"
            );
        }

        Ok(rows)
    }
}

fn expand_one(
    policy: AllocationPolicy,
    menu_item_id: i64,
    date: NaiveDate,
    input: &SchoolAllocationInput,
    rows: &mut Vec<NewAllocation>,
) {
    let row = |portion_size, portions| NewAllocation {
        menu_item_id,
        school_id: input.school_id,
        portion_size,
        portions,
        date,
    };

    match policy {
        AllocationPolicy::DualSize => {
            if input.portions_small > 0 {
                rows.push(row(PortionSize::Small, input.portions_small));
            }
            if input.portions_large > 0 {
                rows.push(row(PortionSize::Large, input.portions_large));
            }
        }
        AllocationPolicy::SingleLarge => {
            // 校验已保证 small == 0
            if input.portions_large > 0 {
                rows.push(row(PortionSize::Large, input.portions_large));
            }
        }
    }
}
