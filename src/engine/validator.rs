// ==========================================
// 学校供餐分量分配系统 - 分配校验器
// ==========================================
// 职责: 校验一组学校分配输入是否满足总量与类别规则
// 红线: 纯函数，无 I/O；首个失败规则即返回
// ==========================================

use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::config::policy_table::CategoryPolicyTable;
use crate::domain::menu_item::SchoolAllocationInput;
use crate::domain::types::SchoolCategory;

/// 分配校验失败原因（按规则顺序）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationValidationError {
    #[error("at least one school allocation is required")]
    Empty,

    #[error("duplicate allocation for school_id {school_id}")]
    DuplicateSchool { school_id: i64 },

    #[error("portions cannot be negative for school_id {school_id}")]
    NegativePortions { school_id: i64 },

    #[error("school_id {school_id} must have at least one portion allocated")]
    NothingAllocated { school_id: i64 },

    #[error("{category} schools cannot have small portions")]
    SmallNotAllowed { school_id: i64, category: SchoolCategory },

    #[error("sum of allocated portions ({sum}) does not equal total portions ({total})")]
    SumMismatch { sum: i64, total: i64 },
}

// ==========================================
// AllocationValidator
// ==========================================
pub struct AllocationValidator<'a> {
    policies: &'a CategoryPolicyTable,
}

impl<'a> AllocationValidator<'a> {
    pub fn new(policies: &'a CategoryPolicyTable) -> Self {
        Self { policies }
    }

    /// 校验分配输入
    ///
    /// # 参数
    /// - total_portions: 菜单项总份数
    /// - inputs: 学校分配输入
    /// - categories: 学校类别（不在表中的学校跳过类别规则，由写入方报告不存在）
    ///
    /// # 规则顺序
    /// 1. 非空
    /// 2. 学校不重复
    /// 3. 非负且至少一种规格大于 0
    /// 4. 仅大份类别不得有小份
    /// 5. 合计等于总份数
    pub fn validate(
        &self,
        total_portions: i32,
        inputs: &[SchoolAllocationInput],
        categories: &HashMap<i64, SchoolCategory>,
    ) -> Result<(), AllocationValidationError> {
        if inputs.is_empty() {
            return Err(AllocationValidationError::Empty);
        }

        let mut seen = HashSet::with_capacity(inputs.len());
        for input in inputs {
            if !seen.insert(input.school_id) {
                return Err(AllocationValidationError::DuplicateSchool {
                    school_id: input.school_id,
                });
            }
        }

        for input in inputs {
            if input.portions_small < 0 || input.portions_large < 0 {
                return Err(AllocationValidationError::NegativePortions {
                    school_id: input.school_id,
                });
            }
            if input.portions_small == 0 && input.portions_large == 0 {
                return Err(AllocationValidationError::NothingAllocated {
                    school_id: input.school_id,
                });
            }
        }

        for input in inputs {
            let Some(&category) = categories.get(&input.school_id) else {
                continue;
            };
            if input.portions_small > 0 && !self.policies.policy_for(category).allows_small() {
                return Err(AllocationValidationError::SmallNotAllowed {
                    school_id: input.school_id,
                    category,
                });
            }
        }

        // i64 累加，避免 i32 溢出
        let sum: i64 = inputs.iter().map(SchoolAllocationInput::total).sum();
        let total = total_portions as i64;
        if sum != total {
            return Err(AllocationValidationError::SumMismatch { sum, total });
        }

        Ok(())
    }
}
