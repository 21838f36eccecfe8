// ==========================================
// 学校供餐分量分配系统 - 类别分配策略表
// ==========================================
// 职责: 学校类别 → 分配策略 的规则表
// 约束: 映射固定 (SD → 大小份，SMP/SMA → 仅大份)；启动时构建一次，按引用（Arc）传入使用方
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::types::{AllocationPolicy, SchoolCategory};

/// 类别分配策略表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicyTable {
    policies: BTreeMap<SchoolCategory, AllocationPolicy>,
}

impl CategoryPolicyTable {
    /// 查询类别对应的策略
    pub fn policy_for(&self, category: SchoolCategory) -> AllocationPolicy {
        self.policies
            .get(&category)
            .copied()
            .unwrap_or(AllocationPolicy::SingleLarge)
    }

    /// 遍历全部 (类别, 策略)
    pub fn iter(&self) -> impl Iterator<Item = (SchoolCategory, AllocationPolicy)> + '_ {
        self.policies.iter().map(|(c, p)| (*c, *p))
    }
}

impl Default for CategoryPolicyTable {
    fn default() -> Self {
        let policies = SchoolCategory::ALL
            .iter()
            .map(|category| {
                let policy = match category {
                    SchoolCategory::Sd => AllocationPolicy::DualSize,
                    SchoolCategory::Smp | SchoolCategory::Sma => AllocationPolicy::SingleLarge,
                };
                (*category, policy)
            })
            .collect();
        Self { policies }
    }
}
