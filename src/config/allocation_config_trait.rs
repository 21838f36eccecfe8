// ==========================================
// 学校供餐分量分配系统 - 分配配置读取 Trait
// ==========================================
// 职责: 定义分配核心所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

use crate::config::policy_table::CategoryPolicyTable;

// ==========================================
// AllocationConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait AllocationConfigReader: Send + Sync {
    /// 获取类别分配策略表
    ///
    /// # 默认值
    /// - SD → DUAL_SIZE, SMP → SINGLE_LARGE, SMA → SINGLE_LARGE
    async fn get_category_policy_table(&self) -> Result<CategoryPolicyTable, Box<dyn Error>>;

    /// 获取审计日志中记录的操作人
    ///
    /// # 默认值
    /// - "system"
    async fn get_audit_actor(&self) -> Result<String, Box<dyn Error>>;
}
