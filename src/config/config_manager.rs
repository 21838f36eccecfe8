// ==========================================
// 学校供餐分量分配系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

use crate::config::allocation_config_trait::AllocationConfigReader;
use crate::config::policy_table::CategoryPolicyTable;
use crate::db::open_sqlite_connection;
use crate::domain::types::{AllocationPolicy, SchoolCategory};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }
}

/// 解析类别策略配置 JSON，格式: {"SMA": "SINGLE_LARGE"}
///
/// 类别策略固定，不接受覆写；返回与固定策略不一致（或类别无法识别）的条目
fn conflicting_policy_entries(raw: &str) -> Result<Vec<(String, AllocationPolicy)>, serde_json::Error> {
    let map: HashMap<String, AllocationPolicy> = serde_json::from_str(raw)?;
    let fixed = CategoryPolicyTable::default();

    let mut conflicts: Vec<(String, AllocationPolicy)> = map
        .into_iter()
        .filter(|(key, policy)| match key.parse::<SchoolCategory>() {
            Ok(category) => fixed.policy_for(category) != *policy,
            Err(_) => true,
        })
        .collect();
    conflicts.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(conflicts)
}

// ==========================================
// AllocationConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AllocationConfigReader for ConfigManager {
    async fn get_category_policy_table(&self) -> Result<CategoryPolicyTable, Box<dyn Error>> {
        let table = CategoryPolicyTable::default();
        let raw = match self.get_config_value(config_keys::CATEGORY_POLICY)? {
            Some(v) => v,
            None => return Ok(table),
        };

        match conflicting_policy_entries(&raw) {
            Ok(conflicts) => {
                for (category, policy) in conflicts {
                    tracing::warn!(
                        config_key = config_keys::CATEGORY_POLICY,
                        category = %category,
                        policy = %policy,
                        "类别分配策略固定，忽略配置覆写"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    config_key = config_keys::CATEGORY_POLICY,
                    raw_value = %raw,
                    "类别策略配置格式错误，已忽略: {}",
                    e
                );
            }
        }
        Ok(table)
    }

    async fn get_audit_actor(&self) -> Result<String, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::AUDIT_ACTOR, "system")?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok("system".to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 类别分配策略 (JSON，只读校验：与固定策略冲突的条目被忽略)
    pub const CATEGORY_POLICY: &str = "allocation.category_policy";

    // 审计操作人
    pub const AUDIT_ACTOR: &str = "allocation.audit_actor";
}
