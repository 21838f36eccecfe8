// ==========================================
// 学校供餐分量分配系统 - 事务辅助
// ==========================================
// 红线: 一次写操作 = 一个事务；闭包返回 Err 即回滚
// ==========================================

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::repository::error::RepositoryError;

/// 在写事务中执行闭包
///
/// # 说明
/// - 使用 BEGIN IMMEDIATE：写锁在事务开始时获取，同一库文件上的并发写入串行化（后提交者覆盖）
/// - 闭包返回 Err 时事务随 drop 回滚，不会留下部分写入
pub fn run_in_transaction<T, E, F>(conn: &mut Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<RepositoryError>,
{
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|e| RepositoryError::DatabaseTransactionError(format!("开启事务失败: {}", e)))?;

    let value = match f(&tx) {
        Ok(v) => v,
        Err(e) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::warn!("事务回滚失败: {}", rollback_err);
            }
            return Err(e);
        }
    };

    tx.commit()
        .map_err(|e| RepositoryError::DatabaseTransactionError(format!("提交事务失败: {}", e)))?;

    Ok(value)
}
