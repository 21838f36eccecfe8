// ==========================================
// 学校供餐分量分配系统 - API层错误类型
// ==========================================
// 职责: 定义对外错误分类，转换 Repository / Engine 错误
// 分类: Validation（可通过修正输入解决）/ NotFound / Conflict / Storage
// ==========================================

use crate::engine::expansion::ExpansionError;
use crate::engine::validator::AllocationValidationError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
///
/// 所有错误都不在内部重试；事务开始后的任何错误都已回滚
#[derive(Error, Debug)]
pub enum ApiError {
    /// 分配校验规则违反（从不修改存储）
    #[error("{0}")]
    Validation(String),

    /// 菜单项 / 学校 / 菜单计划 / 菜谱不存在
    #[error("{0}")]
    NotFound(String),

    /// 存储层约束违反（校验已通过，例如与删除并发）
    #[error("约束冲突: {0}")]
    Conflict(String),

    /// 其他存储 / 事务失败
    #[error("存储失败 (operation={operation}, entity={entity}): {message}")]
    Storage {
        operation: String,
        entity: String,
        message: String,
    },
}

impl ApiError {
    /// 是否为校验错误（修正输入后可成功）
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }

    pub fn not_found(entity: &str, id: i64) -> Self {
        ApiError::NotFound(format!("{} {} not found", entity, id))
    }

    /// 带操作上下文转换仓储错误
    pub fn from_repository(err: RepositoryError, operation: &str, entity: &str) -> Self {
        let storage = |message: String| ApiError::Storage {
            operation: operation.to_string(),
            entity: entity.to_string(),
            message,
        };

        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} {} not found", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::ForeignKeyViolation(msg)
            | RepositoryError::CheckConstraintViolation(msg) => ApiError::Conflict(msg),
            RepositoryError::ValidationError(msg) => ApiError::Validation(msg),
            other => storage(other.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换（无操作上下文）
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::from_repository(err, "unknown", "unknown")
    }
}

impl From<AllocationValidationError> for ApiError {
    fn from(err: AllocationValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<ExpansionError> for ApiError {
    fn from(err: ExpansionError) -> Self {
        ApiError::NotFound(err.to_string())
    }
}

/// 为仓储结果附加操作上下文
pub trait RepositoryResultExt<T> {
    fn op(self, operation: &str, entity: &str) -> ApiResult<T>;
}

impl<T> RepositoryResultExt<T> for Result<T, RepositoryError> {
    fn op(self, operation: &str, entity: &str) -> ApiResult<T> {
        self.map_err(|e| ApiError::from_repository(e, operation, entity))
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
