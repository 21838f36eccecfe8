// ==========================================
// 学校供餐分量分配系统 - 学校数据仓储
// ==========================================
// 学校为只读参考数据；删除仅用于维护，且被分配行引用时拒绝
// ==========================================

use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use crate::domain::school::School;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::menu_item_repo::map_school_columns;

// ==========================================
// SchoolRepository - 学校仓储
// ==========================================
pub struct SchoolRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SchoolRepository {
    /// 创建新的SchoolRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按id查询学校
    pub fn find_by_id(&self, school_id: i64) -> RepositoryResult<Option<School>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            "SELECT id, name, category FROM school WHERE id = ?1",
            params![school_id],
            |row| map_school_columns(row, 0),
        ) {
            Ok(school) => Ok(Some(school)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部学校（按名称升序）
    pub fn list_all(&self) -> RepositoryResult<Vec<School>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, name, category FROM school ORDER BY name ASC, id ASC",
        )?;

        let schools = stmt
            .query_map([], |row| map_school_columns(row, 0))?
            .collect::<Result<Vec<School>, _>>()?;

        Ok(schools)
    }

    /// 统计引用该学校的分配行数
    pub fn count_allocation_refs(&self, school_id: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        count_refs(&conn, school_id)
    }

    /// 删除学校
    ///
    /// # 错误
    /// - `ForeignKeyViolation`: 仍有分配行引用该学校（不依赖 SQLite 外键是否开启）
    /// - `NotFound`: 学校不存在
    pub fn delete(&self, school_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let refs = count_refs(&conn, school_id)?;
        if refs > 0 {
            return Err(RepositoryError::ForeignKeyViolation(format!(
                "school_id {} is referenced by {} allocation rows",
                school_id, refs
            )));
        }

        let rows = conn.execute("DELETE FROM school WHERE id = ?1", params![school_id])?;
        if rows == 0 {
            return Err(RepositoryError::not_found("School", school_id));
        }

        Ok(())
    }
}

fn count_refs(conn: &Connection, school_id: i64) -> RepositoryResult<i64> {
    let refs: i64 = conn.query_row(
        "SELECT COUNT(*) FROM menu_item_school_allocation WHERE school_id = ?1",
        params![school_id],
        |row| row.get(0),
    )?;
    Ok(refs)
}
