// ==========================================
// 学校供餐分量分配系统 - 菜单项/分配数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只做数据映射
// 约束: 所有方法显式接收连接/事务句柄，由调用方组合成单一事务
// ==========================================

use chrono::{Local, NaiveDate};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::str::FromStr;

use crate::domain::menu_item::{Allocation, AllocationMenuItemRef, MenuItem, NewAllocation};
use crate::domain::school::{Recipe, School};
use crate::domain::types::{PortionSize, SchoolCategory};
use crate::repository::error::RepositoryResult;

const DATE_FMT: &str = "%Y-%m-%d";
const TS_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// MenuItemStore - 菜单项分配存储接口
// ==========================================
// `conn` 可以是普通连接，也可以是 `&Transaction`（Deref 到 Connection）
pub trait MenuItemStore: Send + Sync {
    // ===== 写入 =====

    /// 插入菜单项，返回新 id
    fn insert_menu_item(
        &self,
        conn: &Connection,
        menu_plan_id: i64,
        date: NaiveDate,
        recipe_id: i64,
        portions: i32,
    ) -> RepositoryResult<i64>;

    /// 更新菜单项字段，返回受影响行数
    fn update_menu_item(
        &self,
        conn: &Connection,
        menu_item_id: i64,
        date: NaiveDate,
        recipe_id: i64,
        portions: i32,
    ) -> RepositoryResult<usize>;

    /// 批量插入分配行，返回插入行数
    fn insert_allocations(&self, conn: &Connection, rows: &[NewAllocation]) -> RepositoryResult<usize>;

    /// 删除菜单项下的全部分配行，返回删除行数
    fn delete_allocations_by_menu_item(&self, conn: &Connection, menu_item_id: i64) -> RepositoryResult<usize>;

    /// 删除菜单项，返回删除行数
    fn delete_menu_item(&self, conn: &Connection, menu_item_id: i64) -> RepositoryResult<usize>;

    // ===== 查询 =====

    /// 查询菜单项（不含分配行）
    fn find_menu_item(&self, conn: &Connection, menu_item_id: i64) -> RepositoryResult<Option<MenuItem>>;

    /// 查询菜单项的分配行（预加载学校，按学校名称升序）
    fn query_by_menu_item(&self, conn: &Connection, menu_item_id: i64) -> RepositoryResult<Vec<Allocation>>;

    /// 查询某日全部分配行（预加载学校、菜单项、菜谱，按学校名称升序）
    fn query_by_date(&self, conn: &Connection, date: NaiveDate) -> RepositoryResult<Vec<Allocation>>;

    // ===== 参考数据 =====

    fn find_school(&self, conn: &Connection, school_id: i64) -> RepositoryResult<Option<School>>;

    /// 批量查询学校（不存在的 id 不出现在结果中）
    fn find_schools(&self, conn: &Connection, school_ids: &[i64]) -> RepositoryResult<HashMap<i64, School>>;

    fn menu_plan_exists(&self, conn: &Connection, menu_plan_id: i64) -> RepositoryResult<bool>;

    fn recipe_exists(&self, conn: &Connection, recipe_id: i64) -> RepositoryResult<bool>;
}

// ==========================================
// SqliteMenuItemStore - rusqlite 实现
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteMenuItemStore;

impl SqliteMenuItemStore {
    pub fn new() -> Self {
        Self
    }
}

impl MenuItemStore for SqliteMenuItemStore {
    fn insert_menu_item(
        &self,
        conn: &Connection,
        menu_plan_id: i64,
        date: NaiveDate,
        recipe_id: i64,
        portions: i32,
    ) -> RepositoryResult<i64> {
        let now = Local::now().naive_local().format(TS_FMT).to_string();

        conn.execute(
            r#"INSERT INTO menu_item (
                menu_plan_id, date, recipe_id, portions, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)"#,
            params![
                menu_plan_id,
                date.format(DATE_FMT).to_string(),
                recipe_id,
                portions,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn update_menu_item(
        &self,
        conn: &Connection,
        menu_item_id: i64,
        date: NaiveDate,
        recipe_id: i64,
        portions: i32,
    ) -> RepositoryResult<usize> {
        let now = Local::now().naive_local().format(TS_FMT).to_string();

        let rows = conn.execute(
            r#"UPDATE menu_item
               SET date = ?1, recipe_id = ?2, portions = ?3, updated_at = ?4
               WHERE id = ?5"#,
            params![
                date.format(DATE_FMT).to_string(),
                recipe_id,
                portions,
                now,
                menu_item_id,
            ],
        )?;

        Ok(rows)
    }

    fn insert_allocations(&self, conn: &Connection, rows: &[NewAllocation]) -> RepositoryResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut stmt = conn.prepare_cached(
            r#"INSERT INTO menu_item_school_allocation (
                    menu_item_id, school_id, portion_size, portions, date
                ) VALUES (?1, ?2, ?3, ?4, ?5)"#,
        )?;

        for row in rows {
            stmt.execute(params![
                row.menu_item_id,
                row.school_id,
                row.portion_size.as_str(),
                row.portions,
                row.date.format(DATE_FMT).to_string(),
            ])?;
        }

        Ok(rows.len())
    }

    fn delete_allocations_by_menu_item(&self, conn: &Connection, menu_item_id: i64) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "DELETE FROM menu_item_school_allocation WHERE menu_item_id = ?1",
            params![menu_item_id],
        )?;
        Ok(rows)
    }

    fn delete_menu_item(&self, conn: &Connection, menu_item_id: i64) -> RepositoryResult<usize> {
        let rows = conn.execute("DELETE FROM menu_item WHERE id = ?1", params![menu_item_id])?;
        Ok(rows)
    }

    fn find_menu_item(&self, conn: &Connection, menu_item_id: i64) -> RepositoryResult<Option<MenuItem>> {
        let item = conn
            .query_row(
                r#"SELECT id, menu_plan_id, date, recipe_id, portions
                   FROM menu_item
                   WHERE id = ?1"#,
                params![menu_item_id],
                map_menu_item_row,
            )
            .optional()?;

        Ok(item)
    }

    fn query_by_menu_item(&self, conn: &Connection, menu_item_id: i64) -> RepositoryResult<Vec<Allocation>> {
        let mut stmt = conn.prepare_cached(
            r#"SELECT a.id, a.menu_item_id, a.school_id, a.portion_size, a.portions, a.date,
                      s.id, s.name, s.category
               FROM menu_item_school_allocation a
               LEFT JOIN school s ON s.id = a.school_id
               WHERE a.menu_item_id = ?1
               ORDER BY s.name ASC, a.school_id ASC,
                        CASE a.portion_size WHEN 'small' THEN 0 ELSE 1 END, a.id ASC"#,
        )?;

        let rows = stmt
            .query_map(params![menu_item_id], |row| map_allocation_row(row, false))?
            .collect::<Result<Vec<Allocation>, _>>()?;

        Ok(rows)
    }

    fn query_by_date(&self, conn: &Connection, date: NaiveDate) -> RepositoryResult<Vec<Allocation>> {
        let mut stmt = conn.prepare_cached(
            r#"SELECT a.id, a.menu_item_id, a.school_id, a.portion_size, a.portions, a.date,
                      s.id, s.name, s.category,
                      m.id, m.menu_plan_id, m.date, m.recipe_id, m.portions,
                      r.id, r.name
               FROM menu_item_school_allocation a
               LEFT JOIN school s ON s.id = a.school_id
               LEFT JOIN menu_item m ON m.id = a.menu_item_id
               LEFT JOIN recipe r ON r.id = m.recipe_id
               WHERE a.date = ?1
               ORDER BY s.name ASC, a.school_id ASC, a.menu_item_id ASC,
                        CASE a.portion_size WHEN 'small' THEN 0 ELSE 1 END, a.id ASC"#,
        )?;

        let rows = stmt
            .query_map(params![date.format(DATE_FMT).to_string()], |row| {
                map_allocation_row(row, true)
            })?
            .collect::<Result<Vec<Allocation>, _>>()?;

        Ok(rows)
    }

    fn find_school(&self, conn: &Connection, school_id: i64) -> RepositoryResult<Option<School>> {
        let school = conn
            .query_row(
                "SELECT id, name, category FROM school WHERE id = ?1",
                params![school_id],
                |row| map_school_columns(row, 0),
            )
            .optional()?;

        Ok(school)
    }

    fn find_schools(&self, conn: &Connection, school_ids: &[i64]) -> RepositoryResult<HashMap<i64, School>> {
        if school_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; school_ids.len()].join(", ");
        let sql = format!(
            "SELECT id, name, category FROM school WHERE id IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let schools = stmt
            .query_map(params_from_iter(school_ids.iter()), |row| map_school_columns(row, 0))?
            .collect::<Result<Vec<School>, _>>()?;

        Ok(schools.into_iter().map(|s| (s.id, s)).collect())
    }

    fn menu_plan_exists(&self, conn: &Connection, menu_plan_id: i64) -> RepositoryResult<bool> {
        exists(conn, "SELECT 1 FROM menu_plan WHERE id = ?1", menu_plan_id)
    }

    fn recipe_exists(&self, conn: &Connection, recipe_id: i64) -> RepositoryResult<bool> {
        exists(conn, "SELECT 1 FROM recipe WHERE id = ?1", recipe_id)
    }
}

// ==========================================
// 行映射
// ==========================================

fn exists(conn: &Connection, sql: &str, id: i64) -> RepositoryResult<bool> {
    let found = conn
        .query_row(sql, params![id], |_row| Ok(()))
        .optional()?
        .is_some();
    Ok(found)
}

fn conversion_err(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, msg.into())
}

pub(crate) fn parse_date_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FMT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

fn parse_text_column<T: FromStr<Err = String>>(row: &Row, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse::<T>().map_err(|e| conversion_err(idx, e))
}

fn map_menu_item_row(row: &Row) -> rusqlite::Result<MenuItem> {
    Ok(MenuItem {
        id: row.get(0)?,
        menu_plan_id: row.get(1)?,
        date: parse_date_column(row, 2)?,
        recipe_id: row.get(3)?,
        portions: row.get(4)?,
        allocations: Vec::new(),
    })
}

/// 从 `offset` 起映射 (id, name, category) 三列
pub(crate) fn map_school_columns(row: &Row, offset: usize) -> rusqlite::Result<School> {
    Ok(School {
        id: row.get(offset)?,
        name: row.get(offset + 1)?,
        category: parse_text_column::<SchoolCategory>(row, offset + 2)?,
    })
}

fn map_allocation_row(row: &Row, with_menu_item: bool) -> rusqlite::Result<Allocation> {
    let school = match row.get::<_, Option<i64>>(6)? {
        Some(_) => Some(map_school_columns(row, 6)?),
        None => None,
    };

    let menu_item = if with_menu_item {
        match row.get::<_, Option<i64>>(9)? {
            Some(id) => {
                let recipe = match row.get::<_, Option<i64>>(14)? {
                    Some(recipe_id) => Some(Recipe {
                        id: recipe_id,
                        name: row.get(15)?,
                    }),
                    None => None,
                };
                Some(AllocationMenuItemRef {
                    id,
                    menu_plan_id: row.get(10)?,
                    date: parse_date_column(row, 11)?,
                    recipe_id: row.get(12)?,
                    portions: row.get(13)?,
                    recipe,
                })
            }
            None => None,
        }
    } else {
        None
    };

    Ok(Allocation {
        id: row.get(0)?,
        menu_item_id: row.get(1)?,
        school_id: row.get(2)?,
        portion_size: parse_text_column::<PortionSize>(row, 3)?,
        portions: row.get(4)?,
        date: parse_date_column(row, 5)?,
        school,
        menu_item,
    })
}
