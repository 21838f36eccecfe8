// ==========================================
// 学校供餐分量分配系统 - 分配报表导出
// ==========================================
// 职责: 将分组视图 / 日视图序列化为 CSV（保持学校名称顺序）
// ==========================================

use serde::Serialize;
use std::io::Write;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::menu_item::{Allocation, SchoolAllocationDisplay};

#[derive(Debug, Serialize)]
struct GroupedRow<'a> {
    school_id: i64,
    school_name: &'a str,
    school_category: &'static str,
    portions_small: i32,
    portions_large: i32,
    total_portions: i32,
    portion_size_type: &'static str,
}

#[derive(Debug, Serialize)]
struct DailyRow<'a> {
    date: String,
    menu_item_id: i64,
    menu_plan_id: Option<i64>,
    recipe: Option<&'a str>,
    school_id: i64,
    school_name: Option<&'a str>,
    school_category: Option<&'static str>,
    portion_size: &'static str,
    portions: i32,
}

fn csv_error(operation: &str, err: impl ToString) -> ApiError {
    ApiError::Storage {
        operation: operation.to_string(),
        entity: "csv".to_string(),
        message: err.to_string(),
    }
}

/// 导出分组视图（每个学校一行）
///
/// # 返回
/// - Ok(n): 写入的数据行数（不含表头）
pub fn write_grouped_csv<W: Write>(writer: W, rows: &[SchoolAllocationDisplay]) -> ApiResult<usize> {
    const OP: &str = "write_grouped_csv";
    let mut wtr = csv::Writer::from_writer(writer);

    for d in rows {
        wtr.serialize(GroupedRow {
            school_id: d.school_id,
            school_name: &d.school_name,
            school_category: d.school_category.as_str(),
            portions_small: d.portions_small,
            portions_large: d.portions_large,
            total_portions: d.total_portions,
            portion_size_type: d.portion_size_type.as_str(),
        })
        .map_err(|e| csv_error(OP, e))?;
    }

    // 空列表也输出表头
    if rows.is_empty() {
        wtr.write_record([
            "school_id",
            "school_name",
            "school_category",
            "portions_small",
            "portions_large",
            "total_portions",
            "portion_size_type",
        ])
        .map_err(|e| csv_error(OP, e))?;
    }

    wtr.flush().map_err(|e| csv_error(OP, e))?;
    Ok(rows.len())
}

/// 导出某日分配明细（每个分配行一行）
pub fn write_daily_csv<W: Write>(writer: W, rows: &[Allocation]) -> ApiResult<usize> {
    const OP: &str = "write_daily_csv";
    let mut wtr = csv::Writer::from_writer(writer);

    for a in rows {
        let menu_item = a.menu_item.as_ref();
        wtr.serialize(DailyRow {
            date: a.date.format("%Y-%m-%d").to_string(),
            menu_item_id: a.menu_item_id,
            menu_plan_id: menu_item.map(|m| m.menu_plan_id),
            recipe: menu_item
                .and_then(|m| m.recipe.as_ref())
                .map(|r| r.name.as_str()),
            school_id: a.school_id,
            school_name: a.school.as_ref().map(|s| s.name.as_str()),
            school_category: a.school.as_ref().map(|s| s.category.as_str()),
            portion_size: a.portion_size.as_str(),
            portions: a.portions,
        })
        .map_err(|e| csv_error(OP, e))?;
    }

    if rows.is_empty() {
        wtr.write_record([
            "date",
            "menu_item_id",
            "menu_plan_id",
            "recipe",
            "school_id",
            "school_name",
            "school_category",
            "portion_size",
            "portions",
        ])
        .map_err(|e| csv_error(OP, e))?;
    }

    wtr.flush().map_err(|e| csv_error(OP, e))?;
    Ok(rows.len())
}
