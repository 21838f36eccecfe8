// 写入演示数据（学校 / 菜单计划 / 菜谱 / 一个已分配的菜单项）
//
// Usage:
//   cargo run --bin seed_demo_data -- [db_path]

use chrono::NaiveDate;
use rusqlite::params;
use school_meal_allocation::config::CategoryPolicyTable;
use school_meal_allocation::db::{init_schema, open_sqlite_connection};
use school_meal_allocation::domain::{MenuItemInput, SchoolAllocationInput};
use school_meal_allocation::MenuItemApi;
use std::error::Error;
use std::sync::{Arc, Mutex};

const SCHOOLS: &[(i64, &str, &str)] = &[
    (1, "SD Negeri 1 Sukamaju", "SD"),
    (2, "SD Negeri 4 Cibeunying", "SD"),
    (3, "SMP Negeri 2 Lembang", "SMP"),
    (4, "SMA Negeri 5 Bandung", "SMA"),
];

const RECIPES: &[(i64, &str)] = &[(1, "Nasi Ayam Goreng"), (2, "Soto Ayam"), (3, "Ikan Bakar")];

fn main() -> Result<(), Box<dyn Error>> {
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "school_meal_allocation.db".to_string());

    println!("写入演示数据: {}", db_path);

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    // 清空现有业务数据（分配行先删）
    conn.execute_batch(
        r#"
        DELETE FROM menu_item_school_allocation;
        DELETE FROM menu_item;
        DELETE FROM menu_plan;
        DELETE FROM recipe;
        DELETE FROM school;
        "#,
    )?;

    for (id, name, category) in SCHOOLS {
        conn.execute(
            "INSERT INTO school (id, name, category) VALUES (?1, ?2, ?3)",
            params![id, name, category],
        )?;
    }
    for (id, name) in RECIPES {
        conn.execute("INSERT INTO recipe (id, name) VALUES (?1, ?2)", params![id, name])?;
    }
    conn.execute(
        "INSERT INTO menu_plan (id, name) VALUES (1, 'Minggu 1 Januari 2025')",
        [],
    )?;
    println!("学校 {} 所，菜谱 {} 个，菜单计划 1 个", SCHOOLS.len(), RECIPES.len());

    let api = MenuItemApi::new(
        Arc::new(Mutex::new(conn)),
        Arc::new(CategoryPolicyTable::default()),
        "seed_demo_data",
        None,
    );

    let date = NaiveDate::from_ymd_opt(2025, 1, 13).ok_or("invalid demo date")?;
    let item = api.create_menu_item_with_allocations(
        1,
        &MenuItemInput {
            date,
            recipe_id: 1,
            portions: 600,
            school_allocations: vec![
                SchoolAllocationInput::new(1, 100, 50),
                SchoolAllocationInput::new(2, 80, 70),
                SchoolAllocationInput::new(3, 0, 150),
                SchoolAllocationInput::new(4, 0, 150),
            ],
        },
    )?;

    println!(
        "菜单项 {} 已创建: {} 份，{} 条分配行",
        item.id,
        item.portions,
        item.allocations.len()
    );
    Ok(())
}
