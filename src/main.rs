// ==========================================
// 学校供餐分量分配系统 - 命令行入口
// ==========================================
// 用法:
//   school-meal-allocation [--db PATH] <command> [args...]
//
// 命令:
//   init                                  初始化数据库 schema
//   show <menu_item_id>                   平铺视图 (JSON)
//   grouped <menu_item_id>                按学校分组视图 (JSON)
//   by-date <YYYY-MM-DD>                  某日全部分配行 (JSON)
//   export <menu_item_id> <out.csv>       导出分组视图 CSV
//   delete <menu_plan_id> <menu_item_id>  删除菜单项及其分配
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use school_meal_allocation::api::write_grouped_csv;
use school_meal_allocation::app::{get_default_db_path, AppState};
use school_meal_allocation::logging;

const USAGE: &str = "用法: school-meal-allocation [--db PATH] <init|show|grouped|by-date|export|delete> [args...]";

fn parse_id(raw: Option<&String>, name: &str) -> Result<i64> {
    let raw = raw.ok_or_else(|| anyhow!("缺少参数 <{}>\n{}", name, USAGE))?;
    raw.trim()
        .parse::<i64>()
        .with_context(|| format!("参数 <{}> 不是整数: {}", name, raw))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_from_env();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let db_path = match args.iter().position(|a| a == "--db") {
        Some(idx) => {
            if idx + 1 >= args.len() {
                bail!("--db 缺少路径\n{}", USAGE);
            }
            let path = args.remove(idx + 1);
            args.remove(idx);
            path
        }
        None => get_default_db_path(),
    };

    let Some(command) = args.first().cloned() else {
        bail!("{}", USAGE);
    };
    let rest = &args[1..];

    tracing::info!(
        "{} v{} - 数据库: {}",
        school_meal_allocation::APP_NAME,
        school_meal_allocation::VERSION,
        db_path
    );

    let state = AppState::new(db_path).await.map_err(|e| anyhow!(e))?;
    let api = &state.menu_item_api;

    match command.as_str() {
        "init" => {
            println!("数据库已初始化: {}", state.db_path);
        }
        "show" => {
            let menu_item_id = parse_id(rest.first(), "menu_item_id")?;
            let item = api.get_menu_item_with_allocations(menu_item_id)?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }
        "grouped" => {
            let menu_item_id = parse_id(rest.first(), "menu_item_id")?;
            let rows = api.get_school_allocations_with_portion_sizes(menu_item_id)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        "by-date" => {
            let raw = rest.first().ok_or_else(|| anyhow!("缺少参数 <YYYY-MM-DD>\n{}", USAGE))?;
            let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .with_context(|| format!("日期格式错误: {}", raw))?;
            let rows = api.get_allocations_by_date(date)?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        "export" => {
            let menu_item_id = parse_id(rest.first(), "menu_item_id")?;
            let out = rest.get(1).ok_or_else(|| anyhow!("缺少参数 <out.csv>\n{}", USAGE))?;
            let rows = api.get_school_allocations_with_portion_sizes(menu_item_id)?;
            let file = std::fs::File::create(out).with_context(|| format!("无法创建文件: {}", out))?;
            let n = write_grouped_csv(file, &rows)?;
            println!("已导出 {} 个学校到 {}", n, out);
        }
        "delete" => {
            let menu_plan_id = parse_id(rest.first(), "menu_plan_id")?;
            let menu_item_id = parse_id(rest.get(1), "menu_item_id")?;
            api.delete_menu_item(menu_plan_id, menu_item_id)?;
            println!("已删除菜单项 {}", menu_item_id);
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }

    Ok(())
}
