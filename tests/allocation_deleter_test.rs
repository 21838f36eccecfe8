// ==========================================
// 菜单项删除集成测试
// ==========================================
// 测试目标: 删除菜单项时清理分配行、不影响参考数据、学校删除受限
// ==========================================


use school_meal_allocation::api::ApiError;
use school_meal_allocation::domain::ActionType;
use school_meal_allocation::engine::MenuItemEventType;
use school_meal_allocation::repository::{ActionLogRepository, RepositoryError, SchoolRepository};
use std::sync::Arc;
use test_helpers::*;

fn create_four_row_item(api: &school_meal_allocation::MenuItemApi) -> i64 {
    api.create_menu_item_with_allocations(
        PLAN_ID,
        &input(
            400,
            &[
                (SCHOOL_ALPHA_SD, 50, 50),
                (SCHOOL_MANGO_SMP, 0, 150),
                (SCHOOL_KENANGA_SMA, 0, 150),
            ],
        ),
    )
    .unwrap()
    .id
}

#[test]
fn test_delete_removes_all_rows() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);
    let id = create_four_row_item(&api);
    assert_eq!(count_allocations(&db_path, id), 4);

    api.delete_menu_item(PLAN_ID, id).unwrap();

    assert_eq!(count_allocations(&db_path, id), 0);
    assert_eq!(count_menu_items(&db_path), 0);
    let err = api.get_menu_item_with_allocations(id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // 参考数据保持不变
    assert_eq!(count_schools(&db_path), 5);
}

#[test]
fn test_delete_without_foreign_keys_still_sweeps_rows() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);
    let id = create_four_row_item(&api);

    // 关闭外键的连接上删除，级联不可用
    let conn = open_test_connection(&db_path).unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    let api_no_fk = school_meal_allocation::MenuItemApi::new(
        Arc::new(std::sync::Mutex::new(conn)),
        Arc::new(school_meal_allocation::CategoryPolicyTable::default()),
        TEST_ACTOR,
        None,
    );

    api_no_fk.delete_menu_item(PLAN_ID, id).unwrap();
    assert_eq!(count_all_allocations(&db_path), 0);
}

#[test]
fn test_delete_other_items_untouched() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);
    let doomed = create_four_row_item(&api);
    let kept = create_four_row_item(&api);

    api.delete_menu_item(PLAN_ID, doomed).unwrap();

    assert_eq!(count_allocations(&db_path, kept), 4);
    assert_eq!(api.get_menu_item_with_allocations(kept).unwrap().portions, 400);
}

#[test]
fn test_delete_missing_or_foreign_plan_not_found() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);
    let id = create_four_row_item(&api);

    let err = api.delete_menu_item(PLAN_ID, 9999).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // 菜单项不属于该计划：不删除任何数据
    let err = api.delete_menu_item(OTHER_PLAN_ID, id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref m) if m == &format!("menu_item_id {} not found", id)));
    assert_eq!(count_allocations(&db_path, id), 4);
}

#[test]
fn test_delete_audit_survives_and_event_published() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let publisher = Arc::new(RecordingPublisher::default());
    let api = new_api_with_publisher(&db_path, publisher.clone());
    let id = create_four_row_item(&api);

    api.delete_menu_item(PLAN_ID, id).unwrap();

    let logs = ActionLogRepository::new(shared_connection(&db_path))
        .find_by_menu_item(id)
        .unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[1].typed_action(), Some(ActionType::DeleteMenuItem));
    assert_eq!(logs[1].payload_json.as_ref().unwrap()["removed_allocations"], 4);

    let types: Vec<_> = publisher.events().iter().map(|e| e.event_type).collect();
    assert_eq!(types, vec![MenuItemEventType::Created, MenuItemEventType::Deleted]);
}

#[test]
fn test_referenced_school_cannot_be_deleted() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);
    let id = create_four_row_item(&api);

    let schools = SchoolRepository::new(shared_connection(&db_path));
    let err = schools.delete(SCHOOL_MANGO_SMP).unwrap_err();
    assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    assert_eq!(count_schools(&db_path), 5);

    // 删除菜单项后学校不再被引用
    api.delete_menu_item(PLAN_ID, id).unwrap();
    schools.delete(SCHOOL_MANGO_SMP).unwrap();
    assert_eq!(count_schools(&db_path), 4);

    schools.delete(SCHOOL_UNUSED_SD).unwrap();
    assert_eq!(count_schools(&db_path), 3);
}
