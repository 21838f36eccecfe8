// ==========================================
// 分配写入集成测试
// ==========================================
// 测试目标: 创建菜单项时的展开、校验、原子性与审计
// ==========================================


use school_meal_allocation::api::ApiError;
use school_meal_allocation::domain::{ActionType, PortionSize};
use school_meal_allocation::engine::MenuItemEventType;
use school_meal_allocation::repository::ActionLogRepository;
use std::sync::Arc;
use std::time::{Duration, Instant};
use test_helpers::*;

#[test]
fn test_sd_school_mixed_sizes_creates_two_rows() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);

    let item = api
        .create_menu_item_with_allocations(PLAN_ID, &input(300, &[(SCHOOL_ALPHA_SD, 150, 150)]))
        .unwrap();

    assert_eq!(item.menu_plan_id, PLAN_ID);
    assert_eq!(item.portions, 300);
    assert_eq!(item.allocations.len(), 2);
    assert_eq!(item.allocated_portions(), 300);
    assert_eq!(item.allocations[0].portion_size, PortionSize::Small);
    assert_eq!(item.allocations[1].portion_size, PortionSize::Large);
    assert!(item.allocations.iter().all(|a| a.school.is_some()));

    assert_eq!(count_allocations(&db_path, item.id), 2);
    assert_eq!(sum_allocated_portions(&db_path, item.id), 300);
}

#[test]
fn test_smp_school_creates_single_large_row() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);

    let item = api
        .create_menu_item_with_allocations(PLAN_ID, &input(200, &[(SCHOOL_MANGO_SMP, 0, 200)]))
        .unwrap();

    assert_eq!(
        allocation_rows(&db_path, item.id),
        vec![(SCHOOL_MANGO_SMP, "large".to_string(), 200)]
    );
}

#[test]
fn test_sd_cardinality_follows_nonzero_sizes() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);

    for (small, large, expected_rows) in [(10, 0, 1), (0, 10, 1), (4, 6, 2)] {
        let item = api
            .create_menu_item_with_allocations(PLAN_ID, &input(small + large, &[(SCHOOL_ZEBRA_SD, small, large)]))
            .unwrap();
        assert_eq!(
            count_allocations(&db_path, item.id),
            expected_rows,
            "small={} large={}",
            small,
            large
        );
        assert_eq!(sum_allocated_portions(&db_path, item.id), (small + large) as i64);
    }
}

#[test]
fn test_mixed_categories_sum_preserved_and_ordered() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);

    let item = api
        .create_menu_item_with_allocations(
            PLAN_ID,
            &input(
                500,
                &[
                    (SCHOOL_ZEBRA_SD, 50, 50),
                    (SCHOOL_ALPHA_SD, 100, 0),
                    (SCHOOL_MANGO_SMP, 0, 150),
                    (SCHOOL_KENANGA_SMA, 0, 150),
                ],
            ),
        )
        .unwrap();

    assert_eq!(item.allocations.len(), 5);
    assert_eq!(sum_allocated_portions(&db_path, item.id), 500);

    let names = school_names(&item.allocations);
    assert_eq!(names, vec!["Alpha", "Kenanga", "Mango", "Zebra", "Zebra"]);
    assert_non_decreasing(&names);
}

#[test]
fn test_sum_mismatch_rejected_without_writes() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);

    let err = api
        .create_menu_item_with_allocations(PLAN_ID, &input(500, &[(SCHOOL_ALPHA_SD, 150, 150)]))
        .unwrap_err();

    assert!(err.is_validation());
    assert_eq!(
        err.to_string(),
        "sum of allocated portions (300) does not equal total portions (500)"
    );
    assert_eq!(count_menu_items(&db_path), 0);
    assert_eq!(count_all_allocations(&db_path), 0);
    assert_eq!(count_action_logs(&db_path), 0);
}

#[test]
fn test_small_portions_for_secondary_rejected() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);

    let err = api
        .create_menu_item_with_allocations(PLAN_ID, &input(200, &[(SCHOOL_MANGO_SMP, 100, 100)]))
        .unwrap_err();
    assert_eq!(err.to_string(), "SMP schools cannot have small portions");

    let err = api
        .create_menu_item_with_allocations(PLAN_ID, &input(20, &[(SCHOOL_KENANGA_SMA, 1, 19)]))
        .unwrap_err();
    assert_eq!(err.to_string(), "SMA schools cannot have small portions");

    assert_eq!(count_menu_items(&db_path), 0);
    assert_eq!(count_all_allocations(&db_path), 0);
}

#[test]
fn test_empty_and_duplicate_inputs_rejected() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);

    let err = api
        .create_menu_item_with_allocations(PLAN_ID, &input(10, &[]))
        .unwrap_err();
    assert_eq!(err.to_string(), "at least one school allocation is required");

    let err = api
        .create_menu_item_with_allocations(
            PLAN_ID,
            &input(20, &[(SCHOOL_ALPHA_SD, 10, 0), (SCHOOL_ALPHA_SD, 0, 10)]),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "duplicate allocation for school_id 2");

    let err = api
        .create_menu_item_with_allocations(PLAN_ID, &input(0, &[(SCHOOL_ALPHA_SD, 0, 0)]))
        .unwrap_err();
    assert!(err.is_validation());

    assert_eq!(count_menu_items(&db_path), 0);
}

#[test]
fn test_unknown_school_rolls_back_menu_item() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);

    let err = api
        .create_menu_item_with_allocations(
            PLAN_ID,
            &input(30, &[(SCHOOL_ALPHA_SD, 10, 10), (999, 0, 10)]),
        )
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(ref m) if m == "school_id 999 not found"));
    assert!(!err.is_validation());
    assert_eq!(count_menu_items(&db_path), 0);
    assert_eq!(count_all_allocations(&db_path), 0);
    assert_eq!(count_action_logs(&db_path), 0);
}

#[test]
fn test_missing_menu_plan_or_recipe_not_found() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);

    let err = api
        .create_menu_item_with_allocations(77, &input(10, &[(SCHOOL_ALPHA_SD, 0, 10)]))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref m) if m == "menu_plan_id 77 not found"));

    let mut bad_recipe = input(10, &[(SCHOOL_ALPHA_SD, 0, 10)]);
    bad_recipe.recipe_id = 88;
    let err = api
        .create_menu_item_with_allocations(PLAN_ID, &bad_recipe)
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref m) if m == "recipe_id 88 not found"));

    assert_eq!(count_menu_items(&db_path), 0);
}

#[test]
fn test_insert_failure_mid_transaction_leaves_no_rows() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api_with_store(&db_path, FailingInsertStore::failing());

    let err = api
        .create_menu_item_with_allocations(
            PLAN_ID,
            &input(300, &[(SCHOOL_ALPHA_SD, 100, 100), (SCHOOL_MANGO_SMP, 0, 100)]),
        )
        .unwrap_err();

    assert!(matches!(err, ApiError::Storage { ref operation, .. } if operation == "create_menu_item_with_allocations"));
    assert_eq!(count_menu_items(&db_path), 0);
    assert_eq!(count_all_allocations(&db_path), 0);
    assert_eq!(count_action_logs(&db_path), 0);
}

#[test]
fn test_create_writes_audit_row_and_publishes_after_commit() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let publisher = Arc::new(RecordingPublisher::default());
    let api = new_api_with_publisher(&db_path, publisher.clone());

    let item = api
        .create_menu_item_with_allocations(PLAN_ID, &input(40, &[(SCHOOL_ZEBRA_SD, 15, 25)]))
        .unwrap();

    let logs = ActionLogRepository::new(shared_connection(&db_path))
        .find_by_menu_item(item.id)
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].typed_action(), Some(ActionType::CreateMenuItem));
    assert_eq!(logs[0].actor, TEST_ACTOR);
    assert_eq!(logs[0].menu_plan_id, Some(PLAN_ID));
    assert_eq!(logs[0].date_range_start, Some(test_date()));
    let payload = logs[0].payload_json.as_ref().unwrap();
    assert_eq!(payload["portions"], 40);
    assert_eq!(payload["school_allocations"][0]["portions_small"], 15);

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, MenuItemEventType::Created);
    assert_eq!(events[0].menu_item_id, item.id);
    assert_eq!(events[0].date, test_date());
}

#[test]
fn test_failed_create_publishes_nothing() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let publisher = Arc::new(RecordingPublisher::default());
    let api = new_api_with_publisher(&db_path, publisher.clone());

    assert!(api
        .create_menu_item_with_allocations(PLAN_ID, &input(99, &[(SCHOOL_ZEBRA_SD, 15, 25)]))
        .is_err());
    assert!(publisher.events().is_empty());
}

#[test]
fn test_publisher_failure_does_not_fail_create() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api_with_publisher(&db_path, Arc::new(FailingPublisher));

    let item = api
        .create_menu_item_with_allocations(PLAN_ID, &input(10, &[(SCHOOL_MANGO_SMP, 0, 10)]))
        .unwrap();
    assert_eq!(count_allocations(&db_path, item.id), 1);
}

#[test]
fn test_invalid_input_rejected_while_another_writer_holds_lock() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = new_api(&db_path);

    // 另一个连接持有写锁
    let writer = open_test_connection(&db_path).unwrap();
    writer.execute_batch("BEGIN IMMEDIATE;").unwrap();

    let started = Instant::now();
    let err = api
        .create_menu_item_with_allocations(PLAN_ID, &input(30, &[(SCHOOL_MANGO_SMP, 10, 20)]))
        .unwrap_err();
    assert!(err.is_validation(), "unexpected error: {}", err);
    assert_eq!(err.to_string(), "SMP schools cannot have small portions");
    assert!(started.elapsed() < Duration::from_secs(2));

    writer.execute_batch("ROLLBACK;").unwrap();
    assert_eq!(count_menu_items(&db_path), 0);
}
