// ==========================================
// ConfigManager / AppState 集成测试
// ==========================================
// 测试目标: 类别策略覆写与审计操作人从 config_kv 生效
// ==========================================


use school_meal_allocation::app::AppState;
use school_meal_allocation::config::{config_keys, AllocationConfigReader, CategoryPolicyTable, ConfigManager};
use school_meal_allocation::domain::{AllocationPolicy, ActionType, SchoolCategory};
use test_helpers::*;

#[tokio::test]
async fn test_default_policy_table_without_config() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    let table = config_manager.get_category_policy_table().await.unwrap();
    assert_eq!(table.policy_for(SchoolCategory::Sd), AllocationPolicy::DualSize);
    assert_eq!(table.policy_for(SchoolCategory::Smp), AllocationPolicy::SingleLarge);
    assert_eq!(table.policy_for(SchoolCategory::Sma), AllocationPolicy::SingleLarge);

    assert_eq!(config_manager.get_audit_actor().await.unwrap(), "system");
}

#[tokio::test]
async fn test_policy_config_cannot_reassign_categories() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();
    config_manager
        .set_global_config_value(config_keys::CATEGORY_POLICY, r#"{"SMA":"DUAL_SIZE","SD":"SINGLE_LARGE"}"#)
        .unwrap();

    let table = config_manager.get_category_policy_table().await.unwrap();
    assert_eq!(table.policy_for(SchoolCategory::Sd), AllocationPolicy::DualSize);
    assert_eq!(table.policy_for(SchoolCategory::Smp), AllocationPolicy::SingleLarge);
    assert_eq!(table.policy_for(SchoolCategory::Sma), AllocationPolicy::SingleLarge);
}

#[tokio::test]
async fn test_malformed_policy_config_ignored() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).unwrap();
    config_manager
        .set_global_config_value(config_keys::CATEGORY_POLICY, "not json")
        .unwrap();

    let table = config_manager.get_category_policy_table().await.unwrap();
    assert_eq!(table, CategoryPolicyTable::default());
}

#[tokio::test]
async fn test_app_state_keeps_category_rules_and_uses_configured_actor() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    {
        let config_manager = ConfigManager::new(&db_path).unwrap();
        config_manager
            .set_global_config_value(config_keys::CATEGORY_POLICY, r#"{"SMA":"DUAL_SIZE","SD":"SINGLE_LARGE"}"#)
            .unwrap();
        config_manager
            .set_global_config_value(config_keys::AUDIT_ACTOR, "kitchen_lead")
            .unwrap();
    }

    let state = AppState::new(db_path.clone()).await.unwrap();

    // SMA 仍拒绝小份，未写入任何数据
    let err = state
        .menu_item_api
        .create_menu_item_with_allocations(PLAN_ID, &input(30, &[(SCHOOL_KENANGA_SMA, 10, 20)]))
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "SMA schools cannot have small portions");
    assert_eq!(count_menu_items(&db_path), 0);

    // SD 仍允许小份
    let item = state
        .menu_item_api
        .create_menu_item_with_allocations(PLAN_ID, &input(30, &[(SCHOOL_ALPHA_SD, 10, 20)]))
        .unwrap();
    let sizes: Vec<_> = item.allocations.iter().map(|a| a.portion_size.as_str()).collect();
    assert_eq!(sizes, vec!["small", "large"]);

    let recent = state.action_log_repo.list_recent(10).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].actor, "kitchen_lead");
    assert_eq!(recent[0].typed_action(), Some(ActionType::CreateMenuItem));
}
