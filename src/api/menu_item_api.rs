// ==========================================
// 学校供餐分量分配系统 - 菜单项分配 API
// ==========================================
// 职责: 菜单项 + 学校分配的创建、整体替换、查询、删除
// 红线: 一次写操作 = 一个事务；校验先于任何破坏性步骤
// ==========================================

use chrono::NaiveDate;
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::error::{ApiError, ApiResult, RepositoryResultExt};
use crate::config::policy_table::CategoryPolicyTable;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::menu_item::{Allocation, MenuItem, MenuItemInput, SchoolAllocationDisplay};
use crate::domain::school::School;
use crate::domain::types::SchoolCategory;
use crate::engine::events::{
    MenuItemEvent, MenuItemEventPublisher, MenuItemEventType, OptionalEventPublisher,
};
use crate::engine::expansion::AllocationExpander;
use crate::engine::grouper::AllocationGrouper;
use crate::engine::validator::AllocationValidator;
use crate::perf::PerfGuard;
use crate::repository::action_log_repo::insert_action_log;
use crate::repository::error::RepositoryError;
use crate::repository::menu_item_repo::{MenuItemStore, SqliteMenuItemStore};
use crate::repository::tx::run_in_transaction;

// ==========================================
// MenuItemApi - 菜单项分配 API
// ==========================================

/// 菜单项分配API
///
/// 职责：
/// 1. 创建菜单项并落地学校分配行（4 个步骤同一事务）
/// 2. 整体替换分配（先校验，再删除旧行、写入新行）
/// 3. 平铺视图（按菜单项 / 按日期）与按学校分组视图
/// 4. 删除菜单项并清理其分配行
///
/// 写操作在同一事务内记录 ActionLog；事务提交后才发布变更事件
pub struct MenuItemApi<S: MenuItemStore = SqliteMenuItemStore> {
    conn: Arc<Mutex<Connection>>,
    store: S,
    policies: Arc<CategoryPolicyTable>,
    actor: String,
    event_publisher: OptionalEventPublisher,
}

impl MenuItemApi<SqliteMenuItemStore> {
    /// 创建新的MenuItemApi实例（SQLite 存储）
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        policies: Arc<CategoryPolicyTable>,
        actor: impl Into<String>,
        event_publisher: Option<Arc<dyn MenuItemEventPublisher>>,
    ) -> Self {
        Self::with_store(conn, SqliteMenuItemStore::new(), policies, actor, event_publisher)
    }
}

impl<S: MenuItemStore> MenuItemApi<S> {
    /// 使用指定存储实现创建实例
    pub fn with_store(
        conn: Arc<Mutex<Connection>>,
        store: S,
        policies: Arc<CategoryPolicyTable>,
        actor: impl Into<String>,
        event_publisher: Option<Arc<dyn MenuItemEventPublisher>>,
    ) -> Self {
        let event_publisher = match event_publisher {
            Some(p) => OptionalEventPublisher::with_publisher(p),
            None => OptionalEventPublisher::none(),
        };

        Self {
            conn,
            store,
            policies,
            actor: actor.into(),
            event_publisher,
        }
    }

    fn lock_conn(&self, operation: &str) -> ApiResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
            .op(operation, "connection")
    }

    // ==========================================
    // 写操作
    // ==========================================

    /// 创建菜单项及其学校分配
    ///
    /// # 参数
    /// - menu_plan_id: 所属菜单计划
    /// - input: 日期、菜谱、总份数、各学校 (small, large)
    ///
    /// # 返回
    /// - Ok(MenuItem): 分配行已按学校名称升序填充，学校已预加载
    /// - Err(ApiError::Validation): 校验失败，未写入任何数据
    /// - Err(ApiError::NotFound): 菜单计划 / 菜谱 / 学校不存在，事务已回滚
    pub fn create_menu_item_with_allocations(
        &self,
        menu_plan_id: i64,
        input: &MenuItemInput,
    ) -> ApiResult<MenuItem> {
        const OP: &str = "create_menu_item_with_allocations";
        let _perf = PerfGuard::new(OP);

        let mut conn = self.lock_conn(OP)?;
        self.log_outcome(OP, self.precheck(&conn, input, OP))?;

        let result = run_in_transaction(&mut conn, |tx| -> ApiResult<MenuItem> {
            // 写锁期间学校类别可能已变化，事务内复核
            let schools = self.load_schools(tx, input, OP)?;
            self.validate(input, &schools)?;

            if !self.store.menu_plan_exists(tx, menu_plan_id).op(OP, "menu_plan")? {
                return Err(ApiError::not_found("menu_plan_id", menu_plan_id));
            }
            if !self.store.recipe_exists(tx, input.recipe_id).op(OP, "recipe")? {
                return Err(ApiError::not_found("recipe_id", input.recipe_id));
            }

            let menu_item_id = self
                .store
                .insert_menu_item(tx, menu_plan_id, input.date, input.recipe_id, input.portions)
                .op(OP, "menu_item")?;

            let inserted = self.write_allocations(tx, menu_item_id, input, &schools, OP)?;

            let log = self.action_log(ActionType::CreateMenuItem, menu_plan_id, menu_item_id, input);
            insert_action_log(tx, &log).op(OP, "action_log")?;

            tracing::debug!(menu_item_id, rows = inserted, "菜单项及分配行已写入事务");
            self.load_menu_item(tx, menu_item_id, OP)
        });
        drop(conn);

        let menu_item = self.log_outcome(OP, result)?;
        tracing::info!(
            menu_plan_id,
            menu_item_id = menu_item.id,
            schools = input.school_allocations.len(),
            rows = menu_item.allocations.len(),
            "菜单项创建成功"
        );

        self.publish(MenuItemEventType::Created, menu_plan_id, menu_item.id, menu_item.date);
        Ok(menu_item)
    }

    /// 整体替换菜单项及其分配（非合并）
    ///
    /// # 流程
    /// 1. 只读预检：加载菜单项（不存在 → NotFound），按学校当前类别校验新输入
    /// 2. 开启写事务并复核上述两项（失败时旧分配行保持不变）
    /// 3. 删除旧分配行 → 更新菜单项字段 → 展开并写入新分配行
    pub fn update_menu_item_with_allocations(
        &self,
        menu_item_id: i64,
        input: &MenuItemInput,
    ) -> ApiResult<MenuItem> {
        const OP: &str = "update_menu_item_with_allocations";
        let _perf = PerfGuard::new(OP);

        let mut conn = self.lock_conn(OP)?;
        let precheck = self
            .find_existing(&conn, menu_item_id, OP)
            .and_then(|_| self.precheck(&conn, input, OP));
        self.log_outcome(OP, precheck)?;

        let result = run_in_transaction(&mut conn, |tx| -> ApiResult<MenuItem> {
            let existing = self.find_existing(tx, menu_item_id, OP)?;

            let schools = self.load_schools(tx, input, OP)?;
            self.validate(input, &schools)?;

            if !self.store.recipe_exists(tx, input.recipe_id).op(OP, "recipe")? {
                return Err(ApiError::not_found("recipe_id", input.recipe_id));
            }

            let removed = self
                .store
                .delete_allocations_by_menu_item(tx, menu_item_id)
                .op(OP, "menu_item_school_allocation")?;

            self.store
                .update_menu_item(tx, menu_item_id, input.date, input.recipe_id, input.portions)
                .op(OP, "menu_item")?;

            let inserted = self.write_allocations(tx, menu_item_id, input, &schools, OP)?;

            let log = self.action_log(
                ActionType::UpdateMenuItem,
                existing.menu_plan_id,
                menu_item_id,
                input,
            );
            insert_action_log(tx, &log).op(OP, "action_log")?;

            tracing::debug!(menu_item_id, removed, inserted, "分配行已整体替换");
            self.load_menu_item(tx, menu_item_id, OP)
        });
        drop(conn);

        let menu_item = self.log_outcome(OP, result)?;
        tracing::info!(
            menu_item_id,
            schools = input.school_allocations.len(),
            rows = menu_item.allocations.len(),
            "菜单项更新成功"
        );

        self.publish(
            MenuItemEventType::Updated,
            menu_item.menu_plan_id,
            menu_item.id,
            menu_item.date,
        );
        Ok(menu_item)
    }

    /// 删除菜单项（同一事务内先清理分配行）
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 菜单项不存在或不属于该菜单计划，未删除任何数据
    pub fn delete_menu_item(&self, menu_plan_id: i64, menu_item_id: i64) -> ApiResult<()> {
        const OP: &str = "delete_menu_item";
        let _perf = PerfGuard::new(OP);

        let mut conn = self.lock_conn(OP)?;
        let result = run_in_transaction(&mut conn, |tx| -> ApiResult<(MenuItem, usize)> {
            let existing = self
                .store
                .find_menu_item(tx, menu_item_id)
                .op(OP, "menu_item")?
                .filter(|item| item.menu_plan_id == menu_plan_id)
                .ok_or_else(|| ApiError::not_found("menu_item_id", menu_item_id))?;

            // 显式清理分配行，不依赖外键级联
            let removed = self
                .store
                .delete_allocations_by_menu_item(tx, menu_item_id)
                .op(OP, "menu_item_school_allocation")?;

            let deleted = self.store.delete_menu_item(tx, menu_item_id).op(OP, "menu_item")?;
            if deleted == 0 {
                return Err(ApiError::not_found("menu_item_id", menu_item_id));
            }

            let log = ActionLog::new(ActionType::DeleteMenuItem, &self.actor)
                .with_menu_item(menu_plan_id, menu_item_id)
                .with_date(existing.date)
                .with_payload(&json!({
                    "menu_plan_id": menu_plan_id,
                    "menu_item_id": menu_item_id,
                    "portions": existing.portions,
                    "removed_allocations": removed,
                }))
                .with_detail(format!("删除菜单项 {}，清理分配行 {} 条", menu_item_id, removed));
            insert_action_log(tx, &log).op(OP, "action_log")?;

            Ok((existing, removed))
        });
        drop(conn);

        let (existing, removed) = self.log_outcome(OP, result)?;
        tracing::info!(menu_plan_id, menu_item_id, removed, "菜单项删除成功");

        self.publish(MenuItemEventType::Deleted, menu_plan_id, menu_item_id, existing.date);
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询菜单项及其分配行（平铺视图）
    ///
    /// # 返回
    /// - Ok(MenuItem): 无分配行时 allocations 为空
    /// - Err(ApiError::NotFound): 菜单项不存在
    pub fn get_menu_item_with_allocations(&self, menu_item_id: i64) -> ApiResult<MenuItem> {
        const OP: &str = "get_menu_item_with_allocations";
        let _perf = PerfGuard::new(OP);

        let conn = self.lock_conn(OP)?;
        self.load_menu_item(&conn, menu_item_id, OP)
    }

    /// 查询某日全部分配行（预加载学校、菜单项、菜谱）
    pub fn get_allocations_by_date(&self, date: NaiveDate) -> ApiResult<Vec<Allocation>> {
        const OP: &str = "get_allocations_by_date";
        let _perf = PerfGuard::new(OP);

        let conn = self.lock_conn(OP)?;
        let rows = self
            .store
            .query_by_date(&conn, date)
            .op(OP, "menu_item_school_allocation")?;

        tracing::debug!(%date, rows = rows.len(), "按日期查询分配行");
        Ok(rows)
    }

    /// 按学校分组的分配视图
    ///
    /// 菜单项不存在或无分配行时返回空列表（不报错）
    pub fn get_school_allocations_with_portion_sizes(
        &self,
        menu_item_id: i64,
    ) -> ApiResult<Vec<SchoolAllocationDisplay>> {
        const OP: &str = "get_school_allocations_with_portion_sizes";
        let _perf = PerfGuard::new(OP);

        let rows = {
            let conn = self.lock_conn(OP)?;
            self.store
                .query_by_menu_item(&conn, menu_item_id)
                .op(OP, "menu_item_school_allocation")?
        };

        Ok(AllocationGrouper::new(&self.policies).group(&rows))
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn load_schools(
        &self,
        conn: &Connection,
        input: &MenuItemInput,
        operation: &str,
    ) -> ApiResult<HashMap<i64, School>> {
        let ids: Vec<i64> = input.school_allocations.iter().map(|a| a.school_id).collect();
        self.store.find_schools(conn, &ids).op(operation, "school")
    }

    fn find_existing(&self, conn: &Connection, menu_item_id: i64, operation: &str) -> ApiResult<MenuItem> {
        self.store
            .find_menu_item(conn, menu_item_id)
            .op(operation, "menu_item")?
            .ok_or_else(|| ApiError::not_found("menu_item_id", menu_item_id))
    }

    /// 开启写事务之前的只读校验（不占写锁）
    fn precheck(&self, conn: &Connection, input: &MenuItemInput, operation: &str) -> ApiResult<()> {
        let schools = self.load_schools(conn, input, operation)?;
        self.validate(input, &schools)
    }

    fn validate(&self, input: &MenuItemInput, schools: &HashMap<i64, School>) -> ApiResult<()> {
        let categories: HashMap<i64, SchoolCategory> =
            schools.iter().map(|(id, s)| (*id, s.category)).collect();

        AllocationValidator::new(&self.policies)
            .validate(input.portions, &input.school_allocations, &categories)
            .map_err(ApiError::from)
    }

    fn write_allocations(
        &self,
        conn: &Connection,
        menu_item_id: i64,
        input: &MenuItemInput,
        schools: &HashMap<i64, School>,
        operation: &str,
    ) -> ApiResult<usize> {
        let rows = AllocationExpander::new(&self.policies).expand(
            menu_item_id,
            input.date,
            &input.school_allocations,
            schools,
        )?;

        self.store
            .insert_allocations(conn, &rows)
            .op(operation, "menu_item_school_allocation")
    }

    fn load_menu_item(&self, conn: &Connection, menu_item_id: i64, operation: &str) -> ApiResult<MenuItem> {
        let mut menu_item = self
            .store
            .find_menu_item(conn, menu_item_id)
            .op(operation, "menu_item")?
            .ok_or_else(|| ApiError::not_found("menu_item_id", menu_item_id))?;

        menu_item.allocations = self
            .store
            .query_by_menu_item(conn, menu_item_id)
            .op(operation, "menu_item_school_allocation")?;

        Ok(menu_item)
    }

    fn action_log(
        &self,
        action_type: ActionType,
        menu_plan_id: i64,
        menu_item_id: i64,
        input: &MenuItemInput,
    ) -> ActionLog {
        ActionLog::new(action_type, &self.actor)
            .with_menu_item(menu_plan_id, menu_item_id)
            .with_date(input.date)
            .with_payload(&json!({
                "menu_plan_id": menu_plan_id,
                "menu_item_id": menu_item_id,
                "recipe_id": input.recipe_id,
                "portions": input.portions,
                "school_allocations": input.school_allocations,
            }))
            .with_detail(format!(
                "{} 菜单项 {}：{} 个学校，共 {} 份",
                action_type.as_str(),
                menu_item_id,
                input.school_allocations.len(),
                input.portions
            ))
    }

    fn log_outcome<T>(&self, operation: &str, result: ApiResult<T>) -> ApiResult<T> {
        if let Err(e) = &result {
            if e.is_validation() {
                tracing::warn!(operation, error = %e, "分配校验未通过");
            } else {
                tracing::warn!(operation, error = %e, "操作失败，未提交任何修改");
            }
        }
        result
    }

    /// 事务提交后发布事件；失败只记录告警
    fn publish(&self, event_type: MenuItemEventType, menu_plan_id: i64, menu_item_id: i64, date: NaiveDate) {
        let event = MenuItemEvent::new(event_type, menu_plan_id, menu_item_id, date);
        match self.event_publisher.publish(event) {
            Ok(receipt) => {
                if !receipt.is_empty() {
                    tracing::info!(
                        "菜单项变更事件已发布: receipt={}, menu_item_id={}",
                        receipt,
                        menu_item_id
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    "菜单项变更事件发布失败: menu_item_id={}, event_type={}, error={}",
                    menu_item_id,
                    event_type.as_str(),
                    e
                );
            }
        }
    }
}
