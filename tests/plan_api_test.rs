// ==========================================
// 周计划API集成测试
// ==========================================
// 测试范围:
// 1. Apply 落库与重复 Apply 的幂等性
// 2. 已发布计划保护与状态机校验
// 3. 封锁工作日校验、重叠设置边界拒绝
// 4. 人工排班编辑与 Not-Found 语义
// 全部在临时 SQLite 数据库上运行
// ==========================================

mod test_helpers;

use clinic_weekplan::app::AppState;
use clinic_weekplan::config::rule_profile::RuleProfileInput;
use clinic_weekplan::db::open_sqlite_connection;
use clinic_weekplan::domain::types::{PlanStatus, Recurrence};
use clinic_weekplan::repository::WeeklyPlanRepository;
use clinic_weekplan::ApiError;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use test_helpers::*;

// ==========================================
// 测试辅助
// ==========================================

fn setup() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().expect("创建测试数据库失败");
    let state = AppState::new(db_path).expect("初始化AppState失败");
    (temp_file, state)
}

/// 基础场景: 一个周一开放的工作点 + 一名员工
fn seed_basic(state: &AppState) -> (i64, i64) {
    let workplace_id = state
        .workplace_repo
        .create(&make_workplace(0, "B超室"))
        .expect("创建工作点失败");
    state
        .workplace_repo
        .create_weekday_setting(&make_setting(workplace_id, 1, Recurrence::Weekly, false))
        .expect("创建逐工作日设置失败");
    let employee_id = state
        .employee_repo
        .create(&make_employee(0, "Anna", "Anderson"))
        .expect("创建员工失败");
    (workplace_id, employee_id)
}

/// 关闭周值班保障的规则档案
fn relaxed_profile() -> RuleProfileInput {
    RuleProfileInput {
        require_duty_coverage: Some(false),
        ..Default::default()
    }
}

// ==========================================
// Apply 幂等与落库
// ==========================================

#[tokio::test]
async fn test_apply_inserts_once_and_reapply_inserts_zero() {
    let (_tmp, state) = setup();
    let (workplace_id, employee_id) = seed_basic(&state);

    // 第一次 Apply: 生成并落库一条
    let first = state
        .plan_api
        .apply_week(2026, 10, Some(relaxed_profile()))
        .await
        .expect("apply 失败");
    assert_eq!(first.applied_count, 1);
    assert_eq!(first.result.stats.generated_assignments, 1);

    let assignments = state.plan_api.list_assignments(2026, 10).expect("查询失败");
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].workplace_id, workplace_id);
    assert_eq!(assignments[0].employee_id, Some(employee_id));

    // 第二次 Apply: 槽位已被占用,零插入
    let second = state
        .plan_api
        .apply_week(2026, 10, Some(relaxed_profile()))
        .await
        .expect("二次 apply 失败");
    assert_eq!(second.applied_count, 0);
    assert_eq!(second.result.stats.generated_assignments, 0);
    assert_eq!(second.result.stats.existing_assignments, 1);

    let assignments = state.plan_api.list_assignments(2026, 10).expect("查询失败");
    assert_eq!(assignments.len(), 1);
}

#[tokio::test]
async fn test_apply_refused_on_released_plan() {
    let (_tmp, state) = setup();
    seed_basic(&state);

    state.plan_api.get_or_create_plan(2026, 10).expect("创建计划失败");
    state
        .plan_api
        .set_plan_status(2026, 10, PlanStatus::Released)
        .expect("发布失败");

    let err = state
        .plan_api
        .apply_week(2026, 10, Some(relaxed_profile()))
        .await
        .expect_err("已发布计划上的 apply 应被拒绝");
    assert!(matches!(err, ApiError::ReleasedPlanProtected(_)));

    // 拒绝即零写入
    let assignments = state.plan_api.list_assignments(2026, 10).expect("查询失败");
    assert!(assignments.is_empty());
}

#[tokio::test]
async fn test_preview_never_persists_anything() {
    let (_tmp, state) = setup();
    seed_basic(&state);
    let db_path = state.db_path.clone();

    let result = state
        .plan_api
        .preview_week(2026, 10, Some(relaxed_profile()))
        .await
        .expect("preview 失败");
    assert_eq!(result.stats.generated_assignments, 1);

    // 计划与排班都未落库
    let conn = Arc::new(Mutex::new(
        open_sqlite_connection(&db_path).expect("打开数据库失败"),
    ));
    let plan_repo = WeeklyPlanRepository::new(conn);
    assert!(plan_repo.find_by_week(2026, 10).expect("查询失败").is_none());
}

// ==========================================
// 状态机
// ==========================================

#[tokio::test]
async fn test_plan_status_state_machine() {
    let (_tmp, state) = setup();

    let plan = state.plan_api.get_or_create_plan(2026, 10).expect("创建失败");
    assert_eq!(plan.status, PlanStatus::Draft);

    // DRAFT -> PREVIEW -> DRAFT -> RELEASED -> DRAFT
    let plan = state
        .plan_api
        .set_plan_status(2026, 10, PlanStatus::Preview)
        .expect("DRAFT->PREVIEW 应合法");
    assert_eq!(plan.status, PlanStatus::Preview);

    state
        .plan_api
        .set_plan_status(2026, 10, PlanStatus::Draft)
        .expect("PREVIEW->DRAFT 应合法");
    state
        .plan_api
        .set_plan_status(2026, 10, PlanStatus::Released)
        .expect("DRAFT->RELEASED 应合法");

    // RELEASED -> PREVIEW 非法,错误需点名允许的目标
    let err = state
        .plan_api
        .set_plan_status(2026, 10, PlanStatus::Preview)
        .expect_err("RELEASED->PREVIEW 应非法");
    match err {
        ApiError::InvalidStateTransition { from, to, allowed } => {
            assert_eq!(from, "RELEASED");
            assert_eq!(to, "PREVIEW");
            assert!(allowed.contains("DRAFT"));
        }
        other => panic!("期望 InvalidStateTransition,实际 {:?}", other),
    }

    state
        .plan_api
        .set_plan_status(2026, 10, PlanStatus::Draft)
        .expect("RELEASED->DRAFT 应合法");
}

#[tokio::test]
async fn test_status_on_missing_plan_is_not_found() {
    let (_tmp, state) = setup();

    let err = state
        .plan_api
        .set_plan_status(2026, 10, PlanStatus::Preview)
        .expect_err("计划不存在应报 NotFound");
    assert!(matches!(err, ApiError::NotFound(_)));
}

// ==========================================
// 封锁工作日
// ==========================================

#[tokio::test]
async fn test_locked_weekdays_validated_and_normalized() {
    let (_tmp, state) = setup();

    // 越界工作日被拒
    let err = state
        .plan_api
        .set_locked_weekdays(2026, 10, vec![8])
        .expect_err("工作日 8 应被拒绝");
    assert!(matches!(err, ApiError::ValidationError(_)));

    // 去重排序后存储
    let plan = state
        .plan_api
        .set_locked_weekdays(2026, 10, vec![3, 3, 1])
        .expect("更新失败");
    assert_eq!(plan.locked_weekdays, vec![1, 3]);

    let reloaded = state.plan_api.get_or_create_plan(2026, 10).expect("查询失败");
    assert_eq!(reloaded.locked_weekdays, vec![1, 3]);
}

#[tokio::test]
async fn test_locked_weekday_suppresses_generation() {
    let (_tmp, state) = setup();
    seed_basic(&state); // 仅周一有设置

    state
        .plan_api
        .set_locked_weekdays(2026, 10, vec![1])
        .expect("更新失败");

    let outcome = state
        .plan_api
        .apply_week(2026, 10, Some(relaxed_profile()))
        .await
        .expect("apply 失败");
    assert_eq!(outcome.applied_count, 0);
    assert_eq!(outcome.result.stats.generated_assignments, 0);
    assert_eq!(outcome.result.stats.unfilled_slots, 0);
}

// ==========================================
// 配置边界
// ==========================================

#[tokio::test]
async fn test_overlapping_weekday_settings_rejected_at_boundary() {
    let (_tmp, state) = setup();
    let (workplace_id, _) = seed_basic(&state);

    // 同一 (工作点, 工作日) 的第二条设置: 配置错误
    state
        .workplace_repo
        .create_weekday_setting(&make_setting(
            workplace_id,
            1,
            Recurrence::FirstOnly,
            false,
        ))
        .expect("创建设置失败");

    let err = state
        .plan_api
        .preview_week(2026, 10, Some(relaxed_profile()))
        .await
        .expect_err("重叠设置应在边界被拒");
    assert!(matches!(err, ApiError::ValidationError(_)));
}

#[tokio::test]
async fn test_stored_default_profile_feeds_generation() {
    let (_tmp, state) = setup();
    seed_basic(&state);

    // 持久化默认档案关闭值班保障
    state
        .config
        .save_default_rule_profile(&relaxed_profile())
        .expect("写入默认档案失败");

    let result = state
        .plan_api
        .preview_week(2026, 10, None)
        .await
        .expect("preview 失败");
    assert!(!result.profile.require_duty_coverage);
    assert!(result.publish_allowed);
    assert_eq!(result.stats.generated_assignments, 1);
}

// ==========================================
// 人工编辑
// ==========================================

#[tokio::test]
async fn test_manual_assignment_crud_and_not_found() {
    let (_tmp, state) = setup();
    let (workplace_id, employee_id) = seed_basic(&state);

    // 引用不存在的工作点
    let err = state
        .plan_api
        .create_manual_assignment(2026, 10, 1, 9999, None, None, true)
        .expect_err("未知工作点应报 NotFound");
    assert!(matches!(err, ApiError::NotFound(_)));

    // 引用不存在的员工
    let err = state
        .plan_api
        .create_manual_assignment(2026, 10, 1, workplace_id, Some(9999), None, false)
        .expect_err("未知员工应报 NotFound");
    assert!(matches!(err, ApiError::NotFound(_)));

    // 正常创建 + 查询 + 删除
    let assignment = state
        .plan_api
        .create_manual_assignment(
            2026,
            10,
            1,
            workplace_id,
            Some(employee_id),
            Some("早班".to_string()),
            false,
        )
        .expect("创建失败");

    let listed = state.plan_api.list_assignments(2026, 10).expect("查询失败");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].assignment_id, assignment.assignment_id);
    assert_eq!(listed[0].label.as_deref(), Some("早班"));

    state
        .plan_api
        .delete_assignment(&assignment.assignment_id)
        .expect("删除失败");
    let err = state
        .plan_api
        .delete_assignment(&assignment.assignment_id)
        .expect_err("二次删除应报 NotFound");
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_manual_block_respected_by_apply() {
    let (_tmp, state) = setup();
    let (workplace_id, _) = seed_basic(&state);

    // 人工封锁周一槽位 (无人员)
    state
        .plan_api
        .create_manual_assignment(2026, 10, 1, workplace_id, None, None, true)
        .expect("封锁失败");

    let outcome = state
        .plan_api
        .apply_week(2026, 10, Some(relaxed_profile()))
        .await
        .expect("apply 失败");

    // 封锁槽位不被填充: 报 LOCKED_EMPTY 且不阻断发布
    assert_eq!(outcome.applied_count, 0);
    assert_eq!(outcome.result.stats.unfilled_slots, 1);
    assert!(outcome.result.publish_allowed);
}

#[tokio::test]
async fn test_invalid_week_rejected() {
    let (_tmp, state) = setup();

    let err = state
        .plan_api
        .preview_week(2026, 54, None)
        .await
        .expect_err("周号 54 应被拒绝");
    assert!(matches!(err, ApiError::InvalidInput(_)));
}
