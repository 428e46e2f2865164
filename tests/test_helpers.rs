#![allow(dead_code)]

// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、领域对象构造等功能
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, Utc};
use clinic_weekplan::domain::types::{
    AbsenceStatus, AssignmentKind, CompetencyRelation, PlanStatus, Recurrence, RoleCategory,
};
use clinic_weekplan::domain::{
    Employee, LongTermAbsence, PlannedAbsence, RequiredCompetency, RosterShift, WeekdaySetting,
    WeeklyPlan, WeeklyPlanAssignment, Workplace,
};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库文件
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();
    Ok((temp_file, db_path))
}

/// 测试时间戳
pub fn ts() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// 日期简写
pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// ==========================================
// 领域对象构造
// ==========================================

/// 创建测试工作点 (不限角色)
pub fn make_workplace(id: i64, name: &str) -> Workplace {
    Workplace {
        workplace_id: id,
        name: name.to_string(),
        in_weekly_plan: true,
        active: true,
        required_roles: vec![],
        alternative_roles: vec![],
        created_at: ts(),
        updated_at: ts(),
    }
}

/// 创建逐工作日设置
pub fn make_setting(
    workplace_id: i64,
    weekday: u32,
    recurrence: Recurrence,
    closed: bool,
) -> WeekdaySetting {
    WeekdaySetting {
        setting_id: 0,
        workplace_id,
        weekday,
        recurrence,
        closed,
        closed_reason: None,
        usage_label: None,
        start_time: None,
        end_time: None,
    }
}

/// 创建工作点资质要求
pub fn make_competency(
    workplace_id: i64,
    competency: &str,
    relation: CompetencyRelation,
) -> RequiredCompetency {
    RequiredCompetency {
        competency_id: 0,
        workplace_id,
        competency: competency.to_string(),
        relation,
    }
}

/// 创建测试员工 (护理角色,无资质)
pub fn make_employee(id: i64, first: &str, last: &str) -> Employee {
    Employee {
        employee_id: id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        role_category: RoleCategory::Nursing,
        competencies: vec![],
        active: true,
        inactive_from: None,
        inactive_until: None,
        created_at: ts(),
        updated_at: ts(),
    }
}

/// 创建计划缺勤
pub fn make_planned_absence(
    employee_id: i64,
    from: NaiveDate,
    to: NaiveDate,
    status: AbsenceStatus,
) -> PlannedAbsence {
    PlannedAbsence {
        absence_id: 0,
        employee_id,
        from_date: from,
        to_date: to,
        status,
    }
}

/// 创建长期缺勤
pub fn make_long_term_absence(
    employee_id: i64,
    from: NaiveDate,
    to: NaiveDate,
    status: AbsenceStatus,
) -> LongTermAbsence {
    LongTermAbsence {
        absence_id: 0,
        employee_id,
        from_date: from,
        to_date: to,
        status,
    }
}

/// 创建值班记录
pub fn make_roster_shift(employee_id: i64, date: NaiveDate, overduty: bool) -> RosterShift {
    RosterShift {
        shift_id: 0,
        employee_id,
        shift_date: date,
        overduty,
        shift_label: None,
    }
}

/// 创建周计划
pub fn make_plan(year: i32, week: u32, locked_weekdays: Vec<u32>) -> WeeklyPlan {
    WeeklyPlan {
        plan_id: "TEST-PLAN".to_string(),
        year,
        week,
        status: PlanStatus::Draft,
        locked_weekdays,
        created_at: ts(),
        updated_at: ts(),
    }
}

/// 创建既有排班记录
pub fn make_assignment(
    plan_id: &str,
    weekday: u32,
    workplace_id: i64,
    employee_id: Option<i64>,
    blocked: bool,
) -> WeeklyPlanAssignment {
    WeeklyPlanAssignment {
        assignment_id: format!("A-{}-{}", weekday, workplace_id),
        plan_id: plan_id.to_string(),
        weekday,
        workplace_id,
        employee_id,
        label: None,
        blocked,
        kind: AssignmentKind::Manual,
        created_at: ts(),
        updated_at: ts(),
    }
}
