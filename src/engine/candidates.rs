// ==========================================
// 医院周排班系统 - 候选评估引擎
// ==========================================
// 职责: 对每个 (槽位, 员工) 对判定硬排除原因,
//       对幸存者计算优先级得分
// 红线: 排除原因逐条累积,不做首中即止 ——
//       诊断必须解释所有阻断因素
// ==========================================

use crate::config::rule_profile::RuleProfile;
use crate::domain::employee::{normalize_tag, Employee, LongTermAbsence, PlannedAbsence, RosterShift};
use crate::domain::plan::WeeklyPlanAssignment;
use crate::domain::types::{CompetencyRelation, ExclusionReason};
use crate::domain::workplace::{RequiredCompetency, Workplace};
use chrono::{Days, NaiveDate};
use std::collections::{HashMap, HashSet};

// ==========================================
// 得分常量
// ==========================================

/// 优先工作点得分 (第1/2/3优先)
pub const PRIORITY_AREA_SCORES: [i32; 3] = [300, 200, 100];
/// 未列入优先列表的保底得分
pub const NO_MATCH_SCORE: i32 = 10;
/// 每条已有排班的负载均衡惩罚
pub const ASSIGNED_LOAD_PENALTY: i32 = 15;

// ==========================================
// SlotContext - 单槽位评估上下文
// ==========================================
pub struct SlotContext<'a> {
    pub date: NaiveDate,
    pub weekday: u32,
    pub workplace: &'a Workplace,
    /// 该工作点的资质要求
    pub competencies: &'a [&'a RequiredCompetency],
}

// ==========================================
// EmployeeAvailability - 单员工可用性记录
// ==========================================
#[derive(Default)]
pub struct EmployeeAvailability<'a> {
    pub planned_absences: Vec<&'a PlannedAbsence>,
    pub long_term_absences: Vec<&'a LongTermAbsence>,
    pub roster_shifts: Vec<&'a RosterShift>,
}

/// 按员工分组可用性记录 (每次运行构建一次)
pub fn index_availability<'a>(
    planned: &'a [PlannedAbsence],
    long_term: &'a [LongTermAbsence],
    shifts: &'a [RosterShift],
) -> HashMap<i64, EmployeeAvailability<'a>> {
    let mut index: HashMap<i64, EmployeeAvailability<'a>> = HashMap::new();
    for absence in planned {
        index
            .entry(absence.employee_id)
            .or_default()
            .planned_absences
            .push(absence);
    }
    for absence in long_term {
        index
            .entry(absence.employee_id)
            .or_default()
            .long_term_absences
            .push(absence);
    }
    for shift in shifts {
        index
            .entry(shift.employee_id)
            .or_default()
            .roster_shifts
            .push(shift);
    }
    index
}

// ==========================================
// RunLedger - 运行台账
// ==========================================
// 同时间互斥与负载惩罚在整个运行内传递生效:
// 既有排班与本次已生成的排班一并计入
#[derive(Debug, Default)]
pub struct RunLedger {
    assigned_by_weekday: HashMap<u32, HashSet<i64>>,
    assigned_count: HashMap<i64, usize>,
}

impl RunLedger {
    /// 以既有排班记录为底播种台账
    pub fn seed_existing(existing: &[WeeklyPlanAssignment]) -> Self {
        let mut ledger = Self::default();
        for assignment in existing {
            if let Some(employee_id) = assignment.employee_id {
                ledger.record(assignment.weekday, employee_id);
            }
        }
        ledger
    }

    /// 记录一条排班 (既有或本次生成)
    pub fn record(&mut self, weekday: u32, employee_id: i64) {
        self.assigned_by_weekday
            .entry(weekday)
            .or_default()
            .insert(employee_id);
        *self.assigned_count.entry(employee_id).or_insert(0) += 1;
    }

    /// 员工当日是否已有排班
    pub fn is_assigned_on(&self, weekday: u32, employee_id: i64) -> bool {
        self.assigned_by_weekday
            .get(&weekday)
            .map(|ids| ids.contains(&employee_id))
            .unwrap_or(false)
    }

    /// 员工本周累计排班数 (既有 + 本次)
    pub fn assigned_count(&self, employee_id: i64) -> usize {
        self.assigned_count.get(&employee_id).copied().unwrap_or(0)
    }
}

// ==========================================
// CandidateEvaluator - 候选评估引擎
// ==========================================
pub struct CandidateEvaluator {
    // 无状态引擎,不需要注入依赖
}

impl CandidateEvaluator {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 判定员工在槽位上的全部排除原因; 空集即为合格候选
    pub fn exclusion_reasons(
        &self,
        employee: &Employee,
        slot: &SlotContext<'_>,
        profile: &RuleProfile,
        ledger: &RunLedger,
        availability: &EmployeeAvailability<'_>,
    ) -> Vec<ExclusionReason> {
        let mut reasons = Vec::new();

        // 禁排工作点: 无条件硬排除,与优先级无关
        if profile.is_forbidden(employee.employee_id, slot.workplace.workplace_id) {
            reasons.push(ExclusionReason::ForbiddenArea);
        }

        // 同一工作日已有排班 (既有或本次已生成)
        if ledger.is_assigned_on(slot.weekday, employee.employee_id) {
            reasons.push(ExclusionReason::AlreadyAssignedSameTime);
        }

        // 计划缺勤: 未驳回即阻断
        if profile.block_absence
            && availability
                .planned_absences
                .iter()
                .any(|a| a.blocks(slot.date))
        {
            reasons.push(ExclusionReason::AbsenceBlocked);
        }

        // 长期缺勤: 仅批准后阻断
        if profile.block_long_term_absence
            && availability
                .long_term_absences
                .iter()
                .any(|a| a.blocks(slot.date))
        {
            reasons.push(ExclusionReason::LongTermAbsenceBlocked);
        }

        // 前一日值过班 (加值班不计)
        if profile.block_after_duty {
            if let Some(day_before) = slot.date.checked_sub_days(Days::new(1)) {
                if availability
                    .roster_shifts
                    .iter()
                    .any(|s| !s.overduty && s.shift_date == day_before)
                {
                    reasons.push(ExclusionReason::AfterDutyBlocked);
                }
            }
        }

        // 角色不满足
        if !slot.workplace.role_satisfied_by(employee.role_category) {
            reasons.push(ExclusionReason::MissingRequiredRole);
        }

        // 资质不满足: AND 全部必备, OR 至少其一
        if !competencies_satisfied(employee, slot.competencies) {
            reasons.push(ExclusionReason::MissingRequiredSkill);
        }

        // 旧制停用窗口
        if employee.is_inactive_on(slot.date) {
            reasons.push(ExclusionReason::EmployeeInactive);
        }

        reasons
    }

    /// 优先级得分: 300/200/100 对应第1/2/3优先工作点,未列入为保底 10
    pub fn priority_score(
        &self,
        profile: &RuleProfile,
        employee_id: i64,
        workplace_id: i64,
    ) -> i32 {
        match profile.priority_rank(employee_id, workplace_id) {
            Some(rank) => PRIORITY_AREA_SCORES
                .get(rank)
                .copied()
                .unwrap_or(NO_MATCH_SCORE),
            None => NO_MATCH_SCORE,
        }
    }

    /// 最终得分 = 优先级得分 - 已排数 × 负载惩罚
    pub fn score(&self, priority_score: i32, assigned_count: usize) -> i32 {
        priority_score - (assigned_count as i32) * ASSIGNED_LOAD_PENALTY
    }
}

impl Default for CandidateEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

/// 判断员工是否满足工作点资质要求
fn competencies_satisfied(employee: &Employee, competencies: &[&RequiredCompetency]) -> bool {
    let held: HashSet<String> = employee.competencies.iter().map(|c| normalize_tag(c)).collect();

    // AND: 全部必备
    let and_ok = competencies
        .iter()
        .filter(|c| c.relation == CompetencyRelation::And)
        .all(|c| held.contains(&normalize_tag(&c.competency)));

    // OR: 存在即要求至少命中其一
    let or_requirements: Vec<_> = competencies
        .iter()
        .filter(|c| c.relation == CompetencyRelation::Or)
        .collect();
    let or_ok = or_requirements.is_empty()
        || or_requirements
            .iter()
            .any(|c| held.contains(&normalize_tag(&c.competency)));

    and_ok && or_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::rule_profile::{EmployeeAreaRule, RuleProfileInput};
    use crate::domain::types::{AbsenceStatus, AssignmentKind, RoleCategory};
    use chrono::NaiveDateTime;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn ts() -> NaiveDateTime {
        d(2026, 1, 1).and_hms_opt(0, 0, 0).unwrap()
    }

    fn employee(id: i64, role: RoleCategory, competencies: Vec<&str>) -> Employee {
        Employee {
            employee_id: id,
            first_name: "Anna".to_string(),
            last_name: "Anderson".to_string(),
            role_category: role,
            competencies: competencies.into_iter().map(String::from).collect(),
            active: true,
            inactive_from: None,
            inactive_until: None,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn workplace(id: i64, required: Vec<RoleCategory>) -> Workplace {
        Workplace {
            workplace_id: id,
            name: format!("工作点{}", id),
            in_weekly_plan: true,
            active: true,
            required_roles: required,
            alternative_roles: vec![],
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn slot<'a>(
        workplace: &'a Workplace,
        competencies: &'a [&'a RequiredCompetency],
    ) -> SlotContext<'a> {
        SlotContext {
            date: d(2026, 3, 3),
            weekday: 2,
            workplace,
            competencies,
        }
    }

    fn profile_with_rules(rules: Vec<EmployeeAreaRule>) -> RuleProfile {
        RuleProfile {
            employee_rules: rules,
            ..crate::config::rule_profile::normalize(RuleProfileInput::default())
        }
    }

    #[test]
    fn test_reasons_accumulate_not_first_match() {
        let wp = workplace(1, vec![RoleCategory::Physician]);
        let comp = RequiredCompetency {
            competency_id: 1,
            workplace_id: 1,
            competency: "Sonographie".to_string(),
            relation: CompetencyRelation::And,
        };
        let comps: Vec<&RequiredCompetency> = vec![&comp];
        let e = employee(5, RoleCategory::Nursing, vec![]);

        let profile = profile_with_rules(vec![EmployeeAreaRule {
            employee_id: 5,
            priority_areas: vec![],
            forbidden_areas: vec![1],
        }]);

        let reasons = CandidateEvaluator::new().exclusion_reasons(
            &e,
            &slot(&wp, &comps),
            &profile,
            &RunLedger::default(),
            &EmployeeAvailability::default(),
        );

        // 三条原因全部在列,不做首中即止
        assert!(reasons.contains(&ExclusionReason::ForbiddenArea));
        assert!(reasons.contains(&ExclusionReason::MissingRequiredRole));
        assert!(reasons.contains(&ExclusionReason::MissingRequiredSkill));
        assert_eq!(reasons.len(), 3);
    }

    #[test]
    fn test_absence_rules_respect_profile_toggles() {
        let wp = workplace(1, vec![]);
        let comps: Vec<&RequiredCompetency> = vec![];
        let e = employee(5, RoleCategory::Nursing, vec![]);

        let planned = PlannedAbsence {
            absence_id: 1,
            employee_id: 5,
            from_date: d(2026, 3, 1),
            to_date: d(2026, 3, 5),
            status: AbsenceStatus::Requested,
        };
        let availability = EmployeeAvailability {
            planned_absences: vec![&planned],
            ..Default::default()
        };

        let enabled = profile_with_rules(vec![]);
        let reasons = CandidateEvaluator::new().exclusion_reasons(
            &e,
            &slot(&wp, &comps),
            &enabled,
            &RunLedger::default(),
            &availability,
        );
        assert_eq!(reasons, vec![ExclusionReason::AbsenceBlocked]);

        // 关闭开关后不再阻断
        let disabled = RuleProfile {
            block_absence: false,
            ..enabled
        };
        let reasons = CandidateEvaluator::new().exclusion_reasons(
            &e,
            &slot(&wp, &comps),
            &disabled,
            &RunLedger::default(),
            &availability,
        );
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_after_duty_ignores_overduty_shift() {
        let wp = workplace(1, vec![]);
        let comps: Vec<&RequiredCompetency> = vec![];
        let e = employee(5, RoleCategory::Nursing, vec![]);
        let profile = profile_with_rules(vec![]);

        // 槽位日期 2026-03-03,前一日 03-02
        let normal = RosterShift {
            shift_id: 1,
            employee_id: 5,
            shift_date: d(2026, 3, 2),
            overduty: false,
            shift_label: None,
        };
        let availability = EmployeeAvailability {
            roster_shifts: vec![&normal],
            ..Default::default()
        };
        let reasons = CandidateEvaluator::new().exclusion_reasons(
            &e,
            &slot(&wp, &comps),
            &profile,
            &RunLedger::default(),
            &availability,
        );
        assert_eq!(reasons, vec![ExclusionReason::AfterDutyBlocked]);

        // 加值班不触发
        let overduty = RosterShift {
            overduty: true,
            ..normal.clone()
        };
        let availability = EmployeeAvailability {
            roster_shifts: vec![&overduty],
            ..Default::default()
        };
        let reasons = CandidateEvaluator::new().exclusion_reasons(
            &e,
            &slot(&wp, &comps),
            &profile,
            &RunLedger::default(),
            &availability,
        );
        assert!(reasons.is_empty());
    }

    #[test]
    fn test_or_competencies_any_match_suffices() {
        let wp = workplace(1, vec![]);
        let c1 = RequiredCompetency {
            competency_id: 1,
            workplace_id: 1,
            competency: "EKG".to_string(),
            relation: CompetencyRelation::Or,
        };
        let c2 = RequiredCompetency {
            competency_id: 2,
            workplace_id: 1,
            competency: "Sonographie".to_string(),
            relation: CompetencyRelation::Or,
        };
        let comps: Vec<&RequiredCompetency> = vec![&c1, &c2];
        let profile = profile_with_rules(vec![]);

        let holder = employee(5, RoleCategory::Nursing, vec!["sonographie"]);
        let reasons = CandidateEvaluator::new().exclusion_reasons(
            &holder,
            &slot(&wp, &comps),
            &profile,
            &RunLedger::default(),
            &EmployeeAvailability::default(),
        );
        assert!(reasons.is_empty());

        let none = employee(6, RoleCategory::Nursing, vec!["Dialyse"]);
        let reasons = CandidateEvaluator::new().exclusion_reasons(
            &none,
            &slot(&wp, &comps),
            &profile,
            &RunLedger::default(),
            &EmployeeAvailability::default(),
        );
        assert_eq!(reasons, vec![ExclusionReason::MissingRequiredSkill]);
    }

    #[test]
    fn test_run_ledger_transitive_same_day_exclusion() {
        let mut ledger = RunLedger::default();
        ledger.record(2, 5);

        assert!(ledger.is_assigned_on(2, 5));
        assert!(!ledger.is_assigned_on(3, 5));
        assert_eq!(ledger.assigned_count(5), 1);

        ledger.record(3, 5);
        assert_eq!(ledger.assigned_count(5), 2);
    }

    #[test]
    fn test_ledger_seeded_from_existing_assignments() {
        let existing = vec![WeeklyPlanAssignment {
            assignment_id: "A".to_string(),
            plan_id: "P".to_string(),
            weekday: 1,
            workplace_id: 7,
            employee_id: Some(5),
            label: None,
            blocked: false,
            kind: AssignmentKind::Manual,
            created_at: ts(),
            updated_at: ts(),
        }];
        let ledger = RunLedger::seed_existing(&existing);
        assert!(ledger.is_assigned_on(1, 5));
        assert_eq!(ledger.assigned_count(5), 1);
    }

    #[test]
    fn test_scoring_formula() {
        let evaluator = CandidateEvaluator::new();
        let profile = profile_with_rules(vec![EmployeeAreaRule {
            employee_id: 5,
            priority_areas: vec![10, 20, 30],
            forbidden_areas: vec![],
        }]);

        assert_eq!(evaluator.priority_score(&profile, 5, 10), 300);
        assert_eq!(evaluator.priority_score(&profile, 5, 20), 200);
        assert_eq!(evaluator.priority_score(&profile, 5, 30), 100);
        assert_eq!(evaluator.priority_score(&profile, 5, 99), NO_MATCH_SCORE);
        assert_eq!(evaluator.priority_score(&profile, 6, 10), NO_MATCH_SCORE);

        assert_eq!(evaluator.score(300, 0), 300);
        assert_eq!(evaluator.score(300, 2), 270);
        assert_eq!(evaluator.score(NO_MATCH_SCORE, 1), -5);
    }
}
