// ==========================================
// 医院周排班系统 - 引擎编排器
// ==========================================
// 用途: 协调规则归一化、槽位枚举、候选评估、
//       选择与诊断聚合的执行顺序
// 红线: 整个计算是快照上的纯函数,不触碰存储;
//       落库与否由 API 层决定
// ==========================================

use crate::config::rule_config_trait::RuleConfigReader;
use crate::config::rule_profile::{self, RuleProfile, RuleProfileInput};
use crate::domain::employee::{Employee, LongTermAbsence, PlannedAbsence, RosterShift};
use crate::domain::plan::{WeeklyPlan, WeeklyPlanAssignment};
use crate::domain::types::{RoleCategory, SlotReason};
use crate::domain::workplace::{RequiredCompetency, WeekdaySetting, Workplace};
use crate::engine::candidates::{
    index_availability, CandidateEvaluator, EmployeeAvailability, RunLedger, SlotContext,
};
use crate::engine::diagnostics::{
    DiagnosticsCollector, GeneratedAssignment, PlanningMeta, PlanningResult, RuleViolation,
    UnfilledSlot,
};
use crate::engine::selector::{CandidateSelector, ScoredCandidate};
use crate::engine::slots::{SlotEnumerator, WeekBounds};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

// ==========================================
// PlanningSnapshot - 排班输入快照
// ==========================================
// 一次性批量装载,计算期间不再访问协作方
#[derive(Debug, Clone)]
pub struct PlanningSnapshot {
    pub plan: WeeklyPlan,
    pub workplaces: Vec<Workplace>,
    pub weekday_settings: Vec<WeekdaySetting>,
    pub required_competencies: Vec<RequiredCompetency>,
    pub employees: Vec<Employee>,
    pub planned_absences: Vec<PlannedAbsence>,
    pub long_term_absences: Vec<LongTermAbsence>,
    /// 目标周及其前一日的值班记录
    pub roster_shifts: Vec<RosterShift>,
    pub existing_assignments: Vec<WeeklyPlanAssignment>,
}

// ==========================================
// PlanningOrchestrator - 引擎编排器
// ==========================================
pub struct PlanningOrchestrator<C>
where
    C: RuleConfigReader,
{
    config: Arc<C>,
    slots: SlotEnumerator,
    evaluator: CandidateEvaluator,
    selector: CandidateSelector,
}

impl<C> PlanningOrchestrator<C>
where
    C: RuleConfigReader,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 配置读取器 (持久化默认规则档案来源)
    pub fn new(config: Arc<C>) -> Self {
        Self {
            config,
            slots: SlotEnumerator::new(),
            evaluator: CandidateEvaluator::new(),
            selector: CandidateSelector::new(),
        }
    }

    /// 解析规则档案: 调用方输入优先,否则读持久化默认值。
    /// 读配置失败不阻断生成,降级为全默认
    pub async fn resolve_profile(&self, input: Option<RuleProfileInput>) -> RuleProfile {
        let stored = if input.is_some() {
            None
        } else {
            match self.config.default_rule_profile().await {
                Ok(stored) => stored,
                Err(e) => {
                    warn!(error = %e, "读取默认规则档案失败,降级为全默认");
                    None
                }
            }
        };

        rule_profile::resolve(input, stored)
    }

    /// 执行完整周排班流程 (快照上的纯计算)
    ///
    /// # 参数
    /// - bounds: 目标周区间
    /// - snapshot: 输入快照
    /// - profile_input: 调用方规则档案 (可空)
    ///
    /// # 返回
    /// 排班运行结果 (含完整诊断)
    pub async fn run(
        &self,
        bounds: &WeekBounds,
        snapshot: &PlanningSnapshot,
        profile_input: Option<RuleProfileInput>,
    ) -> PlanningResult {
        info!(
            year = bounds.year,
            week = bounds.week,
            workplaces = snapshot.workplaces.len(),
            employees = snapshot.employees.len(),
            existing = snapshot.existing_assignments.len(),
            "开始执行周排班流程"
        );

        // ==========================================
        // 步骤1: 规则档案归一化
        // ==========================================
        let profile = self.resolve_profile(profile_input).await;

        let mut diagnostics = DiagnosticsCollector::new();

        // ==========================================
        // 步骤2: 周值班保障前置检查
        // ==========================================
        if profile.require_duty_coverage {
            let has_duty_shift = snapshot
                .roster_shifts
                .iter()
                .any(|s| !s.overduty && bounds.contains(s.shift_date));
            if !has_duty_shift {
                debug!("目标周无有效值班记录,记录硬违规");
                diagnostics.record_violation(RuleViolation::no_duty_plan(bounds.from, bounds.to));
            }
        }

        // ==========================================
        // 步骤3: 槽位枚举
        // ==========================================
        // 工作点按 (名称, ID) 排序 —— 槽位顺序的确定性来源
        let mut workplaces: Vec<&Workplace> = snapshot
            .workplaces
            .iter()
            .filter(|w| w.active && w.in_weekly_plan)
            .collect();
        workplaces.sort_by(|a, b| a.name.cmp(&b.name).then(a.workplace_id.cmp(&b.workplace_id)));
        let workplaces_owned: Vec<Workplace> = workplaces.into_iter().cloned().collect();

        let enumeration = self.slots.enumerate(
            bounds,
            &snapshot.plan.locked_weekdays,
            &workplaces_owned,
            &snapshot.weekday_settings,
            &snapshot.existing_assignments,
            profile.skip_closed_workplaces,
        );

        debug!(
            open_slots = enumeration.open_slots.len(),
            locked_empty = enumeration.locked_empty.len(),
            "槽位枚举完成"
        );

        for slot in enumeration.locked_empty {
            diagnostics.record_unfilled(slot);
        }

        // ==========================================
        // 步骤4: 候选评估与选择
        // ==========================================
        // 候选池: 启用且非行政文员,按 (姓, 名, ID) 排序
        let mut pool: Vec<&Employee> = snapshot
            .employees
            .iter()
            .filter(|e| e.active && e.role_category != RoleCategory::Clerical)
            .collect();
        pool.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then(a.first_name.cmp(&b.first_name))
                .then(a.employee_id.cmp(&b.employee_id))
        });

        let availability = index_availability(
            &snapshot.planned_absences,
            &snapshot.long_term_absences,
            &snapshot.roster_shifts,
        );
        let empty_availability = EmployeeAvailability::default();

        let mut competencies_by_workplace: HashMap<i64, Vec<&RequiredCompetency>> = HashMap::new();
        for competency in &snapshot.required_competencies {
            competencies_by_workplace
                .entry(competency.workplace_id)
                .or_default()
                .push(competency);
        }

        let workplace_by_id: HashMap<i64, &Workplace> = workplaces_owned
            .iter()
            .map(|w| (w.workplace_id, w))
            .collect();

        let mut ledger = RunLedger::seed_existing(&snapshot.existing_assignments);

        for open_slot in &enumeration.open_slots {
            let workplace = match workplace_by_id.get(&open_slot.workplace_id) {
                Some(w) => *w,
                None => continue,
            };
            let competencies = competencies_by_workplace
                .get(&open_slot.workplace_id)
                .map(Vec::as_slice)
                .unwrap_or(&[]);

            let slot_ctx = SlotContext {
                date: open_slot.date,
                weekday: open_slot.weekday,
                workplace,
                competencies,
            };

            let mut eligible: Vec<ScoredCandidate> = Vec::new();
            let mut blocked_union: BTreeSet<crate::domain::types::ExclusionReason> =
                BTreeSet::new();

            for employee in &pool {
                let employee_availability = availability
                    .get(&employee.employee_id)
                    .unwrap_or(&empty_availability);

                let reasons = self.evaluator.exclusion_reasons(
                    employee,
                    &slot_ctx,
                    &profile,
                    &ledger,
                    employee_availability,
                );

                if reasons.is_empty() {
                    let priority_score = self.evaluator.priority_score(
                        &profile,
                        employee.employee_id,
                        workplace.workplace_id,
                    );
                    let score = self
                        .evaluator
                        .score(priority_score, ledger.assigned_count(employee.employee_id));
                    eligible.push(ScoredCandidate {
                        employee_id: employee.employee_id,
                        first_name: employee.first_name.clone(),
                        last_name: employee.last_name.clone(),
                        score,
                        priority_score,
                    });
                } else {
                    blocked_union.extend(reasons);
                }
            }

            // ==========================================
            // 步骤5: 选择胜者或记录未填充
            // ==========================================
            match self.selector.select(eligible) {
                Some(winner) => {
                    let employee_name = format!("{} {}", winner.first_name, winner.last_name);

                    // 低优先级落位: 软违规,不阻断发布
                    if winner.is_low_priority_match() {
                        diagnostics.record_violation(RuleViolation::low_priority_match(
                            winner.employee_id,
                            &employee_name,
                            open_slot.date,
                            workplace.workplace_id,
                            &workplace.name,
                        ));
                    }

                    ledger.record(open_slot.weekday, winner.employee_id);
                    diagnostics.record_generated(GeneratedAssignment {
                        date: open_slot.date,
                        weekday: open_slot.weekday,
                        workplace_id: workplace.workplace_id,
                        workplace_name: workplace.name.clone(),
                        employee_id: winner.employee_id,
                        employee_name,
                        score: winner.score,
                        priority_score: winner.priority_score,
                    });
                }
                None => {
                    diagnostics.record_unfilled(UnfilledSlot {
                        date: open_slot.date,
                        weekday: open_slot.weekday,
                        workplace_id: workplace.workplace_id,
                        workplace_name: workplace.name.clone(),
                        reasons: vec![SlotReason::NoEligibleCandidate],
                        candidates_blocked_by: blocked_union.into_iter().collect(),
                        blocks_publish: true,
                    });
                }
            }
        }

        // ==========================================
        // 步骤6: 诊断汇总
        // ==========================================
        let existing_count = snapshot
            .existing_assignments
            .iter()
            .filter(|a| a.has_employee())
            .count();

        let meta = PlanningMeta {
            year: bounds.year,
            week: bounds.week,
            from: bounds.from,
            to: bounds.to,
        };

        let result = diagnostics.finish(meta, profile, existing_count);

        info!(
            generated = result.stats.generated_assignments,
            unfilled = result.stats.unfilled_slots,
            hard_conflicts = result.stats.hard_conflicts,
            soft_conflicts = result.stats.soft_conflicts,
            publish_allowed = result.publish_allowed,
            "周排班流程完成"
        );

        result
    }
}
