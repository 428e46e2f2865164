// ==========================================
// 医院周排班系统 - 排班诊断聚合
// ==========================================
// 红线: 规则违规是数据,不是异常 —— 一个槽位都没填上的
//       运行仍然返回成功,并附带完整诊断报告
// ==========================================

use crate::config::rule_profile::RuleProfile;
use crate::domain::types::{ExclusionReason, SlotReason, ViolationCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// PlanningMeta - 运行元信息
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningMeta {
    pub year: i32,        // ISO 年份
    pub week: u32,        // ISO 周号
    pub from: NaiveDate,  // 周一
    pub to: NaiveDate,    // 周日
}

// ==========================================
// PlanningStats - 汇总计数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningStats {
    pub generated_assignments: usize, // 本次生成
    pub existing_assignments: usize,  // 既有人员排班
    pub unfilled_slots: usize,        // 未填充槽位
    pub hard_conflicts: usize,        // 硬冲突数
    pub soft_conflicts: usize,        // 软冲突数
}

// ==========================================
// GeneratedAssignment - 本次运行生成的排班 (未落库)
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedAssignment {
    pub date: NaiveDate,        // 日期
    pub weekday: u32,           // 工作日 (1-7)
    pub workplace_id: i64,      // 工作点ID
    pub workplace_name: String, // 工作点名称
    pub employee_id: i64,       // 员工ID
    pub employee_name: String,  // 员工显示名
    pub score: i32,             // 最终得分
    pub priority_score: i32,    // 优先级得分部分
}

// ==========================================
// UnfilledSlot - 未填充槽位
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnfilledSlot {
    pub date: NaiveDate,                              // 日期
    pub weekday: u32,                                 // 工作日 (1-7)
    pub workplace_id: i64,                            // 工作点ID
    pub workplace_name: String,                       // 工作点名称
    pub reasons: Vec<SlotReason>,                     // 槽位级原因
    pub candidates_blocked_by: Vec<ExclusionReason>,  // 候选被阻断原因并集
    pub blocks_publish: bool,                         // 是否阻断发布
}

// ==========================================
// RuleViolation - 规则违规
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleViolation {
    pub code: ViolationCode,        // 违规代码
    pub hard: bool,                 // 硬违规标志
    pub message: String,            // 本地化消息
    pub date: Option<NaiveDate>,    // 相关日期
    pub workplace_id: Option<i64>,  // 相关工作点
    pub employee_id: Option<i64>,   // 相关员工
}

impl RuleViolation {
    /// 周值班保障缺失 (硬违规,运行前置检查)
    pub fn no_duty_plan(from: NaiveDate, to: NaiveDate) -> Self {
        let message = crate::i18n::t_with_args(
            "planning.no_duty_plan_in_period",
            &[
                ("from", &from.to_string()),
                ("to", &to.to_string()),
            ],
        );
        Self {
            code: ViolationCode::NoDutyPlanInPeriod,
            hard: true,
            message,
            date: None,
            workplace_id: None,
            employee_id: None,
        }
    }

    /// 低优先级落位 (软违规,不阻断发布)
    pub fn low_priority_match(
        employee_id: i64,
        employee_name: &str,
        date: NaiveDate,
        workplace_id: i64,
        workplace_name: &str,
    ) -> Self {
        let message = crate::i18n::t_with_args(
            "planning.low_priority_area_match",
            &[
                ("employee", employee_name),
                ("date", &date.to_string()),
                ("workplace", workplace_name),
            ],
        );
        Self {
            code: ViolationCode::LowPriorityAreaMatch,
            hard: false,
            message,
            date: Some(date),
            workplace_id: Some(workplace_id),
            employee_id: Some(employee_id),
        }
    }
}

// ==========================================
// PlanningResult - 排班运行结果
// ==========================================
// 对外接口对象: UI 协作方渲染、发布门控消费
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningResult {
    pub meta: PlanningMeta,
    pub profile: RuleProfile,
    pub stats: PlanningStats,
    pub generated_assignments: Vec<GeneratedAssignment>,
    pub unfilled_slots: Vec<UnfilledSlot>,
    pub violations: Vec<RuleViolation>,
    pub publish_allowed: bool,
}

// ==========================================
// DiagnosticsCollector - 诊断收集器
// ==========================================
#[derive(Debug, Default)]
pub struct DiagnosticsCollector {
    generated: Vec<GeneratedAssignment>,
    unfilled: Vec<UnfilledSlot>,
    violations: Vec<RuleViolation>,
}

impl DiagnosticsCollector {
    /// 构造函数
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一条生成排班
    pub fn record_generated(&mut self, assignment: GeneratedAssignment) {
        self.generated.push(assignment);
    }

    /// 记录一个未填充槽位
    pub fn record_unfilled(&mut self, slot: UnfilledSlot) {
        self.unfilled.push(slot);
    }

    /// 记录一条规则违规
    pub fn record_violation(&mut self, violation: RuleViolation) {
        self.violations.push(violation);
    }

    /// 已生成数量 (供负载惩罚之外的调用方查询)
    pub fn generated_count(&self) -> usize {
        self.generated.len()
    }

    /// 硬冲突数 = 阻断发布的未填充槽位 + 硬违规
    pub fn hard_conflicts(&self) -> usize {
        let blocking_slots = self.unfilled.iter().filter(|s| s.blocks_publish).count();
        let hard_violations = self.violations.iter().filter(|v| v.hard).count();
        blocking_slots + hard_violations
    }

    /// 软冲突数
    pub fn soft_conflicts(&self) -> usize {
        self.violations.iter().filter(|v| !v.hard).count()
    }

    /// 汇总为运行结果
    ///
    /// 发布门控: publish_allowed 当且仅当硬冲突数为 0
    pub fn finish(
        self,
        meta: PlanningMeta,
        profile: RuleProfile,
        existing_assignments: usize,
    ) -> PlanningResult {
        let hard_conflicts = self.hard_conflicts();
        let soft_conflicts = self.soft_conflicts();

        let stats = PlanningStats {
            generated_assignments: self.generated.len(),
            existing_assignments,
            unfilled_slots: self.unfilled.len(),
            hard_conflicts,
            soft_conflicts,
        };

        PlanningResult {
            meta,
            profile,
            stats,
            generated_assignments: self.generated,
            unfilled_slots: self.unfilled,
            violations: self.violations,
            publish_allowed: hard_conflicts == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn meta() -> PlanningMeta {
        PlanningMeta {
            year: 2026,
            week: 10,
            from: d(2026, 3, 2),
            to: d(2026, 3, 8),
        }
    }

    fn unfilled(blocks_publish: bool) -> UnfilledSlot {
        UnfilledSlot {
            date: d(2026, 3, 2),
            weekday: 1,
            workplace_id: 1,
            workplace_name: "B超室".to_string(),
            reasons: vec![SlotReason::NoEligibleCandidate],
            candidates_blocked_by: vec![],
            blocks_publish,
        }
    }

    #[test]
    fn test_publish_allowed_iff_zero_hard_conflicts() {
        // 无冲突
        let collector = DiagnosticsCollector::new();
        let result = collector.finish(meta(), RuleProfile::default(), 0);
        assert_eq!(result.stats.hard_conflicts, 0);
        assert!(result.publish_allowed);

        // 软冲突不阻断
        let mut collector = DiagnosticsCollector::new();
        collector.record_violation(RuleViolation::low_priority_match(
            1, "Anna Anderson", d(2026, 3, 2), 1, "B超室",
        ));
        let result = collector.finish(meta(), RuleProfile::default(), 0);
        assert_eq!(result.stats.hard_conflicts, 0);
        assert_eq!(result.stats.soft_conflicts, 1);
        assert!(result.publish_allowed);

        // 硬违规阻断
        let mut collector = DiagnosticsCollector::new();
        collector.record_violation(RuleViolation::no_duty_plan(d(2026, 3, 2), d(2026, 3, 8)));
        let result = collector.finish(meta(), RuleProfile::default(), 0);
        assert_eq!(result.stats.hard_conflicts, 1);
        assert!(!result.publish_allowed);
    }

    #[test]
    fn test_hard_conflicts_count_blocking_slots_and_hard_violations() {
        let mut collector = DiagnosticsCollector::new();
        collector.record_unfilled(unfilled(true));
        collector.record_unfilled(unfilled(false)); // LOCKED_EMPTY 类: 不阻断
        collector.record_violation(RuleViolation::no_duty_plan(d(2026, 3, 2), d(2026, 3, 8)));

        assert_eq!(collector.hard_conflicts(), 2);

        let result = collector.finish(meta(), RuleProfile::default(), 3);
        assert_eq!(result.stats.unfilled_slots, 2);
        assert_eq!(result.stats.existing_assignments, 3);
        assert!(!result.publish_allowed);
    }
}
