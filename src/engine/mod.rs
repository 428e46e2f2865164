// ==========================================
// 医院周排班系统 - 引擎层
// ==========================================
// 数据流单向: 规则归一化 -> 槽位枚举 -> 候选评估
//            -> 评分选择 -> 诊断聚合 -> (可选) 落库
// ==========================================

pub mod candidates;
pub mod diagnostics;
pub mod orchestrator;
pub mod selector;
pub mod slots;

pub use candidates::{
    CandidateEvaluator, EmployeeAvailability, RunLedger, SlotContext, ASSIGNED_LOAD_PENALTY,
    NO_MATCH_SCORE, PRIORITY_AREA_SCORES,
};
pub use diagnostics::{
    DiagnosticsCollector, GeneratedAssignment, PlanningMeta, PlanningResult, PlanningStats,
    RuleViolation, UnfilledSlot,
};
pub use orchestrator::{PlanningOrchestrator, PlanningSnapshot};
pub use selector::{CandidateSelector, ScoredCandidate};
pub use slots::{weekday_occurrence_in_month, OpenSlot, SlotEnumerator, WeekBounds};
