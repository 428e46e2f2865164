// ==========================================
// 医院周排班系统 - 领域层
// ==========================================

pub mod employee;
pub mod plan;
pub mod types;
pub mod workplace;

pub use employee::{normalize_tag, Employee, LongTermAbsence, PlannedAbsence, RosterShift};
pub use plan::{WeeklyPlan, WeeklyPlanAssignment};
pub use workplace::{RequiredCompetency, WeekdaySetting, Workplace};
