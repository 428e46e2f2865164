// ==========================================
// 医院周排班系统 - API 层
// ==========================================

pub mod error;
pub mod plan_api;

pub use error::{ApiError, ApiResult};
pub use plan_api::{ApplyOutcome, PlanApi};
