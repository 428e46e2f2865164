// ==========================================
// 医院周排班系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 排班决策支持 (人工最终控制权)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 周排班生成规则
pub mod engine;

// 配置层 - 规则档案与系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AbsenceStatus, AssignmentKind, CompetencyRelation, ExclusionReason, PlanStatus, Recurrence,
    RoleCategory, SlotReason, ViolationCode,
};

// 领域实体
pub use domain::{
    Employee, LongTermAbsence, PlannedAbsence, RequiredCompetency, RosterShift, WeekdaySetting,
    WeeklyPlan, WeeklyPlanAssignment, Workplace,
};

// 规则档案
pub use config::rule_profile::{EmployeeAreaRule, RuleProfile, RuleProfileInput};

// 引擎
pub use engine::{
    CandidateEvaluator, CandidateSelector, DiagnosticsCollector, GeneratedAssignment,
    PlanningOrchestrator, PlanningResult, PlanningSnapshot, PlanningStats, RuleViolation,
    SlotEnumerator, UnfilledSlot, WeekBounds,
};

// API
pub use api::{ApiError, ApiResult, ApplyOutcome, PlanApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "医院周排班系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
