// ==========================================
// 医院周排班系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 周计划状态 (Plan Status)
// ==========================================
// 状态机: DRAFT -> {PREVIEW, RELEASED};
//         PREVIEW -> {RELEASED, DRAFT};
//         RELEASED -> {DRAFT}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Draft,    // 草稿
    Preview,  // 预览
    Released, // 已发布
}

impl PlanStatus {
    /// 当前状态允许的目标状态
    pub fn allowed_targets(&self) -> &'static [PlanStatus] {
        match self {
            PlanStatus::Draft => &[PlanStatus::Preview, PlanStatus::Released],
            PlanStatus::Preview => &[PlanStatus::Released, PlanStatus::Draft],
            PlanStatus::Released => &[PlanStatus::Draft],
        }
    }

    /// 判断状态转换是否合法
    pub fn can_transition_to(&self, target: PlanStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// 从数据库字符串解析
    pub fn parse(s: &str) -> Option<PlanStatus> {
        match s {
            "DRAFT" => Some(PlanStatus::Draft),
            "PREVIEW" => Some(PlanStatus::Preview),
            "RELEASED" => Some(PlanStatus::Released),
            _ => None,
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanStatus::Draft => write!(f, "DRAFT"),
            PlanStatus::Preview => write!(f, "PREVIEW"),
            PlanStatus::Released => write!(f, "RELEASED"),
        }
    }
}

// ==========================================
// 周期规则 (Recurrence)
// ==========================================
// 工作点逐工作日设置的重复周期:
// - WEEKLY: 每周
// - FIRST_AND_THIRD: 每月第1、第3个该工作日
// - FIRST_ONLY: 仅每月第1个该工作日
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recurrence {
    Weekly,
    FirstAndThird,
    FirstOnly,
}

impl Recurrence {
    /// 判断是否在"当月第 occurrence 个该工作日"生效
    pub fn matches_occurrence(&self, occurrence: u32) -> bool {
        match self {
            Recurrence::Weekly => true,
            Recurrence::FirstAndThird => occurrence == 1 || occurrence == 3,
            Recurrence::FirstOnly => occurrence == 1,
        }
    }

    pub fn parse(s: &str) -> Option<Recurrence> {
        match s {
            "WEEKLY" => Some(Recurrence::Weekly),
            "FIRST_AND_THIRD" => Some(Recurrence::FirstAndThird),
            "FIRST_ONLY" => Some(Recurrence::FirstOnly),
            _ => None,
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recurrence::Weekly => write!(f, "WEEKLY"),
            Recurrence::FirstAndThird => write!(f, "FIRST_AND_THIRD"),
            Recurrence::FirstOnly => write!(f, "FIRST_ONLY"),
        }
    }
}

// ==========================================
// 排班记录来源 (Assignment Kind)
// ==========================================
// MANUAL: 人工编辑; PLAN: 引擎生成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentKind {
    Manual,
    Plan,
}

impl AssignmentKind {
    pub fn parse(s: &str) -> Option<AssignmentKind> {
        match s {
            "MANUAL" => Some(AssignmentKind::Manual),
            "PLAN" => Some(AssignmentKind::Plan),
            _ => None,
        }
    }
}

impl fmt::Display for AssignmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentKind::Manual => write!(f, "MANUAL"),
            AssignmentKind::Plan => write!(f, "PLAN"),
        }
    }
}

// ==========================================
// 缺勤审批状态 (Absence Status)
// ==========================================
// 计划缺勤: 非 REJECTED 即阻断可用性
// 长期缺勤: 仅 APPROVED 阻断可用性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbsenceStatus {
    Requested, // 已申请
    Approved,  // 已批准
    Rejected,  // 已驳回
}

impl AbsenceStatus {
    pub fn parse(s: &str) -> Option<AbsenceStatus> {
        match s {
            "REQUESTED" => Some(AbsenceStatus::Requested),
            "APPROVED" => Some(AbsenceStatus::Approved),
            "REJECTED" => Some(AbsenceStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for AbsenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsenceStatus::Requested => write!(f, "REQUESTED"),
            AbsenceStatus::Approved => write!(f, "APPROVED"),
            AbsenceStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

// ==========================================
// 角色类别 (Role Category)
// ==========================================
// 显式枚举,不做标签文本猜测; CLERICAL 不参与排班候选
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleCategory {
    Physician,        // 医师
    Nursing,          // 护理
    MedicalTechnical, // 医技
    Clerical,         // 行政文员
}

impl RoleCategory {
    pub fn parse(s: &str) -> Option<RoleCategory> {
        match s {
            "PHYSICIAN" => Some(RoleCategory::Physician),
            "NURSING" => Some(RoleCategory::Nursing),
            "MEDICAL_TECHNICAL" => Some(RoleCategory::MedicalTechnical),
            "CLERICAL" => Some(RoleCategory::Clerical),
            _ => None,
        }
    }
}

impl fmt::Display for RoleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleCategory::Physician => write!(f, "PHYSICIAN"),
            RoleCategory::Nursing => write!(f, "NURSING"),
            RoleCategory::MedicalTechnical => write!(f, "MEDICAL_TECHNICAL"),
            RoleCategory::Clerical => write!(f, "CLERICAL"),
        }
    }
}

// ==========================================
// 资质要求关系 (Competency Relation)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompetencyRelation {
    And, // 必备: 全部满足
    Or,  // 可选: 满足其一
}

impl CompetencyRelation {
    pub fn parse(s: &str) -> Option<CompetencyRelation> {
        match s {
            "AND" => Some(CompetencyRelation::And),
            "OR" => Some(CompetencyRelation::Or),
            _ => None,
        }
    }
}

impl fmt::Display for CompetencyRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompetencyRelation::And => write!(f, "AND"),
            CompetencyRelation::Or => write!(f, "OR"),
        }
    }
}

// ==========================================
// 候选排除原因 (Exclusion Reason)
// ==========================================
// 逐候选累积,不做首中即止 —— 诊断必须解释所有阻断因素
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExclusionReason {
    ForbiddenArea,           // 禁排工作点
    AlreadyAssignedSameTime, // 同一工作日已有排班
    AbsenceBlocked,          // 计划缺勤阻断
    LongTermAbsenceBlocked,  // 长期缺勤阻断
    AfterDutyBlocked,        // 前一日值班后禁排
    MissingRequiredRole,     // 角色不满足
    MissingRequiredSkill,    // 资质不满足
    EmployeeInactive,        // 停用日期窗口内
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ExclusionReason::ForbiddenArea => "FORBIDDEN_AREA",
            ExclusionReason::AlreadyAssignedSameTime => "ALREADY_ASSIGNED_SAME_TIME",
            ExclusionReason::AbsenceBlocked => "ABSENCE_BLOCKED",
            ExclusionReason::LongTermAbsenceBlocked => "LONG_TERM_ABSENCE_BLOCKED",
            ExclusionReason::AfterDutyBlocked => "AFTER_DUTY_BLOCKED",
            ExclusionReason::MissingRequiredRole => "MISSING_REQUIRED_ROLE",
            ExclusionReason::MissingRequiredSkill => "MISSING_REQUIRED_SKILL",
            ExclusionReason::EmployeeInactive => "EMPLOYEE_INACTIVE",
        };
        write!(f, "{}", code)
    }
}

// ==========================================
// 未填充槽位原因 (Slot Reason)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotReason {
    LockedEmpty,         // 人工封锁且无人员
    NoEligibleCandidate, // 无可用候选
}

impl fmt::Display for SlotReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotReason::LockedEmpty => write!(f, "LOCKED_EMPTY"),
            SlotReason::NoEligibleCandidate => write!(f, "NO_ELIGIBLE_CANDIDATE"),
        }
    }
}

// ==========================================
// 规则违规代码 (Violation Code)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    NoDutyPlanInPeriod,   // 目标周无值班计划 (硬)
    LowPriorityAreaMatch, // 低优先级落位 (软)
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationCode::NoDutyPlanInPeriod => write!(f, "NO_DUTY_PLAN_IN_PERIOD"),
            ViolationCode::LowPriorityAreaMatch => write!(f, "LOW_PRIORITY_AREA_MATCH"),
        }
    }
}
