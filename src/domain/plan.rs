// ==========================================
// 医院周排班系统 - 周计划领域模型
// ==========================================
// 红线: 已发布 (RELEASED) 的周计划不得被自动生成静默覆盖
// ==========================================

use crate::domain::types::{AssignmentKind, PlanStatus};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// WeeklyPlan - 周计划
// ==========================================
// 以 (year, week) 唯一标识; 首次访问时创建,不做隐式删除
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyPlan {
    pub plan_id: String,            // 计划ID
    pub year: i32,                  // ISO 年份
    pub week: u32,                  // ISO 周号 (1-53)
    pub status: PlanStatus,         // 生命周期状态
    pub locked_weekdays: Vec<u32>,  // 禁止自动生成的工作日 (1-7)
    pub created_at: NaiveDateTime,  // 创建时间
    pub updated_at: NaiveDateTime,  // 更新时间
}

impl WeeklyPlan {
    /// 判断是否为草稿状态
    pub fn is_draft(&self) -> bool {
        self.status == PlanStatus::Draft
    }

    /// 判断是否已发布
    pub fn is_released(&self) -> bool {
        self.status == PlanStatus::Released
    }

    /// 判断某工作日是否被封锁 (不参与自动生成)
    pub fn is_weekday_locked(&self, weekday: u32) -> bool {
        self.locked_weekdays.contains(&weekday)
    }
}

// ==========================================
// WeeklyPlanAssignment - 周排班记录
// ==========================================
// 单条 (工作点, 工作日) 事实: 人员排班、角色/备注标签、或无人员的封锁。
// 同一槽位允许多条记录并存 (如封锁 + 人员)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklyPlanAssignment {
    pub assignment_id: String,     // 记录ID
    pub plan_id: String,           // 关联周计划
    pub weekday: u32,              // 工作日 (1=周一 .. 7=周日)
    pub workplace_id: i64,         // 工作点ID
    pub employee_id: Option<i64>,  // 员工ID (可空)
    pub label: Option<String>,     // 自由文本/角色标签 (可空)
    pub blocked: bool,             // 封锁标志
    pub kind: AssignmentKind,      // 来源 (MANUAL/PLAN)
    pub created_at: NaiveDateTime, // 创建时间
    pub updated_at: NaiveDateTime, // 更新时间
}

impl WeeklyPlanAssignment {
    /// 槽位键: 同一周计划内以 (工作日, 工作点) 唯一标识槽位
    pub fn slot_key(&self) -> (u32, i64) {
        (self.weekday, self.workplace_id)
    }

    /// 判断是否为人员排班
    pub fn has_employee(&self) -> bool {
        self.employee_id.is_some()
    }

    /// 判断是否为无人员的封锁记录
    pub fn is_block_without_employee(&self) -> bool {
        self.blocked && self.employee_id.is_none()
    }

    /// 判断该记录是否占用槽位 (人员或封锁均不可再被自动填充)
    pub fn occupies_slot(&self) -> bool {
        self.has_employee() || self.blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn assignment(employee_id: Option<i64>, blocked: bool) -> WeeklyPlanAssignment {
        WeeklyPlanAssignment {
            assignment_id: "A1".to_string(),
            plan_id: "P1".to_string(),
            weekday: 2,
            workplace_id: 10,
            employee_id,
            label: None,
            blocked,
            kind: AssignmentKind::Manual,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    #[test]
    fn test_slot_occupation() {
        assert!(assignment(Some(7), false).occupies_slot());
        assert!(assignment(None, true).occupies_slot());
        assert!(!assignment(None, false).occupies_slot());

        assert!(assignment(None, true).is_block_without_employee());
        assert!(!assignment(Some(7), true).is_block_without_employee());
    }

    #[test]
    fn test_locked_weekday_lookup() {
        let plan = WeeklyPlan {
            plan_id: "P1".to_string(),
            year: 2026,
            week: 10,
            status: PlanStatus::Draft,
            locked_weekdays: vec![3, 6],
            created_at: ts(),
            updated_at: ts(),
        };
        assert!(plan.is_weekday_locked(3));
        assert!(!plan.is_weekday_locked(1));
    }
}
