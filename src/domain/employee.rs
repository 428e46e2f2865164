// ==========================================
// 医院周排班系统 - 员工与可用性领域模型
// ==========================================
// 员工可用性由三类记录共同决定:
// 计划缺勤、长期缺勤、以及旧制停用日期窗口
// ==========================================

use crate::domain::types::{AbsenceStatus, RoleCategory};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Employee - 员工
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: i64,                 // 员工ID
    pub first_name: String,               // 名
    pub last_name: String,                // 姓
    pub role_category: RoleCategory,      // 角色类别
    pub competencies: Vec<String>,        // 资质标签 (自由文本)
    pub active: bool,                     // 启用标志
    pub inactive_from: Option<NaiveDate>, // 旧制停用起始
    pub inactive_until: Option<NaiveDate>,// 旧制停用截止
    pub created_at: NaiveDateTime,        // 创建时间
    pub updated_at: NaiveDateTime,        // 更新时间
}

impl Employee {
    /// 显示名
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// 判断某日期是否落入旧制停用窗口
    /// 窗口端点缺失按开区间处理
    pub fn is_inactive_on(&self, date: NaiveDate) -> bool {
        match (self.inactive_from, self.inactive_until) {
            (None, None) => false,
            (Some(from), None) => date >= from,
            (None, Some(until)) => date <= until,
            (Some(from), Some(until)) => date >= from && date <= until,
        }
    }

    /// 资质标签归一化比较 (大小写无关,去首尾空白)
    pub fn holds_competency(&self, competency: &str) -> bool {
        let wanted = normalize_tag(competency);
        self.competencies.iter().any(|c| normalize_tag(c) == wanted)
    }
}

/// 资质标签归一化
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().to_lowercase()
}

// ==========================================
// PlannedAbsence - 计划缺勤
// ==========================================
// 非 REJECTED 即阻断可用性
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedAbsence {
    pub absence_id: i64,        // 记录ID
    pub employee_id: i64,       // 员工ID
    pub from_date: NaiveDate,   // 起始日期
    pub to_date: NaiveDate,     // 截止日期 (含)
    pub status: AbsenceStatus,  // 审批状态
}

impl PlannedAbsence {
    /// 判断是否阻断某日期
    pub fn blocks(&self, date: NaiveDate) -> bool {
        self.status != AbsenceStatus::Rejected && self.from_date <= date && date <= self.to_date
    }
}

// ==========================================
// LongTermAbsence - 长期缺勤
// ==========================================
// 仅 APPROVED 阻断可用性
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LongTermAbsence {
    pub absence_id: i64,        // 记录ID
    pub employee_id: i64,       // 员工ID
    pub from_date: NaiveDate,   // 起始日期
    pub to_date: NaiveDate,     // 截止日期 (含)
    pub status: AbsenceStatus,  // 审批状态
}

impl LongTermAbsence {
    /// 判断是否阻断某日期
    pub fn blocks(&self, date: NaiveDate) -> bool {
        self.status == AbsenceStatus::Approved && self.from_date <= date && date <= self.to_date
    }
}

// ==========================================
// RosterShift - 月度值班记录
// ==========================================
// 用途: "前一日值过班"硬规则 + 周值班保障检查
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterShift {
    pub shift_id: i64,               // 记录ID
    pub employee_id: i64,            // 员工ID
    pub shift_date: NaiveDate,       // 值班日期
    pub overduty: bool,              // 加值标志 (不计入值班规则)
    pub shift_label: Option<String>, // 班次标签
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn employee(from: Option<NaiveDate>, until: Option<NaiveDate>) -> Employee {
        Employee {
            employee_id: 1,
            first_name: "Anna".to_string(),
            last_name: "Anderson".to_string(),
            role_category: RoleCategory::Nursing,
            competencies: vec!["Sonographie ".to_string(), "EKG".to_string()],
            active: true,
            inactive_from: from,
            inactive_until: until,
            created_at: d(2026, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
            updated_at: d(2026, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_inactive_window() {
        let e = employee(Some(d(2026, 3, 10)), Some(d(2026, 3, 20)));
        assert!(!e.is_inactive_on(d(2026, 3, 9)));
        assert!(e.is_inactive_on(d(2026, 3, 10)));
        assert!(e.is_inactive_on(d(2026, 3, 20)));
        assert!(!e.is_inactive_on(d(2026, 3, 21)));

        // 开区间
        let open_end = employee(Some(d(2026, 3, 10)), None);
        assert!(open_end.is_inactive_on(d(2027, 1, 1)));
        assert!(!employee(None, None).is_inactive_on(d(2026, 3, 10)));
    }

    #[test]
    fn test_competency_normalization() {
        let e = employee(None, None);
        assert!(e.holds_competency("sonographie"));
        assert!(e.holds_competency(" EKG "));
        assert!(!e.holds_competency("Dialyse"));
    }

    #[test]
    fn test_absence_blocking() {
        let planned = PlannedAbsence {
            absence_id: 1,
            employee_id: 1,
            from_date: d(2026, 3, 2),
            to_date: d(2026, 3, 4),
            status: AbsenceStatus::Requested,
        };
        // 计划缺勤: 未驳回即阻断
        assert!(planned.blocks(d(2026, 3, 3)));
        assert!(!planned.blocks(d(2026, 3, 5)));

        let rejected = PlannedAbsence {
            status: AbsenceStatus::Rejected,
            ..planned.clone()
        };
        assert!(!rejected.blocks(d(2026, 3, 3)));

        // 长期缺勤: 仅批准后阻断
        let long_term = LongTermAbsence {
            absence_id: 2,
            employee_id: 1,
            from_date: d(2026, 3, 1),
            to_date: d(2026, 6, 30),
            status: AbsenceStatus::Requested,
        };
        assert!(!long_term.blocks(d(2026, 3, 3)));
        let approved = LongTermAbsence {
            status: AbsenceStatus::Approved,
            ..long_term
        };
        assert!(approved.blocks(d(2026, 3, 3)));
    }
}
