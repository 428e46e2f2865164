// ==========================================
// 医院周排班系统 - 工作点领域模型
// ==========================================
// 工作点 = 可排班的工作单元 (诊室/工位/值班线)
// ==========================================

use crate::domain::types::{CompetencyRelation, Recurrence, RoleCategory};
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// Workplace - 工作点
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workplace {
    pub workplace_id: i64,                    // 工作点ID
    pub name: String,                         // 名称
    pub in_weekly_plan: bool,                 // 纳入周排班标志
    pub active: bool,                         // 启用标志
    pub required_roles: Vec<RoleCategory>,    // 要求角色
    pub alternative_roles: Vec<RoleCategory>, // 备选角色
    pub created_at: NaiveDateTime,            // 创建时间
    pub updated_at: NaiveDateTime,            // 更新时间
}

impl Workplace {
    /// 粗粒度角色资格: 要求/备选角色任一命中即满足;
    /// 两个列表均为空表示不限角色
    pub fn role_satisfied_by(&self, role: RoleCategory) -> bool {
        if self.required_roles.is_empty() && self.alternative_roles.is_empty() {
            return true;
        }
        self.required_roles.contains(&role) || self.alternative_roles.contains(&role)
    }
}

// ==========================================
// WeekdaySetting - 逐工作日运行设置
// ==========================================
// 槽位存在的前提: 对应工作日存在设置,且其周期规则
// 命中该日期的"当月第N个该工作日"序数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekdaySetting {
    pub setting_id: i64,               // 设置ID
    pub workplace_id: i64,             // 关联工作点
    pub weekday: u32,                  // 工作日 (1-7)
    pub recurrence: Recurrence,        // 周期规则
    pub closed: bool,                  // 关闭标志
    pub closed_reason: Option<String>, // 关闭原因
    pub usage_label: Option<String>,   // 用途标签
    pub start_time: Option<NaiveTime>, // 开始时间
    pub end_time: Option<NaiveTime>,   // 结束时间
}

// ==========================================
// RequiredCompetency - 工作点资质要求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequiredCompetency {
    pub competency_id: i64,             // 记录ID
    pub workplace_id: i64,              // 关联工作点
    pub competency: String,             // 资质标签
    pub relation: CompetencyRelation,   // AND=必备 / OR=任一
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

    fn workplace(required: Vec<RoleCategory>, alternative: Vec<RoleCategory>) -> Workplace {
        Workplace {
            workplace_id: 1,
            name: "超声诊室".to_string(),
            in_weekly_plan: true,
            active: true,
            required_roles: required,
            alternative_roles: alternative,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    #[test]
    fn test_role_satisfaction() {
        // 不限角色
        let open = workplace(vec![], vec![]);
        assert!(open.role_satisfied_by(RoleCategory::Clerical));

        // 要求 + 备选
        let wp = workplace(vec![RoleCategory::Physician], vec![RoleCategory::MedicalTechnical]);
        assert!(wp.role_satisfied_by(RoleCategory::Physician));
        assert!(wp.role_satisfied_by(RoleCategory::MedicalTechnical));
        assert!(!wp.role_satisfied_by(RoleCategory::Nursing));
    }
}
