// ==========================================
// 医院周排班系统 - 排班规则档案
// ==========================================
// 职责: 把调用方传入的宽松规则档案归一化为规范形式
// 红线: 归一化永不失败 —— 畸形输入降级为安全默认值,
//       因为它守卫的是尽力而为的生成步骤,不是资金交易
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 优先工作点列表上限
pub const MAX_PRIORITY_AREAS: usize = 3;

// ==========================================
// RuleProfileInput - 宽松输入 (持久化/调用方对象)
// ==========================================
// 存储位置: config_kv (key='planning.default_rule_profile')
// 所有字段可缺失; 缺失的硬规则开关回落到"全部启用"
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RuleProfileInput {
    /// 前一日值班后禁排
    #[serde(default)]
    pub block_after_duty: Option<bool>,

    /// 计划缺勤阻断
    #[serde(default)]
    pub block_absence: Option<bool>,

    /// 长期缺勤阻断
    #[serde(default)]
    pub block_long_term_absence: Option<bool>,

    /// 关闭工作点跳过
    #[serde(default)]
    pub skip_closed_workplaces: Option<bool>,

    /// 周值班保障要求
    #[serde(default)]
    pub require_duty_coverage: Option<bool>,

    /// 逐员工区域规则
    #[serde(default)]
    pub employee_rules: Option<Vec<EmployeeAreaRuleInput>>,
}

/// 逐员工区域规则 (宽松输入)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmployeeAreaRuleInput {
    #[serde(default)]
    pub employee_id: Option<i64>,

    /// 优先工作点 (有序,强度递减)
    #[serde(default)]
    pub priority_areas: Option<Vec<i64>>,

    /// 禁排工作点
    #[serde(default)]
    pub forbidden_areas: Option<Vec<i64>>,
}

// ==========================================
// RuleProfile - 规范形式
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleProfile {
    pub block_after_duty: bool,
    pub block_absence: bool,
    pub block_long_term_absence: bool,
    pub skip_closed_workplaces: bool,
    pub require_duty_coverage: bool,
    pub employee_rules: Vec<EmployeeAreaRule>,
}

/// 逐员工区域规则 (规范形式)
///
/// 不变量: priority_areas 有序编码偏好强度 (最多 3 项, 去重, 仅正整数ID);
/// forbidden_areas 无条件硬排除,与优先级无关
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeAreaRule {
    pub employee_id: i64,
    pub priority_areas: Vec<i64>,
    pub forbidden_areas: Vec<i64>,
}

impl Default for RuleProfile {
    /// 安全默认值: 所有阻断规则启用,无员工规则
    fn default() -> Self {
        Self {
            block_after_duty: true,
            block_absence: true,
            block_long_term_absence: true,
            skip_closed_workplaces: true,
            require_duty_coverage: true,
            employee_rules: Vec::new(),
        }
    }
}

impl RuleProfile {
    /// 查询员工的禁排工作点
    pub fn is_forbidden(&self, employee_id: i64, workplace_id: i64) -> bool {
        self.employee_rules
            .iter()
            .find(|r| r.employee_id == employee_id)
            .map(|r| r.forbidden_areas.contains(&workplace_id))
            .unwrap_or(false)
    }

    /// 查询员工优先工作点排名 (0 起; None = 未列入)
    pub fn priority_rank(&self, employee_id: i64, workplace_id: i64) -> Option<usize> {
        self.employee_rules
            .iter()
            .find(|r| r.employee_id == employee_id)
            .and_then(|r| r.priority_areas.iter().position(|&id| id == workplace_id))
    }
}

// ==========================================
// 归一化
// ==========================================

/// 解析规则档案: 优先取调用方输入,否则取持久化默认值,否则全默认。
/// 无网络与存储副作用; 永不返回错误
pub fn resolve(
    input: Option<RuleProfileInput>,
    stored_default: Option<RuleProfileInput>,
) -> RuleProfile {
    let source = input.or(stored_default).unwrap_or_default();
    normalize(source)
}

/// 把宽松输入归一化为规范形式
pub fn normalize(input: RuleProfileInput) -> RuleProfile {
    let defaults = RuleProfile::default();

    let employee_rules = input
        .employee_rules
        .unwrap_or_default()
        .into_iter()
        .filter_map(normalize_employee_rule)
        .collect();

    RuleProfile {
        block_after_duty: input.block_after_duty.unwrap_or(defaults.block_after_duty),
        block_absence: input.block_absence.unwrap_or(defaults.block_absence),
        block_long_term_absence: input
            .block_long_term_absence
            .unwrap_or(defaults.block_long_term_absence),
        skip_closed_workplaces: input
            .skip_closed_workplaces
            .unwrap_or(defaults.skip_closed_workplaces),
        require_duty_coverage: input
            .require_duty_coverage
            .unwrap_or(defaults.require_duty_coverage),
        employee_rules,
    }
}

/// 归一化单条员工规则; 员工ID非法时整条丢弃
fn normalize_employee_rule(rule: EmployeeAreaRuleInput) -> Option<EmployeeAreaRule> {
    let employee_id = rule.employee_id.filter(|&id| id > 0)?;

    // 优先列表: 去重保序, 仅正整数, 截断到上限
    let mut seen = BTreeSet::new();
    let priority_areas: Vec<i64> = rule
        .priority_areas
        .unwrap_or_default()
        .into_iter()
        .filter(|&id| id > 0 && seen.insert(id))
        .take(MAX_PRIORITY_AREAS)
        .collect();

    // 禁排列表: 去重排序, 仅正整数
    let forbidden_areas: Vec<i64> = rule
        .forbidden_areas
        .unwrap_or_default()
        .into_iter()
        .filter(|&id| id > 0)
        .collect::<BTreeSet<i64>>()
        .into_iter()
        .collect();

    Some(EmployeeAreaRule {
        employee_id,
        priority_areas,
        forbidden_areas,
    })
}
