// ==========================================
// 医院周排班系统 - 周计划API
// ==========================================
// 职责: 周计划生命周期 + 排班生成入口 + 人工编辑
// 红线: Preview 纯计算零落库; Apply 在 RELEASED 计划上
//       直接拒绝 (校验错误,不是静默跳过)
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::config::rule_profile::RuleProfileInput;
use crate::domain::plan::{WeeklyPlan, WeeklyPlanAssignment};
use crate::domain::types::{AssignmentKind, PlanStatus};
use crate::engine::orchestrator::{PlanningOrchestrator, PlanningSnapshot};
use crate::engine::slots::WeekBounds;
use crate::engine::PlanningResult;
use crate::repository::{
    AssignmentRepository, EmployeeRepository, WeeklyPlanRepository, WorkplaceRepository,
};
use chrono::{Days, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

// ==========================================
// ApplyOutcome - Apply 运行结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    pub plan: WeeklyPlan,
    pub result: PlanningResult,
    /// 实际落库的生成排班数 (槽位竞争过滤后)
    pub applied_count: usize,
}

// ==========================================
// PlanApi - 周计划API
// ==========================================
pub struct PlanApi {
    plan_repo: Arc<WeeklyPlanRepository>,
    assignment_repo: Arc<AssignmentRepository>,
    workplace_repo: Arc<WorkplaceRepository>,
    employee_repo: Arc<EmployeeRepository>,
    orchestrator: PlanningOrchestrator<ConfigManager>,
}

impl PlanApi {
    /// 创建新的 PlanApi 实例
    ///
    /// # 参数
    /// - conn: 共享数据库连接
    /// - config: 配置管理器 (默认规则档案来源)
    pub fn new(conn: Arc<Mutex<Connection>>, config: Arc<ConfigManager>) -> Self {
        Self {
            plan_repo: Arc::new(WeeklyPlanRepository::new(conn.clone())),
            assignment_repo: Arc::new(AssignmentRepository::new(conn.clone())),
            workplace_repo: Arc::new(WorkplaceRepository::new(conn.clone())),
            employee_repo: Arc::new(EmployeeRepository::new(conn)),
            orchestrator: PlanningOrchestrator::new(config),
        }
    }

    // ==========================================
    // 生成入口
    // ==========================================

    /// 预览周排班 (纯计算,零落库)
    ///
    /// 计划不存在时在临时草稿计划上计算,存储不被触碰
    pub async fn preview_week(
        &self,
        year: i32,
        week: u32,
        profile_input: Option<RuleProfileInput>,
    ) -> ApiResult<PlanningResult> {
        let bounds = resolve_bounds(year, week)?;

        let plan = match self.plan_repo.find_by_week(year, week)? {
            Some(plan) => plan,
            None => transient_plan(year, week),
        };

        let snapshot = self.load_snapshot(&plan, &bounds)?;
        Ok(self.orchestrator.run(&bounds, &snapshot, profile_input).await)
    }

    /// 生成并落库周排班
    ///
    /// 计划不存在时先创建; RELEASED 计划直接拒绝;
    /// 仅落库与既有槽位不冲突的生成排班,整批事务化
    pub async fn apply_week(
        &self,
        year: i32,
        week: u32,
        profile_input: Option<RuleProfileInput>,
    ) -> ApiResult<ApplyOutcome> {
        let bounds = resolve_bounds(year, week)?;
        let plan = self.get_or_create_plan(year, week)?;

        if plan.is_released() {
            return Err(ApiError::ReleasedPlanProtected(format!(
                "周计划 {}/{} 已发布,自动生成拒绝运行; 如需重排请先转回 DRAFT",
                year, week
            )));
        }

        let snapshot = self.load_snapshot(&plan, &bounds)?;
        let result = self.orchestrator.run(&bounds, &snapshot, profile_input).await;

        // 生成列表转排班记录 (PLAN 来源,无封锁,无标签)
        let now = Utc::now().naive_utc();
        let rows: Vec<WeeklyPlanAssignment> = result
            .generated_assignments
            .iter()
            .map(|g| WeeklyPlanAssignment {
                assignment_id: Uuid::new_v4().to_string(),
                plan_id: plan.plan_id.clone(),
                weekday: g.weekday,
                workplace_id: g.workplace_id,
                employee_id: Some(g.employee_id),
                label: None,
                blocked: false,
                kind: AssignmentKind::Plan,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let applied_count = self
            .assignment_repo
            .insert_generated_batch(&plan.plan_id, &rows)?;

        info!(
            year,
            week,
            generated = rows.len(),
            applied = applied_count,
            "周排班生成已落库"
        );

        Ok(ApplyOutcome {
            plan,
            result,
            applied_count,
        })
    }

    // ==========================================
    // 计划生命周期
    // ==========================================

    /// 按 (year, week) 获取周计划,不存在时创建草稿
    pub fn get_or_create_plan(&self, year: i32, week: u32) -> ApiResult<WeeklyPlan> {
        resolve_bounds(year, week)?;

        if let Some(plan) = self.plan_repo.find_by_week(year, week)? {
            return Ok(plan);
        }

        let plan = transient_plan(year, week);
        self.plan_repo.create(&plan)?;
        Ok(plan)
    }

    /// 状态转换 (按状态机校验)
    pub fn set_plan_status(&self, year: i32, week: u32, target: PlanStatus) -> ApiResult<WeeklyPlan> {
        let plan = self
            .plan_repo
            .find_by_week(year, week)?
            .ok_or_else(|| ApiError::NotFound(format!("周计划 {}/{} 不存在", year, week)))?;

        if !plan.status.can_transition_to(target) {
            let allowed = plan
                .status
                .allowed_targets()
                .iter()
                .map(|s| s.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ApiError::InvalidStateTransition {
                from: plan.status.to_string(),
                to: target.to_string(),
                allowed,
            });
        }

        self.plan_repo.update_status(&plan.plan_id, target)?;
        let mut updated = plan;
        updated.status = target;
        Ok(updated)
    }

    /// 更新封锁工作日列表
    ///
    /// 校验: 工作日必须在 1-7, 去重排序后存储
    pub fn set_locked_weekdays(
        &self,
        year: i32,
        week: u32,
        weekdays: Vec<u32>,
    ) -> ApiResult<WeeklyPlan> {
        if let Some(bad) = weekdays.iter().find(|&&d| !(1..=7).contains(&d)) {
            return Err(ApiError::ValidationError(format!(
                "封锁工作日必须在 1-7 之间: {}",
                bad
            )));
        }

        let mut normalized: Vec<u32> = weekdays;
        normalized.sort_unstable();
        normalized.dedup();

        let plan = self.get_or_create_plan(year, week)?;
        self.plan_repo
            .update_locked_weekdays(&plan.plan_id, &normalized)?;

        let mut updated = plan;
        updated.locked_weekdays = normalized;
        Ok(updated)
    }

    // ==========================================
    // 人工编辑
    // ==========================================

    /// 查询周计划的全部排班记录
    pub fn list_assignments(&self, year: i32, week: u32) -> ApiResult<Vec<WeeklyPlanAssignment>> {
        let plan = self
            .plan_repo
            .find_by_week(year, week)?
            .ok_or_else(|| ApiError::NotFound(format!("周计划 {}/{} 不存在", year, week)))?;

        Ok(self.assignment_repo.list_by_plan(&plan.plan_id)?)
    }

    /// 创建人工排班记录 (人员排班、标签或封锁)
    pub fn create_manual_assignment(
        &self,
        year: i32,
        week: u32,
        weekday: u32,
        workplace_id: i64,
        employee_id: Option<i64>,
        label: Option<String>,
        blocked: bool,
    ) -> ApiResult<WeeklyPlanAssignment> {
        if !(1..=7).contains(&weekday) {
            return Err(ApiError::InvalidInput(format!(
                "工作日必须在 1-7 之间: {}",
                weekday
            )));
        }

        // 引用校验: 工作点与员工必须存在于快照
        if self.workplace_repo.find_by_id(workplace_id)?.is_none() {
            return Err(ApiError::NotFound(format!("工作点(id={})不存在", workplace_id)));
        }
        if let Some(id) = employee_id {
            if self.employee_repo.find_by_id(id)?.is_none() {
                return Err(ApiError::NotFound(format!("员工(id={})不存在", id)));
            }
        }

        let plan = self.get_or_create_plan(year, week)?;
        let now = Utc::now().naive_utc();
        let assignment = WeeklyPlanAssignment {
            assignment_id: Uuid::new_v4().to_string(),
            plan_id: plan.plan_id,
            weekday,
            workplace_id,
            employee_id,
            label,
            blocked,
            kind: AssignmentKind::Manual,
            created_at: now,
            updated_at: now,
        };

        self.assignment_repo.create(&assignment)?;
        Ok(assignment)
    }

    /// 删除单条排班记录
    pub fn delete_assignment(&self, assignment_id: &str) -> ApiResult<()> {
        Ok(self.assignment_repo.delete(assignment_id)?)
    }

    // ==========================================
    // 快照装载
    // ==========================================

    /// 一次性批量装载引擎输入快照
    ///
    /// 边界校验: 同一 (工作点, 工作日) 的重叠设置是配置错误,
    /// 在此拒绝,不进入引擎热循环
    fn load_snapshot(&self, plan: &WeeklyPlan, bounds: &WeekBounds) -> ApiResult<PlanningSnapshot> {
        let workplaces = self.workplace_repo.list_weekly_plan_eligible()?;
        let weekday_settings = self.workplace_repo.list_weekly_plan_settings()?;

        let mut seen: HashMap<(i64, u32), usize> = HashMap::new();
        for setting in &weekday_settings {
            *seen.entry((setting.workplace_id, setting.weekday)).or_insert(0) += 1;
        }
        let mut overlaps: Vec<String> = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((workplace_id, weekday), _)| {
                format!("工作点{}[工作日{}]", workplace_id, weekday)
            })
            .collect();
        if !overlaps.is_empty() {
            overlaps.sort();
            return Err(ApiError::ValidationError(format!(
                "逐工作日设置存在重叠,请先修正配置: {}",
                overlaps.join(", ")
            )));
        }

        let required_competencies = self.workplace_repo.list_weekly_plan_competencies()?;
        let employees = self.employee_repo.list_active()?;
        let planned_absences = self
            .employee_repo
            .list_planned_absences_overlapping(bounds.from, bounds.to)?;
        let long_term_absences = self
            .employee_repo
            .list_long_term_absences_overlapping(bounds.from, bounds.to)?;

        // 含周一前一日,供值班后禁排规则使用
        let shifts_from = bounds.from.checked_sub_days(Days::new(1)).unwrap_or(bounds.from);
        let roster_shifts = self
            .employee_repo
            .list_roster_shifts_between(shifts_from, bounds.to)?;

        // 临时计划 (preview 专用) 无既有记录可查
        let existing_assignments = if self.plan_repo.find_by_week(plan.year, plan.week)?.is_some() {
            self.assignment_repo.list_by_plan(&plan.plan_id)?
        } else {
            Vec::new()
        };

        Ok(PlanningSnapshot {
            plan: plan.clone(),
            workplaces,
            weekday_settings,
            required_competencies,
            employees,
            planned_absences,
            long_term_absences,
            roster_shifts,
            existing_assignments,
        })
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 解析目标周区间; 年/周非法即校验错误
fn resolve_bounds(year: i32, week: u32) -> ApiResult<WeekBounds> {
    WeekBounds::resolve(year, week)
        .ok_or_else(|| ApiError::InvalidInput(format!("无效的 ISO 周: {}/{}", year, week)))
}

/// 构造未落库的草稿计划 (首次访问/预览)
fn transient_plan(year: i32, week: u32) -> WeeklyPlan {
    let now = Utc::now().naive_utc();
    WeeklyPlan {
        plan_id: Uuid::new_v4().to_string(),
        year,
        week,
        status: PlanStatus::Draft,
        locked_weekdays: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}
