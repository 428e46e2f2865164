// ==========================================
// 医院周排班系统 - 周计划仓储
// ==========================================
// 职责: 周计划 + 周排班记录的持久化访问
// 红线: 生成批量落库为整事务 —— 要么全部写入,要么一行不写
// ==========================================

use crate::domain::plan::{WeeklyPlan, WeeklyPlanAssignment};
use crate::domain::types::{AssignmentKind, PlanStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_datetime, DATETIME_FMT};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// ==========================================
// WeeklyPlanRepository - 周计划仓储
// ==========================================
pub struct WeeklyPlanRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WeeklyPlanRepository {
    /// 创建新的 WeeklyPlanRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建周计划
    ///
    /// # 返回
    /// - `Ok(plan_id)`: 成功,返回 plan_id
    pub fn create(&self, plan: &WeeklyPlan) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO weekly_plan (
                plan_id, year, week, status, locked_weekdays, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &plan.plan_id,
                plan.year,
                plan.week,
                plan.status.to_string(),
                serde_json::to_string(&plan.locked_weekdays)
                    .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                plan.created_at.format(DATETIME_FMT).to_string(),
                plan.updated_at.format(DATETIME_FMT).to_string(),
            ],
        )?;

        Ok(plan.plan_id.clone())
    }

    /// 按 (year, week) 查询周计划
    pub fn find_by_week(&self, year: i32, week: u32) -> RepositoryResult<Option<WeeklyPlan>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT plan_id, year, week, status, locked_weekdays, created_at, updated_at
               FROM weekly_plan
               WHERE year = ? AND week = ?"#,
            params![year, week],
            map_plan_row,
        ) {
            Ok(plan) => Ok(Some(plan)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 更新周计划状态
    ///
    /// 说明: 转换合法性由 API 层校验,仓储只负责落库
    pub fn update_status(&self, plan_id: &str, status: PlanStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();

        let affected = conn.execute(
            "UPDATE weekly_plan SET status = ?, updated_at = ? WHERE plan_id = ?",
            params![status.to_string(), &now, plan_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "WeeklyPlan".to_string(),
                id: plan_id.to_string(),
            });
        }

        Ok(())
    }

    /// 更新封锁工作日列表
    pub fn update_locked_weekdays(
        &self,
        plan_id: &str,
        locked_weekdays: &[u32],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();

        let affected = conn.execute(
            "UPDATE weekly_plan SET locked_weekdays = ?, updated_at = ? WHERE plan_id = ?",
            params![
                serde_json::to_string(locked_weekdays)
                    .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                &now,
                plan_id
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "WeeklyPlan".to_string(),
                id: plan_id.to_string(),
            });
        }

        Ok(())
    }
}

// ==========================================
// AssignmentRepository - 周排班记录仓储
// ==========================================
pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
    /// 创建新的 AssignmentRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建单条排班记录 (人工编辑路径)
    pub fn create(&self, assignment: &WeeklyPlanAssignment) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_assignment(&conn, assignment)?;
        Ok(assignment.assignment_id.clone())
    }

    /// 按ID查询排班记录
    pub fn find_by_id(&self, assignment_id: &str) -> RepositoryResult<Option<WeeklyPlanAssignment>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT assignment_id, plan_id, weekday, workplace_id, employee_id,
                      label, blocked, kind, created_at, updated_at
               FROM weekly_plan_assignment
               WHERE assignment_id = ?"#,
            params![assignment_id],
            map_assignment_row,
        ) {
            Ok(assignment) => Ok(Some(assignment)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询周计划的全部排班记录,按 (工作日, 工作点, 记录ID) 升序
    pub fn list_by_plan(&self, plan_id: &str) -> RepositoryResult<Vec<WeeklyPlanAssignment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT assignment_id, plan_id, weekday, workplace_id, employee_id,
                      label, blocked, kind, created_at, updated_at
               FROM weekly_plan_assignment
               WHERE plan_id = ?
               ORDER BY weekday, workplace_id, assignment_id"#,
        )?;

        let assignments = stmt
            .query_map(params![plan_id], map_assignment_row)?
            .collect::<Result<Vec<WeeklyPlanAssignment>, _>>()?;

        Ok(assignments)
    }

    /// 删除单条排班记录
    pub fn delete(&self, assignment_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let affected = conn.execute(
            "DELETE FROM weekly_plan_assignment WHERE assignment_id = ?",
            params![assignment_id],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "WeeklyPlanAssignment".to_string(),
                id: assignment_id.to_string(),
            });
        }

        Ok(())
    }

    /// 批量落库引擎生成的排班 (apply 步骤)
    ///
    /// 事务内先重读占用槽位 (人员或封锁),过滤后仅插入剩余部分 ——
    /// 对并发竞争的防御; 整批要么全部写入要么回滚
    ///
    /// # 返回
    /// - `Ok(count)`: 实际插入的行数
    pub fn insert_generated_batch(
        &self,
        plan_id: &str,
        rows: &[WeeklyPlanAssignment],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 事务内重算占用槽位键
        let occupied: HashSet<(u32, i64)> = {
            let mut stmt = tx.prepare(
                r#"SELECT weekday, workplace_id
                   FROM weekly_plan_assignment
                   WHERE plan_id = ? AND (employee_id IS NOT NULL OR blocked = 1)"#,
            )?;
            let result = stmt
                .query_map(params![plan_id], |row| {
                    Ok((row.get::<_, u32>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<Result<HashSet<(u32, i64)>, _>>()?;
            result
        };

        let mut inserted = 0usize;
        for assignment in rows {
            if occupied.contains(&assignment.slot_key()) {
                continue;
            }
            insert_assignment(&tx, assignment)?;
            inserted += 1;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(inserted)
    }
}

// ==========================================
// 行映射与插入
// ==========================================

fn insert_assignment(conn: &Connection, assignment: &WeeklyPlanAssignment) -> RepositoryResult<()> {
    conn.execute(
        r#"INSERT INTO weekly_plan_assignment (
            assignment_id, plan_id, weekday, workplace_id, employee_id,
            label, blocked, kind, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        params![
            &assignment.assignment_id,
            &assignment.plan_id,
            assignment.weekday,
            assignment.workplace_id,
            assignment.employee_id,
            &assignment.label,
            assignment.blocked,
            assignment.kind.to_string(),
            assignment.created_at.format(DATETIME_FMT).to_string(),
            assignment.updated_at.format(DATETIME_FMT).to_string(),
        ],
    )?;

    Ok(())
}

fn map_plan_row(row: &Row<'_>) -> rusqlite::Result<WeeklyPlan> {
    let status_raw: String = row.get(3)?;
    let status = PlanStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("未知计划状态: {}", status_raw).into(),
        )
    })?;

    let locked_raw: String = row.get(4)?;
    let created_raw: String = row.get(5)?;
    let updated_raw: String = row.get(6)?;

    Ok(WeeklyPlan {
        plan_id: row.get(0)?,
        year: row.get(1)?,
        week: row.get(2)?,
        status,
        locked_weekdays: crate::repository::parse_json(4, &locked_raw)?,
        created_at: parse_datetime(5, &created_raw)?,
        updated_at: parse_datetime(6, &updated_raw)?,
    })
}

fn map_assignment_row(row: &Row<'_>) -> rusqlite::Result<WeeklyPlanAssignment> {
    let kind_raw: String = row.get(7)?;
    let kind = AssignmentKind::parse(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            7,
            rusqlite::types::Type::Text,
            format!("未知记录来源: {}", kind_raw).into(),
        )
    })?;

    let created_raw: String = row.get(8)?;
    let updated_raw: String = row.get(9)?;

    Ok(WeeklyPlanAssignment {
        assignment_id: row.get(0)?,
        plan_id: row.get(1)?,
        weekday: row.get(2)?,
        workplace_id: row.get(3)?,
        employee_id: row.get(4)?,
        label: row.get(5)?,
        blocked: row.get(6)?,
        kind,
        created_at: parse_datetime(8, &created_raw)?,
        updated_at: parse_datetime(9, &updated_raw)?,
    })
}
