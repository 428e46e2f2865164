// ==========================================
// 医院周排班系统 - 员工仓储
// ==========================================
// 职责: 员工 + 缺勤记录 + 值班记录的持久化访问
// ==========================================

use crate::domain::employee::{Employee, LongTermAbsence, PlannedAbsence, RosterShift};
use crate::domain::types::{AbsenceStatus, RoleCategory};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_date, parse_datetime, DATE_FMT, DATETIME_FMT};
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// EmployeeRepository - 员工仓储
// ==========================================
pub struct EmployeeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EmployeeRepository {
    /// 创建新的 EmployeeRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建员工
    ///
    /// # 返回
    /// - `Ok(employee_id)`: 新分配的员工ID
    pub fn create(&self, employee: &Employee) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();

        conn.execute(
            r#"INSERT INTO employee (
                first_name, last_name, role_category, competencies, active,
                inactive_from, inactive_until, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &employee.first_name,
                &employee.last_name,
                employee.role_category.to_string(),
                serde_json::to_string(&employee.competencies)
                    .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                employee.active,
                employee.inactive_from.map(|d| d.format(DATE_FMT).to_string()),
                employee.inactive_until.map(|d| d.format(DATE_FMT).to_string()),
                &now,
                &now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询员工
    pub fn find_by_id(&self, employee_id: i64) -> RepositoryResult<Option<Employee>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT employee_id, first_name, last_name, role_category, competencies,
                      active, inactive_from, inactive_until, created_at, updated_at
               FROM employee
               WHERE employee_id = ?"#,
            params![employee_id],
            map_employee_row,
        ) {
            Ok(employee) => Ok(Some(employee)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询启用员工,按 (姓, 名, ID) 升序 —— 候选评估的确定性来源
    pub fn list_active(&self) -> RepositoryResult<Vec<Employee>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT employee_id, first_name, last_name, role_category, competencies,
                      active, inactive_from, inactive_until, created_at, updated_at
               FROM employee
               WHERE active = 1
               ORDER BY last_name, first_name, employee_id"#,
        )?;

        let employees = stmt
            .query_map([], map_employee_row)?
            .collect::<Result<Vec<Employee>, _>>()?;

        Ok(employees)
    }

    /// 创建计划缺勤
    pub fn create_planned_absence(&self, absence: &PlannedAbsence) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO planned_absence (employee_id, from_date, to_date, status)
               VALUES (?, ?, ?, ?)"#,
            params![
                absence.employee_id,
                absence.from_date.format(DATE_FMT).to_string(),
                absence.to_date.format(DATE_FMT).to_string(),
                absence.status.to_string(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 创建长期缺勤
    pub fn create_long_term_absence(&self, absence: &LongTermAbsence) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO long_term_absence (employee_id, from_date, to_date, status)
               VALUES (?, ?, ?, ?)"#,
            params![
                absence.employee_id,
                absence.from_date.format(DATE_FMT).to_string(),
                absence.to_date.format(DATE_FMT).to_string(),
                absence.status.to_string(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 查询与 [from, to] 区间重叠的计划缺勤
    pub fn list_planned_absences_overlapping(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<PlannedAbsence>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT absence_id, employee_id, from_date, to_date, status
               FROM planned_absence
               WHERE from_date <= ? AND to_date >= ?
               ORDER BY absence_id"#,
        )?;

        let absences = stmt
            .query_map(
                params![to.format(DATE_FMT).to_string(), from.format(DATE_FMT).to_string()],
                map_planned_absence_row,
            )?
            .collect::<Result<Vec<PlannedAbsence>, _>>()?;

        Ok(absences)
    }

    /// 查询与 [from, to] 区间重叠的长期缺勤
    pub fn list_long_term_absences_overlapping(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<LongTermAbsence>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT absence_id, employee_id, from_date, to_date, status
               FROM long_term_absence
               WHERE from_date <= ? AND to_date >= ?
               ORDER BY absence_id"#,
        )?;

        let absences = stmt
            .query_map(
                params![to.format(DATE_FMT).to_string(), from.format(DATE_FMT).to_string()],
                map_long_term_absence_row,
            )?
            .collect::<Result<Vec<LongTermAbsence>, _>>()?;

        Ok(absences)
    }

    /// 创建值班记录
    pub fn create_roster_shift(&self, shift: &RosterShift) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO roster_shift (employee_id, shift_date, overduty, shift_label)
               VALUES (?, ?, ?, ?)"#,
            params![
                shift.employee_id,
                shift.shift_date.format(DATE_FMT).to_string(),
                shift.overduty,
                &shift.shift_label,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 查询 [from, to] 区间内的值班记录 (含目标周前一日,供值班后禁排规则使用)
    pub fn list_roster_shifts_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> RepositoryResult<Vec<RosterShift>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT shift_id, employee_id, shift_date, overduty, shift_label
               FROM roster_shift
               WHERE shift_date >= ? AND shift_date <= ?
               ORDER BY shift_date, shift_id"#,
        )?;

        let shifts = stmt
            .query_map(
                params![from.format(DATE_FMT).to_string(), to.format(DATE_FMT).to_string()],
                map_roster_shift_row,
            )?
            .collect::<Result<Vec<RosterShift>, _>>()?;

        Ok(shifts)
    }
}

// ==========================================
// 行映射
// ==========================================

fn map_employee_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    let role_raw: String = row.get(3)?;
    let role_category = RoleCategory::parse(&role_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("未知角色类别: {}", role_raw).into(),
        )
    })?;

    let competencies_raw: String = row.get(4)?;
    let inactive_from_raw: Option<String> = row.get(6)?;
    let inactive_until_raw: Option<String> = row.get(7)?;
    let created_raw: String = row.get(8)?;
    let updated_raw: String = row.get(9)?;

    Ok(Employee {
        employee_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        role_category,
        competencies: crate::repository::parse_json(4, &competencies_raw)?,
        active: row.get(5)?,
        inactive_from: inactive_from_raw
            .as_deref()
            .map(|s| parse_date(6, s))
            .transpose()?,
        inactive_until: inactive_until_raw
            .as_deref()
            .map(|s| parse_date(7, s))
            .transpose()?,
        created_at: parse_datetime(8, &created_raw)?,
        updated_at: parse_datetime(9, &updated_raw)?,
    })
}

fn parse_absence_status(idx: usize, raw: &str) -> rusqlite::Result<AbsenceStatus> {
    AbsenceStatus::parse(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("未知审批状态: {}", raw).into(),
        )
    })
}

fn map_planned_absence_row(row: &Row<'_>) -> rusqlite::Result<PlannedAbsence> {
    let from_raw: String = row.get(2)?;
    let to_raw: String = row.get(3)?;
    let status_raw: String = row.get(4)?;

    Ok(PlannedAbsence {
        absence_id: row.get(0)?,
        employee_id: row.get(1)?,
        from_date: parse_date(2, &from_raw)?,
        to_date: parse_date(3, &to_raw)?,
        status: parse_absence_status(4, &status_raw)?,
    })
}

fn map_long_term_absence_row(row: &Row<'_>) -> rusqlite::Result<LongTermAbsence> {
    let from_raw: String = row.get(2)?;
    let to_raw: String = row.get(3)?;
    let status_raw: String = row.get(4)?;

    Ok(LongTermAbsence {
        absence_id: row.get(0)?,
        employee_id: row.get(1)?,
        from_date: parse_date(2, &from_raw)?,
        to_date: parse_date(3, &to_raw)?,
        status: parse_absence_status(4, &status_raw)?,
    })
}

fn map_roster_shift_row(row: &Row<'_>) -> rusqlite::Result<RosterShift> {
    let date_raw: String = row.get(2)?;

    Ok(RosterShift {
        shift_id: row.get(0)?,
        employee_id: row.get(1)?,
        shift_date: parse_date(2, &date_raw)?,
        overduty: row.get(3)?,
        shift_label: row.get(4)?,
    })
}
