// ==========================================
// 医院周排班系统 - 工作点仓储
// ==========================================
// 职责: 工作点 + 逐工作日设置 + 资质要求的持久化访问
// ==========================================

use crate::domain::types::{CompetencyRelation, Recurrence, RoleCategory};
use crate::domain::workplace::{RequiredCompetency, WeekdaySetting, Workplace};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_datetime, parse_time, DATETIME_FMT, TIME_FMT};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// WorkplaceRepository - 工作点仓储
// ==========================================
pub struct WorkplaceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkplaceRepository {
    /// 创建新的 WorkplaceRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建工作点
    ///
    /// # 返回
    /// - `Ok(workplace_id)`: 新分配的工作点ID
    pub fn create(&self, workplace: &Workplace) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let now = Utc::now().naive_utc().format(DATETIME_FMT).to_string();

        conn.execute(
            r#"INSERT INTO workplace (
                name, in_weekly_plan, active, required_roles, alternative_roles,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &workplace.name,
                workplace.in_weekly_plan,
                workplace.active,
                serde_json::to_string(&workplace.required_roles)
                    .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                serde_json::to_string(&workplace.alternative_roles)
                    .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                &now,
                &now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 按ID查询工作点
    pub fn find_by_id(&self, workplace_id: i64) -> RepositoryResult<Option<Workplace>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT workplace_id, name, in_weekly_plan, active,
                      required_roles, alternative_roles, created_at, updated_at
               FROM workplace
               WHERE workplace_id = ?"#,
            params![workplace_id],
            map_workplace_row,
        ) {
            Ok(workplace) => Ok(Some(workplace)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询纳入周排班的启用工作点,按 (名称, ID) 升序 —— 槽位枚举的确定性来源
    pub fn list_weekly_plan_eligible(&self) -> RepositoryResult<Vec<Workplace>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT workplace_id, name, in_weekly_plan, active,
                      required_roles, alternative_roles, created_at, updated_at
               FROM workplace
               WHERE active = 1 AND in_weekly_plan = 1
               ORDER BY name, workplace_id"#,
        )?;

        let workplaces = stmt
            .query_map([], map_workplace_row)?
            .collect::<Result<Vec<Workplace>, _>>()?;

        Ok(workplaces)
    }

    /// 创建逐工作日设置
    pub fn create_weekday_setting(&self, setting: &WeekdaySetting) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO workplace_weekday_setting (
                workplace_id, weekday, recurrence, closed, closed_reason,
                usage_label, start_time, end_time
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                setting.workplace_id,
                setting.weekday,
                setting.recurrence.to_string(),
                setting.closed,
                &setting.closed_reason,
                &setting.usage_label,
                setting.start_time.map(|t| t.format(TIME_FMT).to_string()),
                setting.end_time.map(|t| t.format(TIME_FMT).to_string()),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 查询周排班工作点的全部逐工作日设置
    pub fn list_weekly_plan_settings(&self) -> RepositoryResult<Vec<WeekdaySetting>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT s.setting_id, s.workplace_id, s.weekday, s.recurrence,
                      s.closed, s.closed_reason, s.usage_label, s.start_time, s.end_time
               FROM workplace_weekday_setting s
               JOIN workplace w ON w.workplace_id = s.workplace_id
               WHERE w.active = 1 AND w.in_weekly_plan = 1
               ORDER BY s.workplace_id, s.weekday, s.setting_id"#,
        )?;

        let settings = stmt
            .query_map([], map_setting_row)?
            .collect::<Result<Vec<WeekdaySetting>, _>>()?;

        Ok(settings)
    }

    /// 创建工作点资质要求
    pub fn create_required_competency(
        &self,
        competency: &RequiredCompetency,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO workplace_required_competency (workplace_id, competency, relation)
               VALUES (?, ?, ?)"#,
            params![
                competency.workplace_id,
                &competency.competency,
                competency.relation.to_string(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 查询周排班工作点的全部资质要求
    pub fn list_weekly_plan_competencies(&self) -> RepositoryResult<Vec<RequiredCompetency>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT c.competency_id, c.workplace_id, c.competency, c.relation
               FROM workplace_required_competency c
               JOIN workplace w ON w.workplace_id = c.workplace_id
               WHERE w.active = 1 AND w.in_weekly_plan = 1
               ORDER BY c.workplace_id, c.competency_id"#,
        )?;

        let competencies = stmt
            .query_map([], map_competency_row)?
            .collect::<Result<Vec<RequiredCompetency>, _>>()?;

        Ok(competencies)
    }
}

// ==========================================
// 行映射
// ==========================================

fn map_workplace_row(row: &Row<'_>) -> rusqlite::Result<Workplace> {
    let required_raw: String = row.get(4)?;
    let alternative_raw: String = row.get(5)?;
    let created_raw: String = row.get(6)?;
    let updated_raw: String = row.get(7)?;

    let required_roles: Vec<RoleCategory> = crate::repository::parse_json(4, &required_raw)?;
    let alternative_roles: Vec<RoleCategory> = crate::repository::parse_json(5, &alternative_raw)?;

    Ok(Workplace {
        workplace_id: row.get(0)?,
        name: row.get(1)?,
        in_weekly_plan: row.get(2)?,
        active: row.get(3)?,
        required_roles,
        alternative_roles,
        created_at: parse_datetime(6, &created_raw)?,
        updated_at: parse_datetime(7, &updated_raw)?,
    })
}

fn map_setting_row(row: &Row<'_>) -> rusqlite::Result<WeekdaySetting> {
    let recurrence_raw: String = row.get(3)?;
    let recurrence = Recurrence::parse(&recurrence_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("未知周期规则: {}", recurrence_raw).into(),
        )
    })?;

    let start_raw: Option<String> = row.get(7)?;
    let end_raw: Option<String> = row.get(8)?;

    Ok(WeekdaySetting {
        setting_id: row.get(0)?,
        workplace_id: row.get(1)?,
        weekday: row.get(2)?,
        recurrence,
        closed: row.get(4)?,
        closed_reason: row.get(5)?,
        usage_label: row.get(6)?,
        start_time: start_raw.as_deref().map(|s| parse_time(7, s)).transpose()?,
        end_time: end_raw.as_deref().map(|s| parse_time(8, s)).transpose()?,
    })
}

fn map_competency_row(row: &Row<'_>) -> rusqlite::Result<RequiredCompetency> {
    let relation_raw: String = row.get(3)?;
    let relation = CompetencyRelation::parse(&relation_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("未知资质关系: {}", relation_raw).into(),
        )
    })?;

    Ok(RequiredCompetency {
        competency_id: row.get(0)?,
        workplace_id: row.get(1)?,
        competency: row.get(2)?,
        relation,
    })
}
