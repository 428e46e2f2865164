// ==========================================
// 医院周排班系统 - 数据仓储层
// ==========================================
// 约定: 时间戳以 "%Y-%m-%d %H:%M:%S" 存储,
//       日期以 "%Y-%m-%d" 存储, JSON 数组列以 TEXT 存储
// ==========================================

pub mod employee_repo;
pub mod error;
pub mod weekplan_repo;
pub mod workplace_repo;

pub use employee_repo::EmployeeRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use weekplan_repo::{AssignmentRepository, WeeklyPlanRepository};
pub use workplace_repo::WorkplaceRepository;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::de::DeserializeOwned;

/// 时间戳存储格式
pub(crate) const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
/// 日期存储格式
pub(crate) const DATE_FMT: &str = "%Y-%m-%d";
/// 时刻存储格式
pub(crate) const TIME_FMT: &str = "%H:%M";

/// 行内字符串 → NaiveDateTime (map_row 专用)
pub(crate) fn parse_datetime(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FMT)
        .map_err(|e| conversion_error(idx, e))
}

/// 行内字符串 → NaiveDate (map_row 专用)
pub(crate) fn parse_date(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FMT).map_err(|e| conversion_error(idx, e))
}

/// 行内字符串 → NaiveTime (map_row 专用)
pub(crate) fn parse_time(idx: usize, raw: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_FMT).map_err(|e| conversion_error(idx, e))
}

/// 行内 JSON 列 → 值 (map_row 专用)
pub(crate) fn parse_json<T: DeserializeOwned>(idx: usize, raw: &str) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|e| conversion_error(idx, e))
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}
