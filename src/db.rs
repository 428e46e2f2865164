// ==========================================
// 医院周排班系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表逻辑集中一处，应用与测试共用同一份 schema
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// JSON 数组列（角色列表/资质标签/封锁工作日）以 TEXT 存储
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS workplace (
            workplace_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            in_weekly_plan INTEGER NOT NULL DEFAULT 1,
            active INTEGER NOT NULL DEFAULT 1,
            required_roles TEXT NOT NULL DEFAULT '[]',
            alternative_roles TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS workplace_weekday_setting (
            setting_id INTEGER PRIMARY KEY AUTOINCREMENT,
            workplace_id INTEGER NOT NULL REFERENCES workplace(workplace_id) ON DELETE CASCADE,
            weekday INTEGER NOT NULL CHECK (weekday BETWEEN 1 AND 7),
            recurrence TEXT NOT NULL,
            closed INTEGER NOT NULL DEFAULT 0,
            closed_reason TEXT,
            usage_label TEXT,
            start_time TEXT,
            end_time TEXT
        );

        CREATE TABLE IF NOT EXISTS workplace_required_competency (
            competency_id INTEGER PRIMARY KEY AUTOINCREMENT,
            workplace_id INTEGER NOT NULL REFERENCES workplace(workplace_id) ON DELETE CASCADE,
            competency TEXT NOT NULL,
            relation TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS employee (
            employee_id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            role_category TEXT NOT NULL,
            competencies TEXT NOT NULL DEFAULT '[]',
            active INTEGER NOT NULL DEFAULT 1,
            inactive_from TEXT,
            inactive_until TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS planned_absence (
            absence_id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL REFERENCES employee(employee_id) ON DELETE CASCADE,
            from_date TEXT NOT NULL,
            to_date TEXT NOT NULL,
            status TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS long_term_absence (
            absence_id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL REFERENCES employee(employee_id) ON DELETE CASCADE,
            from_date TEXT NOT NULL,
            to_date TEXT NOT NULL,
            status TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS roster_shift (
            shift_id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_id INTEGER NOT NULL REFERENCES employee(employee_id) ON DELETE CASCADE,
            shift_date TEXT NOT NULL,
            overduty INTEGER NOT NULL DEFAULT 0,
            shift_label TEXT
        );

        CREATE TABLE IF NOT EXISTS weekly_plan (
            plan_id TEXT PRIMARY KEY,
            year INTEGER NOT NULL,
            week INTEGER NOT NULL CHECK (week BETWEEN 1 AND 53),
            status TEXT NOT NULL DEFAULT 'DRAFT',
            locked_weekdays TEXT NOT NULL DEFAULT '[]',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (year, week)
        );

        CREATE TABLE IF NOT EXISTS weekly_plan_assignment (
            assignment_id TEXT PRIMARY KEY,
            plan_id TEXT NOT NULL REFERENCES weekly_plan(plan_id) ON DELETE CASCADE,
            weekday INTEGER NOT NULL CHECK (weekday BETWEEN 1 AND 7),
            workplace_id INTEGER NOT NULL REFERENCES workplace(workplace_id),
            employee_id INTEGER REFERENCES employee(employee_id),
            label TEXT,
            blocked INTEGER NOT NULL DEFAULT 0,
            kind TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_assignment_plan_slot
            ON weekly_plan_assignment (plan_id, weekday, workplace_id);

        -- 引擎生成行的槽位唯一约束: 并发 apply 收敛为单一胜者
        CREATE UNIQUE INDEX IF NOT EXISTS idx_assignment_generated_slot
            ON weekly_plan_assignment (plan_id, weekday, workplace_id)
            WHERE kind = 'PLAN';

        CREATE INDEX IF NOT EXISTS idx_roster_shift_date ON roster_shift (shift_date);
        CREATE INDEX IF NOT EXISTS idx_planned_absence_employee ON planned_absence (employee_id);
        CREATE INDEX IF NOT EXISTS idx_long_term_absence_employee ON long_term_absence (employee_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_absent_without_init() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
