// ==========================================
// 医院周排班系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use crate::api::PlanApi;
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{EmployeeRepository, WorkplaceRepository};
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 周计划API
    pub plan_api: Arc<PlanApi>,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 工作点仓储 (主数据维护)
    pub workplace_repo: Arc<WorkplaceRepository>,

    /// 员工仓储 (主数据维护)
    pub employee_repo: Arc<EmployeeRepository>,
}

impl AppState {
    /// 初始化应用状态
    ///
    /// 打开数据库连接,应用统一 PRAGMA 并确保 schema 就绪
    pub fn new(db_path: String) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(&db_path)?;
        init_schema(&conn)?;
        let conn = Arc::new(Mutex::new(conn));

        Self::from_connection(db_path, conn)
    }

    /// 从已有连接装配 (测试路径)
    pub fn from_connection(
        db_path: String,
        conn: Arc<Mutex<Connection>>,
    ) -> Result<Self, Box<dyn Error>> {
        let config = Arc::new(ConfigManager::from_connection(conn.clone())?);

        Ok(Self {
            db_path,
            plan_api: Arc::new(PlanApi::new(conn.clone(), config.clone())),
            config,
            workplace_repo: Arc::new(WorkplaceRepository::new(conn.clone())),
            employee_repo: Arc::new(EmployeeRepository::new(conn)),
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用系统数据目录,不可用时回落到当前目录
pub fn get_default_db_path() -> String {
    match dirs::data_dir() {
        Some(dir) => {
            let app_dir = dir.join("clinic-weekplan");
            if let Err(e) = std::fs::create_dir_all(&app_dir) {
                tracing::warn!(error = %e, "创建数据目录失败,回落到当前目录");
                return "clinic_weekplan.db".to_string();
            }
            app_dir
                .join("clinic_weekplan.db")
                .to_string_lossy()
                .to_string()
        }
        None => "clinic_weekplan.db".to_string(),
    }
}
