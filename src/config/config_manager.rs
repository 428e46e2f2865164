// ==========================================
// 医院周排班系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value)
// ==========================================

use crate::config::rule_config_trait::RuleConfigReader;
use crate::config::rule_profile::RuleProfileInput;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 默认规则档案的存储键
pub const DEFAULT_RULE_PROFILE_KEY: &str = "planning.default_rule_profile";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致,会对传入连接再次应用统一 PRAGMA (幂等)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 参数
    /// - key: 配置键
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 键不存在
    pub fn get_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("锁获取失败: {}", e))?;

        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入配置值 (存在则覆盖)
    pub fn set_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"INSERT INTO config_kv (key, value, updated_at)
               VALUES (?, ?, datetime('now'))
               ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                              updated_at = excluded.updated_at"#,
            params![key, value],
        )?;

        Ok(())
    }

    /// 持久化默认规则档案 (JSON)
    pub fn save_default_rule_profile(
        &self,
        profile: &RuleProfileInput,
    ) -> Result<(), Box<dyn Error>> {
        let raw = serde_json::to_string(profile)?;
        self.set_value(DEFAULT_RULE_PROFILE_KEY, &raw)
    }
}

// ==========================================
// RuleConfigReader 实现
// ==========================================
#[async_trait]
impl RuleConfigReader for ConfigManager {
    async fn default_rule_profile(&self) -> Result<Option<RuleProfileInput>, Box<dyn Error>> {
        let raw = match self.get_value(DEFAULT_RULE_PROFILE_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        // 存档损坏不阻断生成,降级为无存档
        match serde_json::from_str::<RuleProfileInput>(&raw) {
            Ok(profile) => Ok(Some(profile)),
            Err(e) => {
                warn!(key = DEFAULT_RULE_PROFILE_KEY, error = %e, "默认规则档案解析失败,降级为全默认");
                Ok(None)
            }
        }
    }
}
