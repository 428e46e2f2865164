// ==========================================
// 医院周排班系统 - 规则配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口 (不包含实现)
// 红线: 不包含配置写入、不包含业务逻辑;
//       引擎自身不持有进程级默认档案状态
// ==========================================

use crate::config::rule_profile::RuleProfileInput;
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// RuleConfigReader Trait
// ==========================================
// 实现者: ConfigManager (从 config_kv 表读取)
// 测试中可用内存 mock 替代
#[async_trait]
pub trait RuleConfigReader: Send + Sync {
    /// 获取持久化的默认规则档案
    ///
    /// # 返回
    /// - Some(RuleProfileInput): 存在已存档案 (仍为宽松形式,由归一化收口)
    /// - None: 无存档或存档无法解析 (降级为全默认)
    async fn default_rule_profile(&self) -> Result<Option<RuleProfileInput>, Box<dyn Error>>;
}
