// ==========================================
// 医院周排班系统 - 配置层
// ==========================================

pub mod config_manager;
pub mod rule_config_trait;
pub mod rule_profile;

pub use config_manager::{ConfigManager, DEFAULT_RULE_PROFILE_KEY};
pub use rule_config_trait::RuleConfigReader;
pub use rule_profile::{EmployeeAreaRule, RuleProfile, RuleProfileInput};
