// ==========================================
// 生产计划工作流 - 配置层
// ==========================================
// 职责: 后端地址、数据来源模式、阶段顺序、默认预测值
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

pub mod config_manager;
pub mod error;

// 重导出核心配置管理器
pub use config_manager::{config_keys, default_config_db_path, ConfigManager, WorkflowConfig};
pub use error::{ConfigError, ConfigResult};
