// ==========================================
// 生产计划工作流 - 配置层错误类型
// ==========================================

use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置库访问失败: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("锁获取失败: {0}")]
    LockPoisoned(String),

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },

    #[error("配置快照格式错误: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("配置目录不可用: {0}")]
    Path(String),
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
