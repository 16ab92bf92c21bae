// ==========================================
// 生产计划工作流 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写、快照/恢复
// 存储: config_kv 表 (key-value + scope)
// 红线: 缺失的配置取默认值,格式错误的配置报错,不静默替换
// ==========================================

use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::routes::DEFAULT_BASE_URL;
use crate::config::error::{ConfigError, ConfigResult};
use crate::db::{configure_sqlite_connection, ensure_config_schema, open_in_memory_connection, open_sqlite_connection};
use crate::domain::forecast::Forecast;
use crate::domain::types::{HydrationMode, StageKey};

/// 全局作用域
const GLOBAL_SCOPE: &str = "global";

/// 默认请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// 默认首个计划期
pub const DEFAULT_FIRST_PERIOD: u32 = 5;

// ==========================================
// 配置键定义
// ==========================================
pub mod config_keys {
    // 后端
    pub const BACKEND_BASE_URL: &str = "backend.base_url";
    pub const BACKEND_TIMEOUT_SECS: &str = "backend.timeout_secs";

    // 工作流
    pub const HYDRATION_MODE: &str = "workflow.hydration_mode"; // seed | backend
    pub const STAGE_ORDER: &str = "workflow.stage_order"; // 逗号分隔的阶段键
    pub const FIRST_PLANNING_PERIOD: &str = "workflow.first_planning_period";

    // 默认预测值（未导入 XML 时使用）
    pub const FORECAST_DEFAULT_P1: &str = "forecast.default_p1";
    pub const FORECAST_DEFAULT_P2: &str = "forecast.default_p2";
    pub const FORECAST_DEFAULT_P3: &str = "forecast.default_p3";
}

// ==========================================
// WorkflowConfig - 类型化配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub backend_base_url: String,
    pub backend_timeout_secs: u64,
    pub hydration_mode: HydrationMode,
    pub stage_order: Vec<StageKey>,
    pub first_planning_period: u32,
    pub default_forecast: Forecast,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            backend_base_url: DEFAULT_BASE_URL.to_string(),
            backend_timeout_secs: DEFAULT_TIMEOUT_SECS,
            hydration_mode: HydrationMode::Seed,
            stage_order: StageKey::DEFAULT_ORDER.to_vec(),
            first_planning_period: DEFAULT_FIRST_PERIOD,
            default_forecast: Forecast::default(),
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（文件库,自动建表）
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_config_schema(&conn)?;
        tracing::debug!("配置库已打开: {}", db_path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 内存配置库
    pub fn in_memory() -> ConfigResult<Self> {
        let conn = open_in_memory_connection()?;
        ensure_config_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 会对传入连接再次应用统一 PRAGMA 并建表（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::LockPoisoned(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
            ensure_config_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockPoisoned(e.to_string()))
    }

    // ==========================================
    // 键值读写
    // ==========================================

    /// 读取 global scope 的配置值
    pub fn get(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.lock()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（存在则覆盖）
    pub fn set(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::debug!("配置已更新: {} = {}", key, value);
        Ok(())
    }

    /// 删除配置值,返回是否存在
    pub fn remove(&self, key: &str) -> ConfigResult<bool> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(affected > 0)
    }

    /// 全部 global 配置（按键排序）
    pub fn list(&self) -> ConfigResult<BTreeMap<String, String>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }

    // ==========================================
    // 快照 / 恢复
    // ==========================================

    /// 所有配置的快照（JSON 格式）
    pub fn snapshot(&self) -> ConfigResult<String> {
        let config_map = self.list()?;
        Ok(serde_json::to_string(&config_map)?)
    }

    /// 从快照恢复配置（覆盖同名键,不删除快照外的键）
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let config_map: BTreeMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut count = 0;
        for (key, value) in &config_map {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
                params![GLOBAL_SCOPE, key, value],
            )?;
        }
        tx.commit()?;

        tracing::info!("配置已从快照恢复: {} 项", count);
        Ok(count)
    }

    // ==========================================
    // 类型化配置
    // ==========================================

    /// 读取工作流配置（缺失项取默认值）
    pub fn load_workflow_config(&self) -> ConfigResult<WorkflowConfig> {
        let defaults = WorkflowConfig::default();

        let backend_base_url = match self.get(config_keys::BACKEND_BASE_URL)? {
            Some(url) => parse_base_url(&url)?,
            None => defaults.backend_base_url,
        };

        let backend_timeout_secs = match self.get(config_keys::BACKEND_TIMEOUT_SECS)? {
            Some(raw) => parse_positive::<u64>(config_keys::BACKEND_TIMEOUT_SECS, &raw)?,
            None => defaults.backend_timeout_secs,
        };

        let hydration_mode = match self.get(config_keys::HYDRATION_MODE)? {
            Some(raw) => raw
                .parse::<HydrationMode>()
                .map_err(|message| invalid(config_keys::HYDRATION_MODE, &raw, message))?,
            None => defaults.hydration_mode,
        };

        let stage_order = match self.get(config_keys::STAGE_ORDER)? {
            Some(raw) => parse_stage_order(&raw)?,
            None => defaults.stage_order,
        };

        let first_planning_period = match self.get(config_keys::FIRST_PLANNING_PERIOD)? {
            Some(raw) => parse_positive::<u32>(config_keys::FIRST_PLANNING_PERIOD, &raw)?,
            None => defaults.first_planning_period,
        };

        let forecast_value = |key: &str, default: &str| -> ConfigResult<String> {
            match self.get(key)? {
                Some(raw) => {
                    let trimmed = raw.trim();
                    trimmed
                        .parse::<u64>()
                        .map_err(|e| invalid(key, &raw, e.to_string()))?;
                    Ok(trimmed.to_string())
                }
                None => Ok(default.to_string()),
            }
        };
        let default_forecast = Forecast::new(
            forecast_value(config_keys::FORECAST_DEFAULT_P1, &defaults.default_forecast.p1)?,
            forecast_value(config_keys::FORECAST_DEFAULT_P2, &defaults.default_forecast.p2)?,
            forecast_value(config_keys::FORECAST_DEFAULT_P3, &defaults.default_forecast.p3)?,
        );

        let config = WorkflowConfig {
            backend_base_url,
            backend_timeout_secs,
            hydration_mode,
            stage_order,
            first_planning_period,
            default_forecast,
        };
        tracing::debug!(
            "工作流配置: mode={}, stages={}, first_period={}",
            config.hydration_mode,
            config.stage_order.len(),
            config.first_planning_period
        );
        Ok(config)
    }
}

fn invalid(key: &str, value: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.into(),
    }
}

fn parse_base_url(raw: &str) -> ConfigResult<String> {
    let url = raw.trim().trim_end_matches('/');
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(invalid(
            config_keys::BACKEND_BASE_URL,
            raw,
            "必须以 http:// 或 https:// 开头",
        ));
    }
    Ok(url.to_string())
}

fn parse_positive<T>(key: &str, raw: &str) -> ConfigResult<T>
where
    T: std::str::FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
{
    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|e| invalid(key, raw, e.to_string()))?;
    if value <= T::default() {
        return Err(invalid(key, raw, "必须大于 0"));
    }
    Ok(value)
}

/// 解析阶段顺序（逗号分隔）;空值取默认顺序,重复阶段报错
fn parse_stage_order(raw: &str) -> ConfigResult<Vec<StageKey>> {
    let mut stages = Vec::new();
    let mut seen = HashSet::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let stage = part
            .parse::<StageKey>()
            .map_err(|message| invalid(config_keys::STAGE_ORDER, raw, message))?;
        if !seen.insert(stage) {
            return Err(invalid(
                config_keys::STAGE_ORDER,
                raw,
                format!("阶段重复: {}", stage),
            ));
        }
        stages.push(stage);
    }

    if stages.is_empty() {
        return Ok(StageKey::DEFAULT_ORDER.to_vec());
    }
    Ok(stages)
}

/// 获取默认配置库路径
///
/// # 返回
/// - 环境变量 PLANNING_WIZARD_DB_PATH（若设置）
/// - 用户配置目录/xml-planning-editor/planning.db
/// - 回退: ./planning.db
pub fn default_config_db_path() -> ConfigResult<String> {
    if let Ok(path) = std::env::var("PLANNING_WIZARD_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    let path = match dirs::config_dir() {
        Some(config_dir) => {
            let dir = config_dir.join("xml-planning-editor");
            std::fs::create_dir_all(&dir)
                .map_err(|e| ConfigError::Path(format!("{}: {}", dir.display(), e)))?;
            dir.join("planning.db")
        }
        None => PathBuf::from("./planning.db"),
    };
    Ok(path.to_string_lossy().to_string())
}
