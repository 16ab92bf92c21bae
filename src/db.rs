// ==========================================
// 生产计划工作流 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 保证配置表存在
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置表结构
const CONFIG_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明: foreign_keys 与 busy_timeout 需要"每个连接"单独配置
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

/// 内存数据库（测试、无持久化运行）
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建立配置表（幂等）
pub fn ensure_config_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CONFIG_SCHEMA)
}
