// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时配置库、样例 XML、样例阶段数据、模拟后端
// ==========================================

#![allow(dead_code)]

use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;
use tokio::sync::Notify;

use xml_planning_editor::api::{FetchError, FetchResult, PlanningBackend};
use xml_planning_editor::db::{ensure_config_schema, open_sqlite_connection};
use xml_planning_editor::domain::{PeriodQuantities, ProductItem, ProductionProgramData, StagePayload};

/// 上期结果样例（含未识别的附加段）
pub const SAMPLE_RESULTS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<results game="12" group="3" period="4">
  <forecast p1="200" p2="150" p3="100"/>
  <warehousestock>
    <article id="1" amount="100" startamount="100" pct="100.0" price="156.13" stockvalue="15613.00"/>
    <article id="2" amount="100" startamount="100" pct="100.0" price="163.33" stockvalue="16333.00"/>
    <article id="3" amount="100" startamount="100" pct="100.0" price="165.13" stockvalue="16513.00"/>
    <article id="51" amount="60" startamount="100" pct="60.0" price="10.00" stockvalue="600.00"/>
    <totalstockvalue>49059.00</totalstockvalue>
  </warehousestock>
  <inwardstockmovement>
    <order orderperiod="3" id="1" mode="5" article="21" amount="300" time="5040" materialcosts="1800.00"/>
  </inwardstockmovement>
  <idletimecosts>
    <workplace id="1" setupevents="0" idletime="0" wageidletimecosts="0.00"/>
    <sum setupevents="0" idletime="0" wageidletimecosts="0.00"/>
  </idletimecosts>
</results>"#;

// ==========================================
// 配置库
// ==========================================

/// 创建临时配置库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    ensure_config_schema(&conn)?;

    Ok((temp_file, db_path))
}

pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(open_sqlite_connection(db_path)?)
}

/// 直接写入 global 配置
pub fn insert_test_config(conn: &Connection, entries: &[(&str, &str)]) -> Result<(), Box<dyn Error>> {
    for (key, value) in entries {
        conn.execute(
            "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
            params![key, value],
        )?;
    }
    Ok(())
}

// ==========================================
// 样例阶段数据
// ==========================================

/// 单产品、单期的生产计划数据
pub fn program_payload(sales: &str, production: &str) -> StagePayload {
    let mut periods = BTreeMap::new();
    periods.insert("5".to_string(), PeriodQuantities::new(sales, production));
    StagePayload::ProductionProgram(ProductionProgramData {
        products: vec![ProductItem {
            id: "P1".to_string(),
            name: "P1".to_string(),
            periods,
        }],
    })
}

// ==========================================
// MockBackend - 模拟计划后端
// ==========================================

/// 一次性闸门: 请求到达时通知 entered,等待 release 后才返回
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub struct MockBackend {
    responses: Mutex<HashMap<String, FetchOutcome>>,
    gates: Mutex<HashMap<String, Arc<Gate>>>,
    posted: Mutex<Vec<(String, Value)>>,
    get_count: Mutex<HashMap<String, usize>>,
}

#[derive(Clone)]
enum FetchOutcome {
    Json(Value),
    Status(u16),
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, route: &str, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(route.to_string(), FetchOutcome::Json(value));
    }

    pub fn fail(&self, route: &str, status: u16) {
        self.responses
            .lock()
            .unwrap()
            .insert(route.to_string(), FetchOutcome::Status(status));
    }

    /// 为下一次 GET 请求安装闸门（响应在请求到达时确定）
    pub fn gate(&self, route: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates
            .lock()
            .unwrap()
            .insert(route.to_string(), gate.clone());
        gate
    }

    pub fn posted(&self) -> Vec<(String, Value)> {
        self.posted.lock().unwrap().clone()
    }

    pub fn get_count(&self, route: &str) -> usize {
        self.get_count.lock().unwrap().get(route).copied().unwrap_or(0)
    }
}

#[async_trait]
impl PlanningBackend for MockBackend {
    async fn get_json(&self, route: &str) -> FetchResult<Value> {
        *self
            .get_count
            .lock()
            .unwrap()
            .entry(route.to_string())
            .or_insert(0) += 1;

        let outcome = self.responses.lock().unwrap().get(route).cloned();
        let gate = self.gates.lock().unwrap().remove(route);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        match outcome {
            Some(FetchOutcome::Json(value)) => Ok(value),
            Some(FetchOutcome::Status(status)) => Err(FetchError::Status {
                route: route.to_string(),
                status,
            }),
            None => Err(FetchError::Status {
                route: route.to_string(),
                status: 404,
            }),
        }
    }

    async fn post_json(&self, route: &str, body: &Value) -> FetchResult<Value> {
        self.posted
            .lock()
            .unwrap()
            .push((route.to_string(), body.clone()));
        Ok(Value::Null)
    }
}
