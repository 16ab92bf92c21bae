// ==========================================
// 生产计划工作流 - 后端客户端
// ==========================================
// 职责: 定义后端访问接口,提供 HTTP 实现与按阶段的类型化读写
// 红线: 客户端只返回结果,不写存储（写入由 StageHydrator 决定）
// ==========================================

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::api::error::{FetchError, FetchResult};
use crate::api::routes::{stage_route, ApiRoutes};
use crate::config::WorkflowConfig;
use crate::domain::forecast::{Forecast, WarehouseStock};
use crate::domain::stage::StagePayload;
use crate::domain::types::StageKey;
use crate::importer::PlanningDocument;

// ==========================================
// PlanningBackend Trait
// ==========================================

/// 后端访问接口（JSON 读写）
#[async_trait]
pub trait PlanningBackend: Send + Sync {
    /// GET 接口,返回 JSON
    async fn get_json(&self, route: &str) -> FetchResult<Value>;

    /// POST JSON,返回 JSON（空响应体为 Null）
    async fn post_json(&self, route: &str, body: &Value) -> FetchResult<Value>;
}

// ==========================================
// HttpPlanningBackend - reqwest 实现
// ==========================================
pub struct HttpPlanningBackend {
    client: Client,
    base_url: String,
}

impl HttpPlanningBackend {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> FetchResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Config(format!("HTTP 客户端创建失败: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &WorkflowConfig) -> FetchResult<Self> {
        Self::new(
            config.backend_base_url.clone(),
            Duration::from_secs(config.backend_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    async fn read_response(route: &str, response: reqwest::Response) -> FetchResult<Value> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                route: route.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            route: route.to_string(),
            message: e.to_string(),
        })?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| FetchError::Decode {
            route: route.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl PlanningBackend for HttpPlanningBackend {
    async fn get_json(&self, route: &str) -> FetchResult<Value> {
        tracing::debug!("GET {}", self.url(route));
        let response = self
            .client
            .get(self.url(route))
            .send()
            .await
            .map_err(|e| FetchError::Network {
                route: route.to_string(),
                message: e.to_string(),
            })?;
        Self::read_response(route, response).await
    }

    async fn post_json(&self, route: &str, body: &Value) -> FetchResult<Value> {
        tracing::debug!("POST {}", self.url(route));
        let response = self
            .client
            .post(self.url(route))
            .json(body)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                route: route.to_string(),
                message: e.to_string(),
            })?;
        Self::read_response(route, response).await
    }
}

// ==========================================
// 类型化读写
// ==========================================

fn decode<T: DeserializeOwned>(route: &str, value: Value) -> FetchResult<T> {
    serde_json::from_value(value).map_err(|e| FetchError::Decode {
        route: route.to_string(),
        message: e.to_string(),
    })
}

/// 读取阶段数据（生产计划接口返回裸数组时自动包装）
pub async fn fetch_stage(backend: &dyn PlanningBackend, stage: StageKey) -> FetchResult<StagePayload> {
    let route = stage_route(stage);
    let value = backend.get_json(route).await?;
    StagePayload::from_json(stage, value).map_err(|e| FetchError::Decode {
        route: route.to_string(),
        message: e.to_string(),
    })
}

/// 保存阶段数据
pub async fn save_stage(backend: &dyn PlanningBackend, payload: &StagePayload) -> FetchResult<()> {
    let route = stage_route(payload.stage_key());
    let body = payload.to_json().map_err(|e| anyhow::anyhow!("阶段数据编码失败: {}", e))?;
    backend.post_json(route, &body).await?;
    tracing::info!("阶段 {} 已保存到后端", payload.stage_key());
    Ok(())
}

pub async fn fetch_forecast(backend: &dyn PlanningBackend) -> FetchResult<Forecast> {
    let value = backend.get_json(ApiRoutes::FORECAST).await?;
    decode(ApiRoutes::FORECAST, value)
}

pub async fn fetch_warehouse_stock(backend: &dyn PlanningBackend) -> FetchResult<WarehouseStock> {
    let value = backend.get_json(ApiRoutes::WAREHOUSE_STOCK).await?;
    decode(ApiRoutes::WAREHOUSE_STOCK, value)
}

/// 产能汇总（结构由后端决定,原样返回）
pub async fn fetch_capacity_sum_up(backend: &dyn PlanningBackend) -> FetchResult<Value> {
    backend.get_json(ApiRoutes::CAPACITY_PLAN_SUM_UP).await
}

/// 触发结果重算并重新读取结果
pub async fn refresh_results(backend: &dyn PlanningBackend) -> FetchResult<StagePayload> {
    backend.post_json(ApiRoutes::RESULTS_REFRESH, &Value::Null).await?;
    fetch_stage(backend, StageKey::Results).await
}

/// 上传导入的 XML 文档（元素树的 JSON 形式）
pub async fn import_document(
    backend: &dyn PlanningBackend,
    document: &PlanningDocument,
) -> FetchResult<()> {
    let body = serde_json::to_value(document.root())
        .map_err(|e| anyhow::anyhow!("XML 文档编码失败: {}", e))?;
    backend.post_json(ApiRoutes::IMPORT, &body).await?;
    tracing::info!("XML 文档已上传: period={:?}", document.period());
    Ok(())
}
