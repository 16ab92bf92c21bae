// ==========================================
// 生产计划工作流 - 阶段数据装载
// ==========================================
// 职责: 进入阶段时装载数据（本地生成 或 后端读取）,保存当前阶段数据
// 红线: 装载结果只在票据仍有效时写入（无更新的装载、无导航）
// 红线: 读取失败不修改存储,错误交给调用方作为提示展示
// ==========================================

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::api::client::{fetch_stage, save_stage, PlanningBackend};
use crate::api::error::{FetchError, FetchResult};
use crate::domain::forecast::Forecast;
use crate::domain::types::{HydrationMode, StageKey};
use crate::engine::seed::StageSeeder;
use crate::engine::store::WorkflowStore;

/// 装载结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// 已写入存储
    Applied,
    /// 装载期间被更新的装载或导航取代,结果丢弃
    Discarded,
    /// 已有数据,未装载
    Kept,
}

// ==========================================
// StageHydrator
// ==========================================
pub struct StageHydrator {
    store: Arc<WorkflowStore>,
    mode: HydrationMode,
    backend: Option<Arc<dyn PlanningBackend>>,
    default_forecast: Forecast,
    first_period: AtomicU32,
}

impl StageHydrator {
    /// 本地生成模式
    pub fn seeded(store: Arc<WorkflowStore>, default_forecast: Forecast, first_period: u32) -> Self {
        Self {
            store,
            mode: HydrationMode::Seed,
            backend: None,
            default_forecast,
            first_period: AtomicU32::new(first_period),
        }
    }

    /// 后端读取模式
    pub fn with_backend(
        store: Arc<WorkflowStore>,
        backend: Arc<dyn PlanningBackend>,
        default_forecast: Forecast,
        first_period: u32,
    ) -> Self {
        Self {
            store,
            mode: HydrationMode::Backend,
            backend: Some(backend),
            default_forecast,
            first_period: AtomicU32::new(first_period),
        }
    }

    pub fn mode(&self) -> HydrationMode {
        self.mode
    }

    pub fn first_period(&self) -> u32 {
        self.first_period.load(Ordering::Relaxed)
    }

    /// 调整首个计划期（导入新文档后）
    pub fn set_first_period(&self, period: u32) {
        self.first_period.store(period, Ordering::Relaxed);
    }

    /// 装载阶段数据（覆盖已有数据）
    ///
    /// # 返回
    /// - Ok(Applied): 已写入
    /// - Ok(Discarded): 票据失效,结果丢弃
    /// - Err(FetchError): 读取失败,存储不变
    pub async fn hydrate(&self, stage: StageKey) -> FetchResult<HydrationOutcome> {
        // 票据必须在第一个 await 之前领取
        let ticket = self.store.begin_fetch(stage);

        let payload = match self.mode {
            HydrationMode::Seed => {
                StageSeeder::from_store(&self.store, &self.default_forecast, self.first_period())
                    .seed(stage)
            }
            HydrationMode::Backend => {
                let backend = self
                    .backend
                    .as_ref()
                    .ok_or_else(|| FetchError::Config("后端模式未配置后端客户端".to_string()))?;
                match fetch_stage(backend.as_ref(), stage).await {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!("阶段 {} 数据读取失败: {}", stage, e);
                        return Err(e);
                    }
                }
            }
        };

        if self.store.commit_fetch(&ticket, payload) {
            tracing::debug!("阶段 {} 数据已装载 (mode={})", stage, self.mode);
            Ok(HydrationOutcome::Applied)
        } else {
            tracing::debug!("阶段 {} 装载结果已过期,丢弃", stage);
            Ok(HydrationOutcome::Discarded)
        }
    }

    /// 仅在阶段无数据时装载（保留用户已编辑的数据）
    pub async fn hydrate_if_missing(&self, stage: StageKey) -> FetchResult<HydrationOutcome> {
        if self.store.contains(stage) {
            return Ok(HydrationOutcome::Kept);
        }
        self.hydrate(stage).await
    }

    /// 保存阶段当前数据到后端（本地模式下为空操作）
    pub async fn save(&self, stage: StageKey) -> FetchResult<bool> {
        let Some(backend) = self.backend.as_ref() else {
            return Ok(false);
        };
        let Some(payload) = self.store.get(stage) else {
            tracing::debug!("阶段 {} 无数据,跳过保存", stage);
            return Ok(false);
        };
        save_stage(backend.as_ref(), &payload).await?;
        Ok(true)
    }
}
