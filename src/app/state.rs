// ==========================================
// 生产计划工作流 - 应用状态
// ==========================================
// 职责: 装配 配置 -> 存储 -> 引擎 -> 数据装载,管理导入文档与提示消息
// 红线: 后端读取失败只产生可关闭提示,不影响工作流步骤
// ==========================================

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::api::{
    refresh_results, FetchError, FetchResult, HttpPlanningBackend, HydrationOutcome,
    PlanningBackend, StageHydrator,
};
use crate::config::{ConfigManager, WorkflowConfig};
use crate::domain::forecast::Forecast;
use crate::domain::stage::StagePayload;
use crate::domain::types::{HydrationMode, StageKey};
use crate::engine::{
    MoveDirection, OrderSequencer, Transition, ValidatorRegistry, WorkflowEngine, WorkflowResult,
    WorkflowStore,
};
use crate::importer::{PlanningDocument, XmlError, XmlResult};

/// 可关闭的提示消息（后端读取失败等）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub stage: Option<StageKey>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// 应用状态
///
/// 包含工作流存储、引擎、数据装载器与导入的 XML 文档
pub struct AppState {
    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 启动时加载的工作流配置
    pub workflow_config: WorkflowConfig,

    /// 工作流存储（唯一数据源）
    pub store: Arc<WorkflowStore>,

    /// 工作流引擎
    pub engine: Arc<WorkflowEngine>,

    /// 阶段数据装载器
    pub hydrator: Arc<StageHydrator>,

    /// 后端客户端（本地模式为 None）
    pub backend: Option<Arc<dyn PlanningBackend>>,

    sequencer: OrderSequencer,
    document: Mutex<Option<PlanningDocument>>,
    notices: Mutex<Vec<Notice>>,
    next_notice_id: AtomicU64,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 配置库文件路径
    ///
    /// # 说明
    /// 后端模式下按配置创建 HTTP 客户端
    pub fn new(db_path: &str) -> Result<Self, String> {
        tracing::info!("初始化AppState,配置库路径: {}", db_path);

        let config = ConfigManager::new(db_path).map_err(|e| format!("无法打开配置库: {}", e))?;
        let workflow_config = config
            .load_workflow_config()
            .map_err(|e| format!("配置加载失败: {}", e))?;

        let backend: Option<Arc<dyn PlanningBackend>> = match workflow_config.hydration_mode {
            HydrationMode::Seed => None,
            HydrationMode::Backend => {
                let client = HttpPlanningBackend::from_config(&workflow_config)
                    .map_err(|e| format!("后端客户端创建失败: {}", e))?;
                Some(Arc::new(client))
            }
        };

        Self::with_parts(config, workflow_config, backend)
    }

    /// 由已加载的配置与后端装配（测试可注入模拟后端）
    pub fn with_parts(
        config: ConfigManager,
        workflow_config: WorkflowConfig,
        backend: Option<Arc<dyn PlanningBackend>>,
    ) -> Result<Self, String> {
        let store = WorkflowStore::shared();
        let engine = Arc::new(WorkflowEngine::new(
            store.clone(),
            workflow_config.stage_order.clone(),
            ValidatorRegistry::with_defaults(),
        ));

        let hydrator = match (workflow_config.hydration_mode, backend.clone()) {
            (HydrationMode::Seed, _) => StageHydrator::seeded(
                store.clone(),
                workflow_config.default_forecast.clone(),
                workflow_config.first_planning_period,
            ),
            (HydrationMode::Backend, Some(backend)) => StageHydrator::with_backend(
                store.clone(),
                backend,
                workflow_config.default_forecast.clone(),
                workflow_config.first_planning_period,
            ),
            (HydrationMode::Backend, None) => {
                return Err("后端模式需要后端客户端".to_string());
            }
        };

        tracing::info!(
            "AppState初始化完成: mode={}, stages={}",
            workflow_config.hydration_mode,
            engine.stage_count()
        );

        Ok(Self {
            config: Arc::new(config),
            workflow_config,
            store,
            engine,
            hydrator: Arc::new(hydrator),
            backend,
            sequencer: OrderSequencer::new(),
            document: Mutex::new(None),
            notices: Mutex::new(Vec::new()),
            next_notice_id: AtomicU64::new(1),
        })
    }

    // ==========================================
    // XML 导入 / 编辑 / 导出
    // ==========================================

    /// 导入上期结果 XML: 开始新会话,写入预测值与库存
    pub fn import_xml(&self, xml: &str) -> XmlResult<()> {
        let document = PlanningDocument::parse(xml)?;
        let forecast = document.forecast()?;

        self.store.reset();
        self.store.set_forecast(forecast);
        if let Some(stock) = document.warehouse_stock() {
            self.store.set_warehouse_stock(stock);
        }
        // 新会话: 文档无可用期间号时回到配置的首个计划期
        let first_period = document
            .next_period()
            .unwrap_or(self.workflow_config.first_planning_period);
        self.hydrator.set_first_period(first_period);

        tracing::info!(
            "XML 已导入: game={:?}, group={:?}, period={:?}",
            document.game(),
            document.group(),
            document.period()
        );
        *self.lock_document() = Some(document);
        Ok(())
    }

    pub fn import_file(&self, path: &Path) -> XmlResult<()> {
        let xml = std::fs::read_to_string(path)?;
        self.import_xml(&xml)
    }

    pub fn document(&self) -> Option<PlanningDocument> {
        self.lock_document().clone()
    }

    /// 修改预测值（文档与存储同步）
    pub fn edit_forecast(&self, product: &str, value: &str) -> XmlResult<()> {
        let forecast = self.edit_document(|doc| {
            doc.set_forecast_value(product, value)?;
            doc.forecast()
        })?;
        self.store.set_forecast(forecast);
        Ok(())
    }

    /// 修改仓库物料字段（文档与存储同步）
    pub fn edit_warehouse_field(&self, index: usize, field: &str, value: &str) -> XmlResult<()> {
        let stock = self.edit_document(|doc| {
            doc.set_warehouse_field(index, field, value)?;
            doc.warehouse_stock()
                .ok_or_else(|| XmlError::MissingElement("warehousestock".to_string()))
        })?;
        self.store.set_warehouse_stock(stock);
        Ok(())
    }

    pub fn export_xml(&self) -> XmlResult<String> {
        match self.lock_document().as_ref() {
            Some(doc) => doc.to_xml(),
            None => Err(XmlError::MissingElement("尚未导入 XML 文档".to_string())),
        }
    }

    pub fn export_file(&self, path: &Path) -> XmlResult<()> {
        let xml = self.export_xml()?;
        std::fs::write(path, xml)?;
        tracing::info!("XML 已导出: {}", path.display());
        Ok(())
    }

    fn edit_document<T>(
        &self,
        edit: impl FnOnce(&mut PlanningDocument) -> XmlResult<T>,
    ) -> XmlResult<T> {
        let mut guard = self.lock_document();
        let doc = guard
            .as_mut()
            .ok_or_else(|| XmlError::MissingElement("尚未导入 XML 文档".to_string()))?;
        edit(doc)
    }

    /// 当前预测值（未导入时取配置默认值）
    pub fn forecast(&self) -> Forecast {
        self.store
            .forecast()
            .unwrap_or_else(|| self.workflow_config.default_forecast.clone())
    }

    // ==========================================
    // 阶段数据装载
    // ==========================================

    /// 进入当前阶段: 无数据时装载
    pub async fn enter_current_stage(&self) -> Option<HydrationOutcome> {
        let stage = self.engine.current_stage()?;
        let result = self.hydrator.hydrate_if_missing(stage).await;
        self.record_fetch_result(stage, result)
    }

    /// 重新装载指定阶段（覆盖已有数据）
    pub async fn hydrate_stage(&self, stage: StageKey) -> Option<HydrationOutcome> {
        let result = self.hydrator.hydrate(stage).await;
        self.record_fetch_result(stage, result)
    }

    /// 并发装载全部阶段
    pub async fn hydrate_all(&self) -> Vec<(StageKey, Option<HydrationOutcome>)> {
        let stages = self.engine.stages().to_vec();
        let results = join_all(stages.iter().map(|stage| self.hydrator.hydrate(*stage))).await;

        stages
            .into_iter()
            .zip(results)
            .map(|(stage, result)| (stage, self.record_fetch_result(stage, result)))
            .collect()
    }

    /// 保存当前阶段到后端
    pub async fn save_current_stage(&self) -> bool {
        let Some(stage) = self.engine.current_stage() else {
            return false;
        };
        match self.hydrator.save(stage).await {
            Ok(saved) => saved,
            Err(e) => {
                self.push_notice(Some(stage), &e);
                false
            }
        }
    }

    /// 后端重算结果并写入结果阶段
    pub async fn refresh_results(&self) -> Option<HydrationOutcome> {
        let backend = self.backend.clone()?;
        let ticket = self.store.begin_fetch(StageKey::Results);
        match refresh_results(backend.as_ref()).await {
            Ok(payload) => Some(if self.store.commit_fetch(&ticket, payload) {
                HydrationOutcome::Applied
            } else {
                HydrationOutcome::Discarded
            }),
            Err(e) => {
                self.push_notice(Some(StageKey::Results), &e);
                None
            }
        }
    }

    fn record_fetch_result(
        &self,
        stage: StageKey,
        result: FetchResult<HydrationOutcome>,
    ) -> Option<HydrationOutcome> {
        match result {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                self.push_notice(Some(stage), &e);
                None
            }
        }
    }

    // ==========================================
    // 导航
    // ==========================================

    pub fn next(&self) -> WorkflowResult<Transition> {
        self.engine.next()
    }

    pub fn back(&self) -> Transition {
        self.engine.back()
    }

    pub fn finish(&self) -> Transition {
        self.engine.finish()
    }

    // ==========================================
    // 生产排序
    // ==========================================

    pub fn toggle_order(&self, order_id: &str) -> bool {
        self.edit_orders(|seq, orders| seq.toggle_selection(orders, order_id))
    }

    pub fn move_order(&self, index: usize, direction: MoveDirection) -> bool {
        self.edit_orders(|seq, orders| seq.move_order(orders, index, direction))
    }

    /// 拆分已勾选订单,返回拆分后订单数
    pub fn split_selected_orders(&self) -> Option<usize> {
        let mut count = None;
        self.store.update(StageKey::ProductionPlanning, |payload| {
            if let StagePayload::ProductionPlanning(data) = payload {
                self.sequencer.split_in_payload(data);
                count = data.orders.as_ref().map(Vec::len);
            }
        });
        count
    }

    fn edit_orders(
        &self,
        edit: impl FnOnce(&OrderSequencer, &mut [crate::domain::stage::OrderItem]) -> bool,
    ) -> bool {
        let Some(StagePayload::ProductionPlanning(mut data)) =
            self.store.get(StageKey::ProductionPlanning)
        else {
            return false;
        };
        let Some(orders) = data.orders.as_mut() else {
            return false;
        };

        // 未发生变化时不写回
        if !edit(&self.sequencer, orders) {
            return false;
        }
        self.store
            .set(StageKey::ProductionPlanning, StagePayload::ProductionPlanning(data));
        true
    }

    // ==========================================
    // 提示消息
    // ==========================================

    pub fn notices(&self) -> Vec<Notice> {
        self.lock_notices().clone()
    }

    /// 关闭提示,返回是否存在
    pub fn dismiss_notice(&self, id: u64) -> bool {
        let mut notices = self.lock_notices();
        let before = notices.len();
        notices.retain(|n| n.id != id);
        notices.len() != before
    }

    fn push_notice(&self, stage: Option<StageKey>, error: &FetchError) {
        tracing::warn!("后端访问失败: stage={:?}, {}", stage, error);
        let notice = Notice {
            id: self.next_notice_id.fetch_add(1, Ordering::Relaxed),
            stage,
            message: error.to_string(),
            created_at: Utc::now(),
        };
        self.lock_notices().push(notice);
    }

    fn lock_notices(&self) -> MutexGuard<'_, Vec<Notice>> {
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_document(&self) -> MutexGuard<'_, Option<PlanningDocument>> {
        self.document
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = r#"<results game="1" group="2" period="6">
  <forecast p1="120" p2="80" p3="60"/>
  <warehousestock>
    <article id="1" amount="40" startamount="40" pct="100.0" price="150.00" stockvalue="6000.00"/>
    <totalstockvalue>6000.00</totalstockvalue>
  </warehousestock>
</results>"#;

    fn seeded_state() -> AppState {
        let config = ConfigManager::in_memory().unwrap();
        AppState::with_parts(config, WorkflowConfig::default(), None).unwrap()
    }

    #[tokio::test]
    async fn test_import_seeds_from_document() {
        let state = seeded_state();
        state.import_xml(XML).unwrap();
        assert_eq!(state.forecast(), Forecast::new("120", "80", "60"));
        assert_eq!(state.hydrator.first_period(), 7);

        assert_eq!(state.enter_current_stage().await, Some(HydrationOutcome::Applied));
        match state.store.get(StageKey::ProductionProgram) {
            Some(StagePayload::ProductionProgram(data)) => {
                assert!(data.products[0].periods.contains_key("7"));
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_edit_forecast_updates_store_and_export() {
        let state = seeded_state();
        state.import_xml(XML).unwrap();
        state.edit_forecast("p1", "130").unwrap();
        state.edit_warehouse_field(0, "amount", "35").unwrap();

        assert_eq!(state.forecast().p1, "130");
        assert_eq!(state.store.warehouse_stock().unwrap().articles[0].amount, "35");
        let exported = state.export_xml().unwrap();
        assert!(exported.contains("p1=\"130\""));
    }

    #[test]
    fn test_export_without_document_fails() {
        let state = seeded_state();
        assert!(matches!(state.export_xml(), Err(XmlError::MissingElement(_))));
        assert!(state.edit_forecast("p1", "1").is_err());
    }

    #[test]
    fn test_backend_mode_requires_backend() {
        let config = ConfigManager::in_memory().unwrap();
        let workflow_config = WorkflowConfig {
            hydration_mode: HydrationMode::Backend,
            ..WorkflowConfig::default()
        };
        assert!(AppState::with_parts(config, workflow_config, None).is_err());
    }

    #[test]
    fn test_import_without_period_restores_configured_first_period() {
        let state = seeded_state();
        state.import_xml(XML).unwrap();
        assert_eq!(state.hydrator.first_period(), 7);

        state
            .import_xml(r#"<results><forecast p1="1" p2="1" p3="1"/></results>"#)
            .unwrap();
        assert_eq!(
            state.hydrator.first_period(),
            state.workflow_config.first_planning_period
        );

        let overflowing = format!(
            r#"<results period="{}"><forecast p1="1" p2="1" p3="1"/></results>"#,
            u32::MAX
        );
        state.import_xml(&overflowing).unwrap();
        assert_eq!(state.hydrator.first_period(), 5);
    }

    #[tokio::test]
    async fn test_unchanged_order_edit_does_not_notify() {
        use crate::engine::{StoreEvent, SubscriptionFilter};

        let state = seeded_state();
        state.hydrate_stage(StageKey::ProductionPlanning).await;

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        state.store.subscribe(
            SubscriptionFilter::Stage(StageKey::ProductionPlanning),
            Arc::new(move |event: &StoreEvent| sink.lock().unwrap().push(event.clone())),
        );

        assert!(!state.toggle_order("missing"));
        assert!(!state.move_order(0, MoveDirection::Up));
        assert!(events.lock().unwrap().is_empty());

        assert!(state.toggle_order("1"));
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_order_editing_through_state() {
        let state = seeded_state();
        state.hydrate_stage(StageKey::ProductionPlanning).await;

        assert!(state.toggle_order("2"));
        assert_eq!(state.split_selected_orders(), Some(15));
        assert!(state.move_order(0, MoveDirection::Down));
        assert!(!state.toggle_order("missing"));
    }
}
