// ==========================================
// 生产计划工作流 - 工作流数据存储
// ==========================================
// 职责: 各阶段数据、预测值、库存与当前步骤的唯一数据源
// 红线: 写入为整体替换,无合并;步骤写入无边界检查（由引擎负责）
// 红线: 订阅者在写入返回前同步收到通知
// ==========================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::domain::forecast::{Forecast, WarehouseStock};
use crate::domain::stage::StagePayload;
use crate::domain::types::StageKey;
use crate::engine::events::{StoreEvent, StoreListener, SubscriptionFilter};

// ==========================================
// WorkflowSnapshot - 会话快照
// ==========================================

/// 工作流快照（存储内容的完整拷贝）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSnapshot {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub step: usize,
    pub payloads: BTreeMap<StageKey, StagePayload>,
    pub forecast: Option<Forecast>,
    pub warehouse_stock: Option<WarehouseStock>,
}

// ==========================================
// FetchTicket - 拉取凭证
// ==========================================

/// 后端拉取凭证
///
/// 发起拉取时领取,回写时校验:
/// - 同一阶段有更新的拉取 → 旧结果作废
/// - 领取后发生过步骤切换 → 结果作废（用户已离开该阶段）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub stage: StageKey,
    generation: u64,
    epoch: u64,
}

/// 订阅句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    filter: SubscriptionFilter,
    listener: Arc<dyn StoreListener>,
}

struct StoreState {
    session_id: Uuid,
    created_at: DateTime<Utc>,
    step: usize,
    payloads: BTreeMap<StageKey, StagePayload>,
    forecast: Option<Forecast>,
    warehouse_stock: Option<WarehouseStock>,
    fetch_generations: HashMap<StageKey, u64>,
    navigation_epoch: u64,
}

impl StoreState {
    fn fresh() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            created_at: Utc::now(),
            step: 0,
            payloads: BTreeMap::new(),
            forecast: None,
            warehouse_stock: None,
            fetch_generations: HashMap::new(),
            navigation_epoch: 0,
        }
    }
}

// ==========================================
// WorkflowStore - 工作流数据存储
// ==========================================
pub struct WorkflowStore {
    state: RwLock<StoreState>,
    subscriptions: RwLock<Vec<Subscription>>,
    next_subscription_id: AtomicU64,
}

impl WorkflowStore {
    /// 创建空存储（步骤 0,所有阶段无数据）
    pub fn new() -> Self {
        let state = StoreState::fresh();
        tracing::info!("工作流会话创建: session_id={}", state.session_id);
        Self {
            state: RwLock::new(state),
            subscriptions: RwLock::new(Vec::new()),
            next_subscription_id: AtomicU64::new(1),
        }
    }

    /// 创建共享存储
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    // ==========================================
    // 阶段数据
    // ==========================================

    /// 读取阶段数据（从未写入则为 None）
    pub fn get(&self, stage: StageKey) -> Option<StagePayload> {
        self.read_state().payloads.get(&stage).cloned()
    }

    /// 阶段是否已有数据
    pub fn contains(&self, stage: StageKey) -> bool {
        self.read_state().payloads.contains_key(&stage)
    }

    /// 整体替换阶段数据
    ///
    /// 不校验数据形状;变体与阶段不一致的数据同样接受,由校验器拦截
    pub fn set(&self, stage: StageKey, payload: StagePayload) {
        {
            let mut state = self.write_state();
            state.payloads.insert(stage, payload);
        }
        tracing::debug!("阶段数据已替换: stage={}", stage);
        self.notify(&StoreEvent::PayloadReplaced { stage });
    }

    /// 读-改-写辅助: 对当前数据执行修改后整体写回
    ///
    /// 返回 false 表示该阶段尚无数据,未执行修改
    pub fn update<F>(&self, stage: StageKey, edit: F) -> bool
    where
        F: FnOnce(&mut StagePayload),
    {
        let Some(mut payload) = self.get(stage) else {
            return false;
        };
        edit(&mut payload);
        self.set(stage, payload);
        true
    }

    // ==========================================
    // 步骤
    // ==========================================

    /// 当前步骤
    pub fn step(&self) -> usize {
        self.read_state().step
    }

    /// 设置当前步骤（无条件写入）
    pub fn set_step(&self, step: usize) {
        let from = {
            let mut state = self.write_state();
            let from = state.step;
            state.step = step;
            state.navigation_epoch += 1;
            from
        };
        tracing::debug!("步骤变更: {} -> {}", from, step);
        self.notify(&StoreEvent::StepChanged { from, to: step });
    }

    // ==========================================
    // 预测值与库存（不属于任何阶段）
    // ==========================================

    pub fn forecast(&self) -> Option<Forecast> {
        self.read_state().forecast.clone()
    }

    pub fn set_forecast(&self, forecast: Forecast) {
        self.write_state().forecast = Some(forecast);
        self.notify(&StoreEvent::ForecastChanged);
    }

    pub fn warehouse_stock(&self) -> Option<WarehouseStock> {
        self.read_state().warehouse_stock.clone()
    }

    pub fn set_warehouse_stock(&self, stock: WarehouseStock) {
        self.write_state().warehouse_stock = Some(stock);
        self.notify(&StoreEvent::WarehouseStockChanged);
    }

    // ==========================================
    // 会话
    // ==========================================

    /// 会话快照
    pub fn snapshot(&self) -> WorkflowSnapshot {
        let state = self.read_state();
        WorkflowSnapshot {
            session_id: state.session_id,
            created_at: state.created_at,
            step: state.step,
            payloads: state.payloads.clone(),
            forecast: state.forecast.clone(),
            warehouse_stock: state.warehouse_stock.clone(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.read_state().session_id
    }

    /// 开始新会话: 清空全部数据,步骤归零,未完成的拉取全部作废
    pub fn reset(&self) {
        let session_id = {
            let mut state = self.write_state();
            let epoch = state.navigation_epoch + 1;
            *state = StoreState::fresh();
            state.navigation_epoch = epoch;
            state.session_id
        };
        tracing::info!("工作流会话重置: session_id={}", session_id);
        self.notify(&StoreEvent::SessionReset);
    }

    // ==========================================
    // 拉取凭证（防止过期结果覆盖）
    // ==========================================

    /// 领取拉取凭证,同阶段此前的凭证随即作废
    pub fn begin_fetch(&self, stage: StageKey) -> FetchTicket {
        let mut state = self.write_state();
        let generation = {
            let g = state.fetch_generations.entry(stage).or_insert(0);
            *g += 1;
            *g
        };
        FetchTicket {
            stage,
            generation,
            epoch: state.navigation_epoch,
        }
    }

    /// 凭证是否仍然有效
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        let state = self.read_state();
        Self::ticket_matches(&state, ticket)
    }

    /// 按凭证回写拉取结果
    ///
    /// 返回 false 表示凭证已过期,结果被丢弃,存储不变
    pub fn commit_fetch(&self, ticket: &FetchTicket, payload: StagePayload) -> bool {
        {
            let mut state = self.write_state();
            if !Self::ticket_matches(&state, ticket) {
                tracing::debug!(
                    "丢弃过期拉取结果: stage={}, generation={}",
                    ticket.stage,
                    ticket.generation
                );
                return false;
            }
            state.payloads.insert(ticket.stage, payload);
        }
        tracing::debug!("拉取结果已写入: stage={}", ticket.stage);
        self.notify(&StoreEvent::PayloadReplaced {
            stage: ticket.stage,
        });
        true
    }

    fn ticket_matches(state: &StoreState, ticket: &FetchTicket) -> bool {
        state.navigation_epoch == ticket.epoch
            && state.fetch_generations.get(&ticket.stage).copied() == Some(ticket.generation)
    }

    // ==========================================
    // 订阅
    // ==========================================

    /// 订阅存储事件
    pub fn subscribe(
        &self,
        filter: SubscriptionFilter,
        listener: Arc<dyn StoreListener>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Subscription {
                id,
                filter,
                listener,
            });
        id
    }

    /// 取消订阅,返回是否存在该订阅
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self
            .subscriptions
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    /// 同步通知（在释放状态锁之后调用,订阅者可回读存储）
    fn notify(&self, event: &StoreEvent) {
        let listeners: Vec<Arc<dyn StoreListener>> = self
            .subscriptions
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .filter(|s| s.filter.matches(event))
            .map(|s| s.listener.clone())
            .collect();

        for listener in listeners {
            listener.on_event(event);
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for WorkflowStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stage::{ProductionPlanningData, ProductionProgramData};
    use std::sync::Mutex;

    fn empty_program() -> StagePayload {
        StagePayload::ProductionProgram(ProductionProgramData::default())
    }

    #[test]
    fn test_new_store_is_empty_at_step_zero() {
        let store = WorkflowStore::new();
        assert_eq!(store.step(), 0);
        assert!(store.get(StageKey::ProductionProgram).is_none());
        assert!(store.forecast().is_none());
    }

    #[test]
    fn test_set_replaces_wholesale() {
        let store = WorkflowStore::new();
        store.set(StageKey::ProductionProgram, empty_program());
        assert_eq!(store.get(StageKey::ProductionProgram), Some(empty_program()));

        let orders = StagePayload::ProductionPlanning(ProductionPlanningData { orders: None });
        store.set(StageKey::ProductionProgram, orders.clone());
        assert_eq!(store.get(StageKey::ProductionProgram), Some(orders));
    }

    #[test]
    fn test_set_step_is_unconditional() {
        let store = WorkflowStore::new();
        store.set_step(42);
        assert_eq!(store.step(), 42);
    }

    #[test]
    fn test_listener_notified_before_set_returns() {
        let store = Arc::new(WorkflowStore::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let reader = store.clone();
        let sink = seen.clone();
        store.subscribe(
            SubscriptionFilter::Stage(StageKey::ProductionProgram),
            Arc::new(move |event: &StoreEvent| {
                // 回调内可回读存储
                let present = reader.contains(StageKey::ProductionProgram);
                sink.lock().unwrap().push((event.clone(), present));
            }),
        );

        store.set(StageKey::ProductionProgram, empty_program());
        store.set_step(1);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(
            seen[0],
            (
                StoreEvent::PayloadReplaced {
                    stage: StageKey::ProductionProgram
                },
                true
            )
        );
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let store = WorkflowStore::new();
        let seen = Arc::new(Mutex::new(0usize));
        let sink = seen.clone();
        let id = store.subscribe(
            SubscriptionFilter::All,
            Arc::new(move |_: &StoreEvent| *sink.lock().unwrap() += 1),
        );

        store.set_step(1);
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.set_step(2);

        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn test_newer_fetch_supersedes_older_ticket() {
        let store = WorkflowStore::new();
        let first = store.begin_fetch(StageKey::Results);
        let second = store.begin_fetch(StageKey::Results);

        assert!(!store.commit_fetch(&first, empty_program()));
        assert!(store.get(StageKey::Results).is_none());
        assert!(store.commit_fetch(&second, empty_program()));
        assert!(store.get(StageKey::Results).is_some());
    }

    #[test]
    fn test_navigation_invalidates_outstanding_ticket() {
        let store = WorkflowStore::new();
        let ticket = store.begin_fetch(StageKey::MaterialPlanning);
        assert!(store.is_current(&ticket));

        store.set_step(1);
        assert!(!store.is_current(&ticket));
        assert!(!store.commit_fetch(&ticket, empty_program()));
        assert!(store.get(StageKey::MaterialPlanning).is_none());
    }

    #[test]
    fn test_reset_starts_new_session() {
        let store = WorkflowStore::new();
        let old_session = store.session_id();
        store.set(StageKey::ProductionProgram, empty_program());
        store.set_forecast(Forecast::default());
        store.set_step(3);
        let ticket = store.begin_fetch(StageKey::Results);

        store.reset();

        assert_ne!(store.session_id(), old_session);
        assert_eq!(store.step(), 0);
        assert!(store.get(StageKey::ProductionProgram).is_none());
        assert!(store.forecast().is_none());
        assert!(!store.is_current(&ticket));
    }

    #[test]
    fn test_snapshot_serializes_with_stage_keys() {
        let store = WorkflowStore::new();
        store.set(StageKey::ProductionProgram, empty_program());

        let value = serde_json::to_value(store.snapshot()).unwrap();
        assert_eq!(value["step"], 0);
        assert!(value["payloads"].get("PRODUCTION_PROGRAM").is_some());
    }
}
