// ==========================================
// 生产计划工作流 - 存储变更事件
// ==========================================
// 职责: 定义工作流存储的变更事件与订阅者 trait
// 说明: 存储只依赖 trait,阶段视图实现订阅者,
//       写入返回前同步通知（无批处理、无异步延迟）
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::StageKey;

// ==========================================
// 存储事件类型
// ==========================================

/// 工作流存储事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreEvent {
    /// 阶段数据被整体替换
    PayloadReplaced { stage: StageKey },
    /// 当前步骤变更
    StepChanged { from: usize, to: usize },
    /// 预测值变更
    ForecastChanged,
    /// 库存清单变更
    WarehouseStockChanged,
    /// 会话重置
    SessionReset,
}

impl StoreEvent {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            StoreEvent::PayloadReplaced { .. } => "PayloadReplaced",
            StoreEvent::StepChanged { .. } => "StepChanged",
            StoreEvent::ForecastChanged => "ForecastChanged",
            StoreEvent::WarehouseStockChanged => "WarehouseStockChanged",
            StoreEvent::SessionReset => "SessionReset",
        }
    }

    /// 事件涉及的阶段（非阶段事件返回 None）
    pub fn stage(&self) -> Option<StageKey> {
        match self {
            StoreEvent::PayloadReplaced { stage } => Some(*stage),
            _ => None,
        }
    }
}

// ==========================================
// 订阅过滤
// ==========================================

/// 订阅范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionFilter {
    /// 接收全部事件
    All,
    /// 仅接收指定阶段的数据替换事件
    Stage(StageKey),
}

impl SubscriptionFilter {
    pub fn matches(&self, event: &StoreEvent) -> bool {
        match self {
            SubscriptionFilter::All => true,
            SubscriptionFilter::Stage(stage) => event.stage() == Some(*stage),
        }
    }
}

// ==========================================
// 订阅者 Trait
// ==========================================

/// 存储事件订阅者
///
/// # 实现说明
/// - 在存储写入线程上同步调用,回调内不得再次持有存储的写锁以外的长耗时操作
/// - 回调内允许读取存储（通知发生在释放锁之后）
pub trait StoreListener: Send + Sync {
    fn on_event(&self, event: &StoreEvent);
}

impl<F> StoreListener for F
where
    F: Fn(&StoreEvent) + Send + Sync,
{
    fn on_event(&self, event: &StoreEvent) {
        self(event)
    }
}

/// 空操作订阅者
///
/// 用于不需要响应事件的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpListener;

impl StoreListener for NoOpListener {
    fn on_event(&self, event: &StoreEvent) {
        tracing::trace!("NoOpListener: 忽略事件 {}", event.as_str());
    }
}
