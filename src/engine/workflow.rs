// ==========================================
// 生产计划工作流 - 工作流引擎（步骤控制器）
// ==========================================
// 职责: 阶段排序、前进校验门控、后退、完成
// 红线: 步骤只能通过当前阶段校验成功而前进
// 红线: 后退不做校验,用户随时可以回退修正前序数据
// 红线: 校验失败不致命,只记录首个错误信息并阻止前进
// ==========================================

use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::domain::types::StageKey;
use crate::engine::error::WorkflowResult;
use crate::engine::store::WorkflowStore;
use crate::engine::validator::ValidatorRegistry;

// ==========================================
// Transition - 状态转换结果
// ==========================================

/// 一次导航操作的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Transition {
    /// 前进一步
    Advanced { from: usize, to: usize },
    /// 后退一步
    Retreated { from: usize, to: usize },
    /// 在终点阶段完成
    Finished { step: usize },
    /// 未发生变化（起点后退、终点前进、非终点完成）
    Unchanged { step: usize },
}

impl Transition {
    /// 操作后的步骤
    pub fn step(&self) -> usize {
        match self {
            Transition::Advanced { to, .. } | Transition::Retreated { to, .. } => *to,
            Transition::Finished { step } | Transition::Unchanged { step } => *step,
        }
    }
}

// ==========================================
// WorkflowEngine - 工作流引擎
// ==========================================
pub struct WorkflowEngine {
    store: Arc<WorkflowStore>,
    validators: ValidatorRegistry,
    stages: Vec<StageKey>,
    last_error: Mutex<Option<String>>,
}

impl WorkflowEngine {
    /// 创建工作流引擎
    ///
    /// # 参数
    /// - store: 共享工作流存储
    /// - stages: 阶段顺序（为空时使用默认六阶段）
    /// - validators: 校验器注册表
    pub fn new(
        store: Arc<WorkflowStore>,
        stages: Vec<StageKey>,
        validators: ValidatorRegistry,
    ) -> Self {
        let stages = if stages.is_empty() {
            tracing::warn!("阶段顺序为空,使用默认六阶段");
            StageKey::DEFAULT_ORDER.to_vec()
        } else {
            stages
        };

        Self {
            store,
            validators,
            stages,
            last_error: Mutex::new(None),
        }
    }

    /// 默认六阶段 + 默认校验器
    pub fn with_defaults(store: Arc<WorkflowStore>) -> Self {
        Self::new(
            store,
            StageKey::DEFAULT_ORDER.to_vec(),
            ValidatorRegistry::with_defaults(),
        )
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn store(&self) -> &Arc<WorkflowStore> {
        &self.store
    }

    pub fn stages(&self) -> &[StageKey] {
        &self.stages
    }

    /// 阶段数量 N
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// 当前步骤
    pub fn step(&self) -> usize {
        self.store.step()
    }

    /// 当前阶段（步骤越界时为 None）
    pub fn current_stage(&self) -> Option<StageKey> {
        self.stages.get(self.step()).copied()
    }

    /// 终点步骤 N-1
    pub fn terminal_step(&self) -> usize {
        self.stages.len() - 1
    }

    /// 是否处于终点阶段
    pub fn is_terminal(&self) -> bool {
        self.step() >= self.terminal_step()
    }

    pub fn can_go_back(&self) -> bool {
        self.step() > 0
    }

    /// 最近一次前进失败的错误信息
    pub fn last_error(&self) -> Option<String> {
        self.lock_last_error().clone()
    }

    // ==========================================
    // 导航
    // ==========================================

    /// 前进
    ///
    /// # 返回
    /// - Ok(Advanced): 当前阶段校验通过,步骤 +1
    /// - Ok(Unchanged): 已在终点阶段,忽略
    /// - Err(MissingData / SchemaViolation): 校验失败,步骤不变
    pub fn next(&self) -> WorkflowResult<Transition> {
        self.clear_error();

        let step = self.step();
        if step >= self.terminal_step() {
            tracing::debug!("已在终点阶段,忽略前进: step={}", step);
            return Ok(Transition::Unchanged { step });
        }

        let stage = self.stages[step];
        let payload = self.store.get(stage);
        tracing::debug!("校验阶段 {}: step={}", stage, step);

        match self.validators.validate(stage, payload.as_ref()) {
            Ok(()) => {
                let to = step + 1;
                self.store.set_step(to);
                tracing::info!(
                    "阶段 {} 校验通过,前进: {} -> {} ({})",
                    stage,
                    step,
                    to,
                    self.stages[to]
                );
                Ok(Transition::Advanced { from: step, to })
            }
            Err(err) => {
                tracing::warn!("阶段 {} 校验失败: {}", stage, err);
                *self.lock_last_error() = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// 后退（不校验）
    pub fn back(&self) -> Transition {
        self.clear_error();

        let step = self.step();
        if step == 0 {
            return Transition::Unchanged { step };
        }

        let to = step - 1;
        self.store.set_step(to);
        tracing::info!("后退: {} -> {}", step, to);
        Transition::Retreated { from: step, to }
    }

    /// 完成（仅终点阶段有效,对引擎而言为空操作）
    ///
    /// 导出、保存等后续动作由调用方执行
    pub fn finish(&self) -> Transition {
        let step = self.step();
        if step < self.terminal_step() {
            tracing::warn!("非终点阶段不能完成: step={}", step);
            return Transition::Unchanged { step };
        }

        let snapshot = self.store.snapshot();
        tracing::info!(
            "工作流完成: session_id={}, 已填写阶段数={}",
            snapshot.session_id,
            snapshot.payloads.len()
        );
        Transition::Finished { step }
    }

    fn clear_error(&self) {
        *self.lock_last_error() = None;
    }

    fn lock_last_error(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.last_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stage::{PeriodQuantities, ProductItem, ProductionProgramData, StagePayload};
    use crate::engine::error::ValidationError;
    use std::collections::BTreeMap;

    fn program(sales: &str) -> StagePayload {
        let mut periods = BTreeMap::new();
        periods.insert("5".to_string(), PeriodQuantities::new(sales, "200"));
        StagePayload::ProductionProgram(ProductionProgramData {
            products: vec![ProductItem {
                id: "P1".to_string(),
                name: "P1".to_string(),
                periods,
            }],
        })
    }

    #[test]
    fn test_next_without_data_keeps_step() {
        let engine = WorkflowEngine::with_defaults(WorkflowStore::shared());

        let result = engine.next();
        assert!(matches!(
            result,
            Err(ValidationError::MissingData {
                stage: StageKey::ProductionProgram
            })
        ));
        assert_eq!(engine.step(), 0);
        assert!(engine.last_error().is_some());
    }

    #[test]
    fn test_next_advances_on_valid_data_and_clears_error() {
        let store = WorkflowStore::shared();
        let engine = WorkflowEngine::with_defaults(store.clone());

        store.set(StageKey::ProductionProgram, program("abc"));
        assert!(engine.next().is_err());
        assert!(engine.last_error().unwrap().contains("sales"));

        store.set(StageKey::ProductionProgram, program("200"));
        assert_eq!(engine.next(), Ok(Transition::Advanced { from: 0, to: 1 }));
        assert!(engine.last_error().is_none());
        assert_eq!(engine.current_stage(), Some(StageKey::MaterialPlanning));
    }

    #[test]
    fn test_back_at_zero_is_noop() {
        let engine = WorkflowEngine::with_defaults(WorkflowStore::shared());
        assert_eq!(engine.back(), Transition::Unchanged { step: 0 });
        assert!(!engine.can_go_back());
    }

    #[test]
    fn test_configurable_stage_count() {
        let store = WorkflowStore::shared();
        let engine = WorkflowEngine::new(
            store.clone(),
            vec![StageKey::ProductionProgram, StageKey::Results],
            ValidatorRegistry::with_defaults(),
        );
        assert_eq!(engine.stage_count(), 2);

        store.set(StageKey::ProductionProgram, program("1"));
        assert_eq!(engine.next().unwrap().step(), 1);
        assert!(engine.is_terminal());
        assert_eq!(engine.next(), Ok(Transition::Unchanged { step: 1 }));
        assert_eq!(engine.finish(), Transition::Finished { step: 1 });
    }

    #[test]
    fn test_empty_stage_order_falls_back_to_default() {
        let engine =
            WorkflowEngine::new(WorkflowStore::shared(), Vec::new(), ValidatorRegistry::empty());
        assert_eq!(engine.stage_count(), 6);
    }

    #[test]
    fn test_finish_before_terminal_is_ignored() {
        let engine = WorkflowEngine::with_defaults(WorkflowStore::shared());
        assert_eq!(engine.finish(), Transition::Unchanged { step: 0 });
    }
}
