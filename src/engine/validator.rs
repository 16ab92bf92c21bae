// ==========================================
// 生产计划工作流 - 阶段校验器
// ==========================================
// 职责: 按阶段校验数据结构与字段格式
// 红线: 校验为纯函数,不读存储,不写日志以外的任何状态
// 红线: 新增阶段只需注册校验器,不修改引擎
// ==========================================

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::stage::{
    CapacityPlanningData, MaterialPlanningData, ProcurementPlanningData, ProductionPlanningData,
    ProductionProgramData, ResultsData, StagePayload,
};
use crate::domain::types::StageKey;
use crate::engine::error::{FieldViolation, ValidationError, WorkflowResult};

/// 非负整数（数量类字段）
static NON_NEGATIVE_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("Valid regex pattern"));

/// 非负整数或小数（交货期、偏差等时间类字段）
static NON_NEGATIVE_DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(\.\d+)?$").expect("Valid regex pattern"));

const MSG_INTEGER: &str = "必须为非负整数";
const MSG_DECIMAL: &str = "必须为非负整数或小数";
const MSG_NON_NEGATIVE: &str = "不能为负数";
const MSG_REQUIRED: &str = "缺少必填数据";

// ==========================================
// StageValidator Trait
// ==========================================

/// 阶段校验器
pub trait StageValidator: Send + Sync {
    /// 负责的阶段
    fn stage(&self) -> StageKey;

    /// 校验阶段数据
    ///
    /// # 返回
    /// - Ok(()): 校验通过
    /// - Err(ValidationError::SchemaViolation): 结构或字段违规（收集全部违规）
    fn validate(&self, payload: &StagePayload) -> WorkflowResult<()>;
}

// ==========================================
// 违规收集器
// ==========================================

/// 单次校验的违规收集器
struct Violations {
    stage: StageKey,
    items: Vec<FieldViolation>,
}

impl Violations {
    fn new(stage: StageKey) -> Self {
        Self {
            stage,
            items: Vec::new(),
        }
    }

    fn push(&mut self, path: String, message: &str) {
        self.items.push(FieldViolation::new(path, message));
    }

    fn integer(&mut self, path: impl FnOnce() -> String, value: &str) {
        if !NON_NEGATIVE_INTEGER.is_match(value) {
            self.push(path(), MSG_INTEGER);
        }
    }

    fn decimal(&mut self, path: impl FnOnce() -> String, value: &str) {
        if !NON_NEGATIVE_DECIMAL.is_match(value) {
            self.push(path(), MSG_DECIMAL);
        }
    }

    fn non_negative(&mut self, path: impl FnOnce() -> String, value: i64) {
        if value < 0 {
            self.push(path(), MSG_NON_NEGATIVE);
        }
    }

    /// 必填集合: 缺失时记录违规并返回 None
    fn required<'a, T>(&mut self, path: &str, value: &'a Option<T>) -> Option<&'a T> {
        if value.is_none() {
            self.push(path.to_string(), MSG_REQUIRED);
        }
        value.as_ref()
    }

    fn finish(self) -> WorkflowResult<()> {
        if self.items.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::SchemaViolation {
                stage: self.stage,
                violations: self.items,
            })
        }
    }
}

/// 数据变体与阶段不一致
fn variant_mismatch(expected: StageKey, payload: &StagePayload) -> ValidationError {
    ValidationError::SchemaViolation {
        stage: expected,
        violations: vec![FieldViolation::new(
            "$",
            format!("数据类型与阶段不符: 期望 {}, 实际 {}", expected, payload.stage_key()),
        )],
    }
}

// ==========================================
// 生产计划校验器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ProductionProgramValidator;

impl ProductionProgramValidator {
    fn check(data: &ProductionProgramData) -> WorkflowResult<()> {
        let mut v = Violations::new(StageKey::ProductionProgram);
        for (i, product) in data.products.iter().enumerate() {
            for (period, qty) in &product.periods {
                v.integer(|| format!("products[{}].periods.{}.sales", i, period), &qty.sales);
                v.integer(
                    || format!("products[{}].periods.{}.production", i, period),
                    &qty.production,
                );
            }
        }
        v.finish()
    }
}

impl StageValidator for ProductionProgramValidator {
    fn stage(&self) -> StageKey {
        StageKey::ProductionProgram
    }

    fn validate(&self, payload: &StagePayload) -> WorkflowResult<()> {
        match payload {
            StagePayload::ProductionProgram(data) => Self::check(data),
            other => Err(variant_mismatch(self.stage(), other)),
        }
    }
}

// ==========================================
// 物料计划校验器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct MaterialPlanningValidator;

impl MaterialPlanningValidator {
    fn check(data: &MaterialPlanningData) -> WorkflowResult<()> {
        let mut v = Violations::new(StageKey::MaterialPlanning);
        if let Some(items) = v.required("items", &data.items) {
            for (i, row) in items.iter().enumerate() {
                let fields = [
                    ("order", &row.order),
                    ("previousQueue", &row.previous_queue),
                    ("safetyStock", &row.safety_stock),
                    ("stock", &row.stock),
                    ("queue", &row.queue),
                    ("inProgress", &row.in_progress),
                    ("production", &row.production),
                ];
                for (name, value) in fields {
                    v.integer(|| format!("items[{}].{}", i, name), value);
                }
            }
        }
        v.finish()
    }
}

impl StageValidator for MaterialPlanningValidator {
    fn stage(&self) -> StageKey {
        StageKey::MaterialPlanning
    }

    fn validate(&self, payload: &StagePayload) -> WorkflowResult<()> {
        match payload {
            StagePayload::MaterialPlanning(data) => Self::check(data),
            other => Err(variant_mismatch(self.stage(), other)),
        }
    }
}

// ==========================================
// 产能计划校验器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CapacityPlanningValidator;

impl CapacityPlanningValidator {
    fn check(data: &CapacityPlanningData) -> WorkflowResult<()> {
        let mut v = Violations::new(StageKey::CapacityPlanning);

        if let Some(items) = v.required("productionItems", &data.production_items) {
            for (i, item) in items.iter().enumerate() {
                v.integer(
                    || format!("productionItems[{}].productionQuantity", i),
                    &item.production_quantity,
                );
                for (station, minutes) in &item.workstations {
                    v.integer(
                        || format!("productionItems[{}].workstations.{}", i, station),
                        minutes,
                    );
                }
            }
        }

        if let Some(stations) = v.required("workstationData", &data.workstation_data) {
            for (i, ws) in stations.iter().enumerate() {
                let fields = [
                    ("capacityRequirements", &ws.capacity_requirements),
                    ("setupTimes", &ws.setup_times),
                    ("capacityPreviousPeriods", &ws.capacity_previous_periods),
                    ("totalCapacityRequirements", &ws.total_capacity_requirements),
                    ("overtimes", &ws.overtimes),
                    ("overtimePerDays", &ws.overtime_per_days),
                ];
                for (name, value) in fields {
                    v.integer(|| format!("workstationData[{}].{}", i, name), value);
                }
            }
        }

        v.finish()
    }
}

impl StageValidator for CapacityPlanningValidator {
    fn stage(&self) -> StageKey {
        StageKey::CapacityPlanning
    }

    fn validate(&self, payload: &StagePayload) -> WorkflowResult<()> {
        match payload {
            StagePayload::CapacityPlanning(data) => Self::check(data),
            other => Err(variant_mismatch(self.stage(), other)),
        }
    }
}

// ==========================================
// 采购计划校验器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ProcurementPlanningValidator;

impl ProcurementPlanningValidator {
    fn check(data: &ProcurementPlanningData) -> WorkflowResult<()> {
        let mut v = Violations::new(StageKey::ProcurementPlanning);
        if let Some(items) = v.required("items", &data.items) {
            for (i, item) in items.iter().enumerate() {
                v.decimal(|| format!("items[{}].leadTime", i), &item.lead_time);
                v.decimal(|| format!("items[{}].deviation", i), &item.deviation);

                let fields = [
                    ("quantityP1", &item.quantity_p1),
                    ("quantityP2", &item.quantity_p2),
                    ("quantityP3", &item.quantity_p3),
                    ("discountQuantity", &item.discount_quantity),
                    ("stock", &item.stock),
                    ("demandPeriodX", &item.demand_period_x),
                    ("demandPeriodX1", &item.demand_period_x1),
                    ("demandPeriodX2", &item.demand_period_x2),
                    ("demandPeriodX3", &item.demand_period_x3),
                    ("orderQuantity", &item.order_quantity),
                    ("pendingOrder", &item.pending_order),
                ];
                for (name, value) in fields {
                    v.integer(|| format!("items[{}].{}", i, name), value);
                }
            }
        }
        v.finish()
    }
}

impl StageValidator for ProcurementPlanningValidator {
    fn stage(&self) -> StageKey {
        StageKey::ProcurementPlanning
    }

    fn validate(&self, payload: &StagePayload) -> WorkflowResult<()> {
        match payload {
            StagePayload::ProcurementPlanning(data) => Self::check(data),
            other => Err(variant_mismatch(self.stage(), other)),
        }
    }
}

// ==========================================
// 生产排序校验器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ProductionPlanningValidator;

impl ProductionPlanningValidator {
    fn check(data: &ProductionPlanningData) -> WorkflowResult<()> {
        let mut v = Violations::new(StageKey::ProductionPlanning);
        if let Some(orders) = v.required("orders", &data.orders) {
            for (i, order) in orders.iter().enumerate() {
                v.non_negative(|| format!("orders[{}].amount", i), order.amount);
            }
        }
        v.finish()
    }
}

impl StageValidator for ProductionPlanningValidator {
    fn stage(&self) -> StageKey {
        StageKey::ProductionPlanning
    }

    fn validate(&self, payload: &StagePayload) -> WorkflowResult<()> {
        match payload {
            StagePayload::ProductionPlanning(data) => Self::check(data),
            other => Err(variant_mismatch(self.stage(), other)),
        }
    }
}

// ==========================================
// 结果校验器
// ==========================================
// 说明: 结果为终点阶段,引擎不做前进校验;此校验用于保存前检查
#[derive(Debug, Clone, Default)]
pub struct ResultsValidator;

impl ResultsValidator {
    fn check(data: &ResultsData) -> WorkflowResult<()> {
        let mut v = Violations::new(StageKey::Results);

        if let Some(rows) = v.required("productionProgram", &data.production_program) {
            for (i, row) in rows.iter().enumerate() {
                let fields = [
                    ("pn", row.pn),
                    ("pnplus_one", row.pnplus_one),
                    ("pnplus_two", row.pnplus_two),
                    ("pnplus_three", row.pnplus_three),
                ];
                for (name, value) in fields {
                    v.non_negative(|| format!("productionProgram[{}].{}", i, name), value);
                }
            }
        }

        if let Some(rows) = v.required("orders", &data.orders) {
            for (i, row) in rows.iter().enumerate() {
                v.non_negative(|| format!("orders[{}].amount", i), row.amount);
            }
        }

        if let Some(rows) = v.required("productionPlanning", &data.production_planning) {
            for (i, row) in rows.iter().enumerate() {
                v.non_negative(|| format!("productionPlanning[{}].amount", i), row.amount);
            }
        }

        if let Some(rows) = v.required("capacityPlanning", &data.capacity_planning) {
            for (i, row) in rows.iter().enumerate() {
                let fields = [
                    ("shifts", row.shifts),
                    ("overtime_day", row.overtime_day),
                    ("overtime_week", row.overtime_week),
                    ("setup_time", row.setup_time),
                    ("capacity_requirement", row.capacity_requirement),
                ];
                for (name, value) in fields {
                    v.non_negative(|| format!("capacityPlanning[{}].{}", i, name), value);
                }
            }
        }

        v.finish()
    }
}

impl StageValidator for ResultsValidator {
    fn stage(&self) -> StageKey {
        StageKey::Results
    }

    fn validate(&self, payload: &StagePayload) -> WorkflowResult<()> {
        match payload {
            StagePayload::Results(data) => Self::check(data),
            other => Err(variant_mismatch(self.stage(), other)),
        }
    }
}

// ==========================================
// ValidatorRegistry - 校验器注册表
// ==========================================
#[derive(Clone, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<StageKey, Arc<dyn StageValidator>>,
}

impl ValidatorRegistry {
    /// 空注册表（所有阶段直接通过）
    pub fn empty() -> Self {
        Self::default()
    }

    /// 注册全部六个阶段的默认校验器
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(ProductionProgramValidator));
        registry.register(Arc::new(MaterialPlanningValidator));
        registry.register(Arc::new(CapacityPlanningValidator));
        registry.register(Arc::new(ProcurementPlanningValidator));
        registry.register(Arc::new(ProductionPlanningValidator));
        registry.register(Arc::new(ResultsValidator));
        registry
    }

    /// 注册校验器,返回被替换的旧校验器
    pub fn register(&mut self, validator: Arc<dyn StageValidator>) -> Option<Arc<dyn StageValidator>> {
        self.validators.insert(validator.stage(), validator)
    }

    pub fn has_validator(&self, stage: StageKey) -> bool {
        self.validators.contains_key(&stage)
    }

    /// 校验阶段数据
    ///
    /// # 返回
    /// - Err(MissingData): 数据不存在
    /// - Err(SchemaViolation): 数据不合法
    /// - Ok(()): 校验通过,或该阶段未注册校验器
    pub fn validate(&self, stage: StageKey, payload: Option<&StagePayload>) -> WorkflowResult<()> {
        let payload = payload.ok_or(ValidationError::MissingData { stage })?;
        match self.validators.get(&stage) {
            Some(validator) => validator.validate(payload),
            None => {
                tracing::debug!("阶段 {} 未注册校验器,直接通过", stage);
                Ok(())
            }
        }
    }
}

static DEFAULT_REGISTRY: Lazy<ValidatorRegistry> = Lazy::new(ValidatorRegistry::with_defaults);

/// 使用默认校验器校验阶段数据
pub fn validate(stage: StageKey, payload: Option<&StagePayload>) -> WorkflowResult<()> {
    DEFAULT_REGISTRY.validate(stage, payload)
}
