// ==========================================
// 生产计划工作流 - 阶段数据领域模型
// ==========================================
// 职责: 六个计划阶段各自的数据结构 + 封闭的阶段数据联合类型
// 红线: 不含校验逻辑,不含存储逻辑
// 说明: 用户录入的数量字段保留为数字字符串（与表单输入一致）,
//       由阶段校验器判定格式
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::types::StageKey;

// ==========================================
// 生产计划 (Production Program)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodQuantities {
    pub sales: String,
    pub production: String,
}

impl PeriodQuantities {
    pub fn new(sales: impl Into<String>, production: impl Into<String>) -> Self {
        Self {
            sales: sales.into(),
            production: production.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductItem {
    pub id: String,
    pub name: String,
    /// 期间号 -> 销售/生产数量
    pub periods: BTreeMap<String, PeriodQuantities>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductionProgramData {
    pub products: Vec<ProductItem>,
}

// ==========================================
// 物料计划 (Material Planning)
// ==========================================
// 净需求 = 订单 + 上期排队 + 安全库存 - 库存 - 排队 - 在制
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRow {
    pub product: String, // 所属成品（P1/P2/P3）
    pub id: String,
    pub name: String,
    pub order: String,
    pub previous_queue: String,
    pub safety_stock: String,
    pub stock: String,
    pub queue: String,
    pub in_progress: String,
    pub production: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaterialPlanningData {
    pub items: Option<Vec<MaterialRow>>,
}

// ==========================================
// 产能计划 (Capacity Planning)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityProductionItem {
    pub designation: String,
    pub final_product: String,
    pub article_number: String,
    pub production_quantity: String,
    /// 工作站号 -> 占用分钟数
    pub workstations: BTreeMap<u32, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkstationLoad {
    pub id: u32,
    pub capacity_requirements: String,
    pub setup_times: String,
    pub capacity_previous_periods: String,
    pub total_capacity_requirements: String,
    pub overtimes: String,
    pub overtime_per_days: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityPlanningData {
    pub production_items: Option<Vec<CapacityProductionItem>>,
    pub workstation_data: Option<Vec<WorkstationLoad>>,
}

// ==========================================
// 采购计划 (Procurement Planning)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcurementItem {
    pub product: String,
    pub lead_time: String, // 交货期（期）,允许小数
    pub deviation: String, // 交货期偏差,允许小数
    pub quantity_p1: String,
    pub quantity_p2: String,
    pub quantity_p3: String,
    pub discount_quantity: String,
    pub stock: String,
    pub demand_period_x: String,
    pub demand_period_x1: String,
    pub demand_period_x2: String,
    pub demand_period_x3: String,
    pub order_quantity: String,
    pub order_type: String,
    pub pending_order: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcurementPlanningData {
    pub items: Option<Vec<ProcurementItem>>,
}

// ==========================================
// 生产排序 (Production Planning)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: String,
    pub article_number: String,
    pub amount: i64,
    #[serde(default)]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_batch: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_batch: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_need: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workplace_id: Option<i64>,
}

impl OrderItem {
    pub fn new(id: impl Into<String>, article_number: impl Into<String>, amount: i64) -> Self {
        Self {
            id: id.into(),
            article_number: article_number.into(),
            amount,
            selected: false,
            first_batch: None,
            last_batch: None,
            period: None,
            time_need: None,
            workplace_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductionPlanningData {
    pub orders: Option<Vec<OrderItem>>,
}

// ==========================================
// 结果 (Results)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionProgramResult {
    pub id: String,
    pub article: String,
    pub pn: i64,
    pub pnplus_one: i64,
    pub pnplus_two: i64,
    pub pnplus_three: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResult {
    pub id: String,
    pub article: String,
    pub article_id: i64,
    pub amount: i64,
    pub order_type: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionPlanningResult {
    pub article: String,
    pub amount: i64,
    pub workplace_fk: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityPlanningResult {
    pub workplace_number: i64,
    pub shifts: i64,
    pub overtime_day: i64,
    pub overtime_week: i64,
    pub setup_time: i64,
    pub capacity_requirement: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsData {
    pub production_program: Option<Vec<ProductionProgramResult>>,
    pub orders: Option<Vec<OrderResult>>,
    pub production_planning: Option<Vec<ProductionPlanningResult>>,
    pub capacity_planning: Option<Vec<CapacityPlanningResult>>,
}

// ==========================================
// StagePayload - 阶段数据联合类型
// ==========================================
// 红线: 每个阶段一个变体,分派必须穷尽
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StagePayload {
    ProductionProgram(ProductionProgramData),
    MaterialPlanning(MaterialPlanningData),
    CapacityPlanning(CapacityPlanningData),
    ProcurementPlanning(ProcurementPlanningData),
    ProductionPlanning(ProductionPlanningData),
    Results(ResultsData),
}

impl StagePayload {
    /// 数据所属阶段
    pub fn stage_key(&self) -> StageKey {
        match self {
            StagePayload::ProductionProgram(_) => StageKey::ProductionProgram,
            StagePayload::MaterialPlanning(_) => StageKey::MaterialPlanning,
            StagePayload::CapacityPlanning(_) => StageKey::CapacityPlanning,
            StagePayload::ProcurementPlanning(_) => StageKey::ProcurementPlanning,
            StagePayload::ProductionPlanning(_) => StageKey::ProductionPlanning,
            StagePayload::Results(_) => StageKey::Results,
        }
    }

    /// 按阶段将后端 JSON 解码为对应变体
    ///
    /// 说明: 生产计划接口可能直接返回产品数组,此时包装为 `{ products: [...] }`
    pub fn from_json(stage: StageKey, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match stage {
            StageKey::ProductionProgram => {
                let value = if value.is_array() {
                    serde_json::json!({ "products": value })
                } else {
                    value
                };
                StagePayload::ProductionProgram(serde_json::from_value(value)?)
            }
            StageKey::MaterialPlanning => StagePayload::MaterialPlanning(serde_json::from_value(value)?),
            StageKey::CapacityPlanning => StagePayload::CapacityPlanning(serde_json::from_value(value)?),
            StageKey::ProcurementPlanning => {
                StagePayload::ProcurementPlanning(serde_json::from_value(value)?)
            }
            StageKey::ProductionPlanning => {
                StagePayload::ProductionPlanning(serde_json::from_value(value)?)
            }
            StageKey::Results => StagePayload::Results(serde_json::from_value(value)?),
        })
    }

    /// 编码为后端 JSON（不带变体标签）
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            StagePayload::ProductionProgram(data) => serde_json::to_value(data),
            StagePayload::MaterialPlanning(data) => serde_json::to_value(data),
            StagePayload::CapacityPlanning(data) => serde_json::to_value(data),
            StagePayload::ProcurementPlanning(data) => serde_json::to_value(data),
            StagePayload::ProductionPlanning(data) => serde_json::to_value(data),
            StagePayload::Results(data) => serde_json::to_value(data),
        }
    }
}
