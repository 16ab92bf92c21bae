// ==========================================
// 生产计划工作流 - 阶段默认数据生成
// ==========================================
// 职责: 本地模式下为各阶段生成初始数据
// 输入: 预测值（只读）+ 仓库库存（可选）+ 首个计划期
// 输出: 各阶段 StagePayload
// 说明: 计划逻辑本身不在本系统内实现,除预测值/库存派生的字段外均为样例数据
// ==========================================

use std::collections::BTreeMap;

use crate::domain::forecast::{Forecast, WarehouseStock};
use crate::domain::stage::{
    CapacityPlanningData, CapacityPlanningResult, CapacityProductionItem, MaterialPlanningData,
    MaterialRow, OrderItem, PeriodQuantities, ProcurementItem, ProcurementPlanningData,
    ProductItem, ProductionPlanningData, ProductionPlanningResult, ProductionProgramData,
    ProductionProgramResult, ResultsData, StagePayload, WorkstationLoad,
};
use crate::domain::types::StageKey;
use crate::engine::store::WorkflowStore;

/// 成品编号与名称
const PRODUCTS: [(&str, &str); 3] = [("P1", "儿童自行车"), ("P2", "女士自行车"), ("P3", "男士自行车")];

/// 生产计划覆盖的期数
const PLANNED_PERIODS: u32 = 4;

/// 工作站数量
const WORKSTATION_COUNT: u32 = 15;

/// 车架与车轮在 1 号工作站的单件工时（分钟）
const FRAME_MINUTES_PER_UNIT: u64 = 5;

// 物料计划样例: (编号, 名称, [订单, 上期排队, 安全库存, 库存, 排队, 在制, 生产])
// 名称带 * 的为多产品共用件
type MaterialSample = (&'static str, &'static str, [u32; 7]);

const MATERIAL_P1: [MaterialSample; 12] = [
    ("P1", "P1", [200, 0, 100, 100, 0, 0, 200]),
    ("E26", "E26*", [200, 0, 300, 0, 280, 10, 210]),
    ("E51", "E51", [200, 0, 100, 50, 0, 0, 250]),
    ("E16", "E16*", [250, 0, 300, 40, 100, 10, 400]),
    ("E17", "E17*", [250, 0, 300, 150, 0, 0, 400]),
    ("E50", "E50", [250, 0, 100, 0, 50, 0, 300]),
    ("E4", "E4", [300, 50, 100, 250, 0, 0, 200]),
    ("E10", "E10", [300, 50, 100, 0, 390, 10, 50]),
    ("E49", "E49", [300, 50, 100, 100, 0, 0, 350]),
    ("E7", "E7", [350, 0, 100, 0, 400, 0, 50]),
    ("E13", "E13", [350, 0, 100, 20, 250, 0, 180]),
    ("E18", "E18", [350, 0, 100, 150, 250, 0, 50]),
];

const MATERIAL_P2: [MaterialSample; 12] = [
    ("P2", "P2", [150, 0, 50, 100, 0, 0, 100]),
    ("E26", "E26*", [100, 0, 0, 0, 0, 0, 100]),
    ("E56", "E56", [100, 0, 50, 150, 0, 0, 0]),
    ("E16", "E16*", [0, 0, 0, 0, 0, 0, 0]),
    ("E17", "E17*", [0, 0, 0, 0, 0, 0, 0]),
    ("E55", "E55", [0, 0, 50, 50, 0, 0, 0]),
    ("E5", "E5", [0, 0, 50, 100, 0, 0, 0]),
    ("E11", "E11", [0, 0, 50, 0, 430, 10, 0]),
    ("E54", "E54", [0, 0, 50, 100, 0, 0, 0]),
    ("E8", "E8", [0, 0, 50, 0, 100, 0, 0]),
    ("E14", "E14", [0, 0, 50, 230, 120, 10, 0]),
    ("E19", "E19", [0, 0, 50, 100, 90, 10, 0]),
];

const MATERIAL_P3: [MaterialSample; 12] = [
    ("P3", "P3", [250, 0, 50, 50, 0, 0, 250]),
    ("E26", "E26*", [250, 0, 0, 0, 0, 0, 250]),
    ("E31", "E31", [250, 0, 50, 150, 0, 0, 150]),
    ("E16", "E16*", [150, 0, 0, 0, 0, 0, 150]),
    ("E17", "E17*", [150, 0, 0, 0, 0, 0, 150]),
    ("E30", "E30", [150, 0, 50, 100, 0, 0, 100]),
    ("E6", "E6", [100, 0, 50, 40, 50, 10, 50]),
    ("E12", "E12", [100, 0, 50, 100, 250, 0, 0]),
    ("E29", "E29", [100, 0, 50, 100, 0, 0, 50]),
    ("E9", "E9", [50, 0, 50, 100, 190, 10, 0]),
    ("E15", "E15", [50, 0, 50, 100, 330, 10, 0]),
    ("E20", "E20", [50, 0, 50, 50, 200, 0, 0]),
];

// 工作站负荷样例: (工作站, [产能需求, 准备时间, 前期积压, 总需求, 加班, 日加班])
const WORKSTATIONS: [(u32, [u32; 6]); 15] = [
    (1, [2950, 90, 0, 3040, 640, 128]),
    (2, [0, 0, 0, 0, 0, 0]),
    (3, [2250, 60, 720, 3030, 630, 126]),
    (4, [3600, 200, 3860, 7660, 5260, 1052]),
    (5, [2250, 180, 4020, 6450, 4050, 810]),
    (6, [3600, 135, 5100, 8835, 6435, 1287]),
    (7, [3600, 120, 360, 4080, 1680, 336]),
    (8, [2700, 120, 1770, 4590, 2190, 438]),
    (9, [2700, 0, 2040, 4740, 2340, 468]),
    (10, [1800, 0, 760, 2560, 160, 32]),
    (11, [1350, 0, 180, 1530, 0, 0]),
    (12, [2700, 30, 840, 3570, 1170, 234]),
    (13, [2700, 30, 840, 3570, 1170, 234]),
    (14, [2700, 30, 840, 3570, 1170, 234]),
    (15, [2700, 30, 840, 3570, 1170, 234]),
];

// 结果页工作站: (工作站, 日加班分钟, 班次)
const STATION_SHIFTS: [(i64, i64, i64); 15] = [
    (1, 72, 1),
    (2, 0, 1),
    (3, 32, 1),
    (4, 128, 1),
    (5, 0, 0),
    (6, 126, 1),
    (7, 0, 3),
    (8, 0, 3),
    (9, 0, 3),
    (10, 0, 2),
    (11, 0, 2),
    (12, 0, 2),
    (13, 32, 1),
    (14, 0, 1),
    (15, 234, 1),
];

// 生产订单样例: (编号, 物料号, 数量)
const PRODUCTION_ORDERS: [(&str, &str, i64); 14] = [
    ("1", "16", 130),
    ("2", "17", 450),
    ("3", "26", 270),
    ("4", "8", 50),
    ("5", "14", 40),
    ("6", "19", 80),
    ("7", "4", 200),
    ("8", "10", 150),
    ("9", "49", 200),
    ("10", "5", 150),
    ("11", "11", 60),
    ("12", "54", 150),
    ("13", "6", 40),
    ("14", "29", 100),
];

// ==========================================
// StageSeeder - 阶段默认数据生成器
// ==========================================
#[derive(Debug, Clone)]
pub struct StageSeeder {
    forecast: Forecast,
    warehouse_stock: Option<WarehouseStock>,
    first_period: u32,
}

impl StageSeeder {
    pub fn new(forecast: Forecast, first_period: u32) -> Self {
        Self {
            forecast,
            warehouse_stock: None,
            first_period,
        }
    }

    pub fn with_warehouse_stock(mut self, stock: Option<WarehouseStock>) -> Self {
        self.warehouse_stock = stock;
        self
    }

    /// 从存储读取预测值与库存（只读）,存储中无预测值时使用默认预测
    pub fn from_store(store: &WorkflowStore, default_forecast: &Forecast, first_period: u32) -> Self {
        let forecast = store
            .forecast()
            .unwrap_or_else(|| default_forecast.clone());
        Self::new(forecast, first_period).with_warehouse_stock(store.warehouse_stock())
    }

    pub fn forecast(&self) -> &Forecast {
        &self.forecast
    }

    /// 生成指定阶段的初始数据
    pub fn seed(&self, stage: StageKey) -> StagePayload {
        match stage {
            StageKey::ProductionProgram => StagePayload::ProductionProgram(self.production_program()),
            StageKey::MaterialPlanning => StagePayload::MaterialPlanning(self.material_planning()),
            StageKey::CapacityPlanning => StagePayload::CapacityPlanning(self.capacity_planning()),
            StageKey::ProcurementPlanning => {
                StagePayload::ProcurementPlanning(self.procurement_planning())
            }
            StageKey::ProductionPlanning => {
                StagePayload::ProductionPlanning(self.production_planning())
            }
            StageKey::Results => StagePayload::Results(self.results()),
        }
    }

    fn forecast_of(&self, product_id: &str) -> String {
        self.forecast
            .for_product(product_id)
            .unwrap_or("0")
            .to_string()
    }

    /// 生产计划: 首期销售=生产=预测值,后续期为 0
    pub fn production_program(&self) -> ProductionProgramData {
        let products = PRODUCTS
            .iter()
            .map(|(id, name)| {
                let mut periods = BTreeMap::new();
                for offset in 0..PLANNED_PERIODS {
                    // 超出 u32 范围的期间不生成
                    let Some(period) = self.first_period.checked_add(offset) else {
                        break;
                    };
                    let period = period.to_string();
                    let qty = if offset == 0 {
                        let forecast = self.forecast_of(id);
                        PeriodQuantities::new(forecast.clone(), forecast)
                    } else {
                        PeriodQuantities::new("0", "0")
                    };
                    periods.insert(period, qty);
                }
                ProductItem {
                    id: id.to_string(),
                    name: name.to_string(),
                    periods,
                }
            })
            .collect();

        ProductionProgramData { products }
    }

    /// 物料计划: 成品行订单量取预测值;非共用件库存取仓库库存（若已导入）
    pub fn material_planning(&self) -> MaterialPlanningData {
        let tables: [(&str, &[MaterialSample]); 3] = [
            ("P1", &MATERIAL_P1),
            ("P2", &MATERIAL_P2),
            ("P3", &MATERIAL_P3),
        ];

        let mut items = Vec::new();
        for (product, rows) in tables {
            for (index, (id, name, values)) in rows.iter().enumerate() {
                let [order, previous, safety, stock, queue, in_progress, production] = *values;

                let order = if index == 0 {
                    self.forecast_of(product)
                } else {
                    order.to_string()
                };
                let stock = match &self.warehouse_stock {
                    Some(ws) if !name.ends_with('*') => ws
                        .amount_of(id)
                        .map(str::to_string)
                        .unwrap_or_else(|| stock.to_string()),
                    _ => stock.to_string(),
                };

                items.push(MaterialRow {
                    product: product.to_string(),
                    id: id.to_string(),
                    name: name.to_string(),
                    order,
                    previous_queue: previous.to_string(),
                    safety_stock: safety.to_string(),
                    stock,
                    queue: queue.to_string(),
                    in_progress: in_progress.to_string(),
                    production: production.to_string(),
                });
            }
        }

        MaterialPlanningData { items: Some(items) }
    }

    /// 产能计划: 车架与车轮的生产数量取预测值,1 号工作站工时按单件工时折算
    pub fn capacity_planning(&self) -> CapacityPlanningData {
        let frames = [("P1", "E50"), ("P2", "E55"), ("P3", "E30")];
        let production_items = frames
            .iter()
            .map(|(product, article)| {
                let quantity = self.forecast_of(product);
                let frame_minutes = quantity
                    .parse::<u64>()
                    .ok()
                    .and_then(|q| q.checked_mul(FRAME_MINUTES_PER_UNIT))
                    .map(|minutes| minutes.to_string())
                    .unwrap_or_else(|| "0".to_string());

                let workstations = (1..=WORKSTATION_COUNT)
                    .map(|ws| {
                        let minutes = if ws == 1 { frame_minutes.clone() } else { "0".to_string() };
                        (ws, minutes)
                    })
                    .collect();

                CapacityProductionItem {
                    designation: "车架与车轮".to_string(),
                    final_product: product.to_string(),
                    article_number: article.to_string(),
                    production_quantity: quantity,
                    workstations,
                }
            })
            .collect();

        let workstation_data = WORKSTATIONS
            .iter()
            .map(|(id, v)| WorkstationLoad {
                id: *id,
                capacity_requirements: v[0].to_string(),
                setup_times: v[1].to_string(),
                capacity_previous_periods: v[2].to_string(),
                total_capacity_requirements: v[3].to_string(),
                overtimes: v[4].to_string(),
                overtime_per_days: v[5].to_string(),
            })
            .collect();

        CapacityPlanningData {
            production_items: Some(production_items),
            workstation_data: Some(workstation_data),
        }
    }

    /// 采购计划: 首期需求取预测值,库存取仓库库存（若已导入）
    pub fn procurement_planning(&self) -> ProcurementPlanningData {
        let default_stock = [("P1", "100"), ("P2", "50"), ("P3", "50")];
        let items = default_stock
            .iter()
            .enumerate()
            .map(|(index, (product, stock))| {
                let usage = |slot: usize| (if slot == index { "1" } else { "0" }).to_string();
                let stock = self
                    .warehouse_stock
                    .as_ref()
                    .and_then(|ws| ws.amount_of(product))
                    .unwrap_or(*stock)
                    .to_string();

                ProcurementItem {
                    product: product.to_string(),
                    lead_time: "1.8".to_string(),
                    deviation: "0.4".to_string(),
                    quantity_p1: usage(0),
                    quantity_p2: usage(1),
                    quantity_p3: usage(2),
                    discount_quantity: "300".to_string(),
                    stock,
                    demand_period_x: self.forecast_of(product),
                    demand_period_x1: "0".to_string(),
                    demand_period_x2: "0".to_string(),
                    demand_period_x3: "0".to_string(),
                    order_quantity: "300".to_string(),
                    order_type: "Normal".to_string(),
                    pending_order: "0".to_string(),
                }
            })
            .collect();

        ProcurementPlanningData { items: Some(items) }
    }

    /// 生产排序: 样例订单,均未勾选
    pub fn production_planning(&self) -> ProductionPlanningData {
        let orders = PRODUCTION_ORDERS
            .iter()
            .map(|(id, article, amount)| OrderItem::new(*id, *article, *amount))
            .collect();
        ProductionPlanningData {
            orders: Some(orders),
        }
    }

    /// 结果汇总
    pub fn results(&self) -> ResultsData {
        let production_program = PRODUCTS
            .iter()
            .enumerate()
            .map(|(index, (id, _))| ProductionProgramResult {
                id: (index + 1).to_string(),
                article: id.to_string(),
                pn: self.forecast_of(id).parse().unwrap_or(0),
                pnplus_one: 0,
                pnplus_two: 0,
                pnplus_three: 0,
            })
            .collect();

        let production_planning = PRODUCTION_ORDERS
            .iter()
            .take(7)
            .map(|(_, article, amount)| ProductionPlanningResult {
                article: article.to_string(),
                amount: *amount,
                workplace_fk: 0,
            })
            .collect();

        let capacity_planning = STATION_SHIFTS
            .iter()
            .zip(WORKSTATIONS.iter())
            .map(|((station, overtime, shifts), (_, load))| CapacityPlanningResult {
                workplace_number: *station,
                shifts: *shifts,
                overtime_day: *overtime,
                overtime_week: *overtime * 5,
                setup_time: i64::from(load[1]),
                capacity_requirement: i64::from(load[0]),
            })
            .collect();

        ResultsData {
            production_program: Some(production_program),
            orders: Some(Vec::new()),
            production_planning: Some(production_planning),
            capacity_planning: Some(capacity_planning),
        }
    }
}
