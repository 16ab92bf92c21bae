// ==========================================
// 生产计划工作流 - 领域模型层
// ==========================================
// 职责: 定义阶段标识、阶段数据、预测与库存
// 红线: 不含校验逻辑,不含存储逻辑
// ==========================================

pub mod forecast;
pub mod stage;
pub mod types;

// 重导出核心类型
pub use forecast::{Forecast, WarehouseArticle, WarehouseStock};
pub use stage::{
    CapacityPlanningData, CapacityPlanningResult, CapacityProductionItem, MaterialPlanningData,
    MaterialRow, OrderItem, OrderResult, PeriodQuantities, ProcurementItem,
    ProcurementPlanningData, ProductItem, ProductionPlanningData, ProductionPlanningResult,
    ProductionProgramData, ProductionProgramResult, ResultsData, StagePayload, WorkstationLoad,
};
pub use types::{HydrationMode, StageKey};
