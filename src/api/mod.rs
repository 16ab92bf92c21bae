// ==========================================
// 生产计划工作流 - API 层
// ==========================================
// 职责: 访问计划后端（阶段数据读写、预测值、库存、导入、结果重算）
// 红线: 后端错误只作为提示返回,不进入工作流引擎
// ==========================================

pub mod client;
pub mod error;
pub mod hydration;
pub mod routes;

// 重导出核心类型
pub use client::{
    fetch_capacity_sum_up, fetch_forecast, fetch_stage, fetch_warehouse_stock, import_document,
    refresh_results, save_stage, HttpPlanningBackend, PlanningBackend,
};
pub use error::{FetchError, FetchResult};
pub use hydration::{HydrationOutcome, StageHydrator};
pub use routes::{stage_route, ApiRoutes, DEFAULT_BASE_URL};
