// ==========================================
// 生产计划工作流 - 后端接口路径
// ==========================================

use crate::domain::types::StageKey;

/// 默认后端地址
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// 后端接口路径
pub struct ApiRoutes;

impl ApiRoutes {
    // 预测值 / 仓库库存
    pub const FORECAST: &'static str = "/forecast";
    pub const WAREHOUSE_STOCK: &'static str = "/warehouse_stock";

    // 阶段数据
    pub const SALE_AND_PRODUCTION_PROGRAM: &'static str = "/sale_and_production_program";
    pub const MATERIAL_PLAN: &'static str = "/material_plan";
    pub const CAPACITY_PLAN: &'static str = "/capacity_plan";
    pub const CAPACITY_PLAN_SUM_UP: &'static str = "/capacity_plan_sum_up";
    pub const PROCUREMENT_PLANNING: &'static str = "/procurement_planning";
    pub const PRODUCTION_ORDERS: &'static str = "/production_orders";
    pub const RESULTS: &'static str = "/results";
    pub const RESULTS_REFRESH: &'static str = "/results/refresh";

    // 导入
    pub const IMPORT: &'static str = "/import";
}

/// 阶段对应的读写接口
pub fn stage_route(stage: StageKey) -> &'static str {
    match stage {
        StageKey::ProductionProgram => ApiRoutes::SALE_AND_PRODUCTION_PROGRAM,
        StageKey::MaterialPlanning => ApiRoutes::MATERIAL_PLAN,
        StageKey::CapacityPlanning => ApiRoutes::CAPACITY_PLAN,
        StageKey::ProcurementPlanning => ApiRoutes::PROCUREMENT_PLANNING,
        StageKey::ProductionPlanning => ApiRoutes::PRODUCTION_ORDERS,
        StageKey::Results => ApiRoutes::RESULTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_stage_has_distinct_route() {
        let routes: HashSet<_> = StageKey::DEFAULT_ORDER.iter().map(|s| stage_route(*s)).collect();
        assert_eq!(routes.len(), 6);
        assert_eq!(stage_route(StageKey::ProductionPlanning), "/production_orders");
    }
}
