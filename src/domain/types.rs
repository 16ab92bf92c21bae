// ==========================================
// 生产计划工作流 - 领域类型定义
// ==========================================
// 职责: 计划阶段标识、数据来源模式等基础枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 计划阶段 (Stage Key)
// ==========================================
// 红线: 阶段集合封闭,新增阶段必须在此登记
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageKey {
    ProductionProgram,   // 生产计划（销售与生产计划）
    MaterialPlanning,    // 物料计划
    CapacityPlanning,    // 产能计划
    ProcurementPlanning, // 采购计划
    ProductionPlanning,  // 生产订单排序
    Results,             // 结果汇总
}

impl StageKey {
    /// 默认阶段顺序（6 个阶段）
    pub const DEFAULT_ORDER: [StageKey; 6] = [
        StageKey::ProductionProgram,
        StageKey::MaterialPlanning,
        StageKey::CapacityPlanning,
        StageKey::ProcurementPlanning,
        StageKey::ProductionPlanning,
        StageKey::Results,
    ];

    /// 转换为字符串标识（与配置、日志一致）
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKey::ProductionProgram => "PRODUCTION_PROGRAM",
            StageKey::MaterialPlanning => "MATERIAL_PLANNING",
            StageKey::CapacityPlanning => "CAPACITY_PLANNING",
            StageKey::ProcurementPlanning => "PROCUREMENT_PLANNING",
            StageKey::ProductionPlanning => "PRODUCTION_PLANNING",
            StageKey::Results => "RESULTS",
        }
    }

    /// 向导中显示的阶段名称
    pub fn label(&self) -> &'static str {
        match self {
            StageKey::ProductionProgram => "生产计划",
            StageKey::MaterialPlanning => "物料计划",
            StageKey::CapacityPlanning => "产能计划",
            StageKey::ProcurementPlanning => "采购计划",
            StageKey::ProductionPlanning => "生产排序",
            StageKey::Results => "结果",
        }
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StageKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PRODUCTION_PROGRAM" => Ok(StageKey::ProductionProgram),
            "MATERIAL_PLANNING" => Ok(StageKey::MaterialPlanning),
            "CAPACITY_PLANNING" => Ok(StageKey::CapacityPlanning),
            "PROCUREMENT_PLANNING" => Ok(StageKey::ProcurementPlanning),
            "PRODUCTION_PLANNING" => Ok(StageKey::ProductionPlanning),
            "RESULTS" => Ok(StageKey::Results),
            other => Err(format!("未知阶段: {}", other)),
        }
    }
}

// ==========================================
// 阶段数据来源 (Hydration Mode)
// ==========================================
// 同一会话内二选一: 本地样例数据 或 后端拉取
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HydrationMode {
    Seed,    // 由预测值与库存生成默认数据
    Backend, // 从计划后端拉取
}

impl fmt::Display for HydrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HydrationMode::Seed => write!(f, "seed"),
            HydrationMode::Backend => write!(f, "backend"),
        }
    }
}

impl FromStr for HydrationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seed" => Ok(HydrationMode::Seed),
            "backend" => Ok(HydrationMode::Backend),
            other => Err(format!("未知数据来源模式: {}", other)),
        }
    }
}
