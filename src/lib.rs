// ==========================================
// 生产计划工作流 - 核心库
// ==========================================
// 技术栈: Rust + SQLite（配置）+ quick-xml + reqwest
// 系统定位: 多步骤生产计划向导（导入上期结果 -> 逐阶段校验 -> 导出）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 阶段标识与阶段数据
pub mod domain;

// 引擎层 - 存储、校验、步骤控制
pub mod engine;

// 导入层 - XML 文档
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 计划后端
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{Forecast, HydrationMode, StageKey, StagePayload, WarehouseStock};

// 引擎
pub use engine::{
    StageSeeder, Transition, ValidationError, WorkflowEngine, WorkflowResult, WorkflowStore,
};

// 导入
pub use importer::{PlanningDocument, XmlError};

// API
pub use api::{FetchError, PlanningBackend, StageHydrator};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "生产计划数据编辑器";
