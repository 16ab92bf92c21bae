// ==========================================
// 生产计划工作流 - 引擎层
// ==========================================
// 职责: 工作流存储、阶段校验、步骤控制、本地数据生成
// 红线: Engine 不做网络请求,不解析 XML
// 红线: 所有阶段数据只经由 WorkflowStore 读写
// ==========================================

pub mod error;
pub mod events;
pub mod order_sequencer;
pub mod seed;
pub mod store;
pub mod validator;
pub mod workflow;

// 重导出核心引擎
pub use error::{FieldViolation, ValidationError, WorkflowResult};
pub use events::{NoOpListener, StoreEvent, StoreListener, SubscriptionFilter};
pub use order_sequencer::{MoveDirection, OrderSequencer, SPLIT_SUFFIX};
pub use seed::StageSeeder;
pub use store::{FetchTicket, SubscriptionId, WorkflowSnapshot, WorkflowStore};
pub use validator::{validate, StageValidator, ValidatorRegistry};
pub use workflow::{Transition, WorkflowEngine};
