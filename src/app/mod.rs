// ==========================================
// 生产计划工作流 - 应用层
// ==========================================
// 职责: 装配各层,提供向导式操作入口
// ==========================================

pub mod state;

// 重导出
pub use state::{AppState, Notice};
