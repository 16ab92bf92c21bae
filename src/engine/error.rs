// ==========================================
// 生产计划工作流 - 引擎层错误类型
// ==========================================
// 职责: 阶段校验失败的统一表达
// 说明: 所有校验错误均可恢复（修改数据后重试 Next）
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::types::StageKey;

/// 字段级违规详情
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    /// 字段路径（如 products[0].periods.5.sales）
    pub path: String,
    /// 违规原因
    pub message: String,
}

impl FieldViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// 阶段校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// 当前阶段尚无数据
    #[error("阶段 {stage} 没有数据")]
    MissingData { stage: StageKey },

    /// 数据存在但结构或字段不合法
    #[error("{}", schema_violation_message(.stage, .violations))]
    SchemaViolation {
        stage: StageKey,
        violations: Vec<FieldViolation>,
    },
}

impl ValidationError {
    /// 出错的阶段
    pub fn stage(&self) -> StageKey {
        match self {
            ValidationError::MissingData { stage } => *stage,
            ValidationError::SchemaViolation { stage, .. } => *stage,
        }
    }

    /// 第一条违规（MissingData 时为 None）
    pub fn first_violation(&self) -> Option<&FieldViolation> {
        match self {
            ValidationError::MissingData { .. } => None,
            ValidationError::SchemaViolation { violations, .. } => violations.first(),
        }
    }
}

fn schema_violation_message(stage: &StageKey, violations: &[FieldViolation]) -> String {
    match violations.first() {
        Some(first) if violations.len() > 1 => format!(
            "阶段 {} 数据校验失败: {}: {}（另有{}处违规）",
            stage,
            first.path,
            first.message,
            violations.len() - 1
        ),
        Some(first) => format!("阶段 {} 数据校验失败: {}: {}", stage, first.path, first.message),
        None => format!("阶段 {} 数据校验失败", stage),
    }
}

/// Result 类型别名
pub type WorkflowResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_violation_message_reports_first_path() {
        let err = ValidationError::SchemaViolation {
            stage: StageKey::ProductionProgram,
            violations: vec![
                FieldViolation::new("products[0].periods.5.sales", "必须为非负整数"),
                FieldViolation::new("products[0].periods.5.production", "必须为非负整数"),
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("products[0].periods.5.sales"));
        assert!(msg.contains("另有1处违规"));
        assert_eq!(
            err.first_violation().map(|v| v.path.as_str()),
            Some("products[0].periods.5.sales")
        );
    }

    #[test]
    fn test_missing_data_message() {
        let err = ValidationError::MissingData {
            stage: StageKey::MaterialPlanning,
        };
        assert_eq!(err.stage(), StageKey::MaterialPlanning);
        assert!(err.to_string().contains("MATERIAL_PLANNING"));
        assert!(err.first_violation().is_none());
    }
}
