// ==========================================
// 生产计划工作流 - 后端访问错误类型
// ==========================================
// 职责: 网络/状态码/解码失败,以用户可读消息呈现为可关闭提示
// 红线: 获取失败不进入工作流引擎,不修改存储
// ==========================================

use thiserror::Error;

/// 后端访问错误类型
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("网络请求失败 ({route}): {message}")]
    Network { route: String, message: String },

    #[error("后端返回错误状态 ({route}): HTTP {status}")]
    Status { route: String, status: u16 },

    #[error("响应数据解析失败 ({route}): {message}")]
    Decode { route: String, message: String },

    #[error("后端客户端配置错误: {0}")]
    Config(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    Other(#[from] anyhow::Error),
}

impl FetchError {
    /// 出错的接口路径（无路径的错误为 None）
    pub fn route(&self) -> Option<&str> {
        match self {
            FetchError::Network { route, .. }
            | FetchError::Status { route, .. }
            | FetchError::Decode { route, .. } => Some(route),
            FetchError::Config(_) | FetchError::Other(_) => None,
        }
    }
}

/// Result 类型别名
pub type FetchResult<T> = Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message_names_route() {
        let err = FetchError::Status {
            route: "/material_plan".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "后端返回错误状态 (/material_plan): HTTP 503");
        assert_eq!(err.route(), Some("/material_plan"));
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: FetchError = anyhow::anyhow!("boom").into();
        assert!(err.route().is_none());
        assert!(err.to_string().contains("boom"));
    }
}
