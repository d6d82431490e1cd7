use serde::Serialize;
use thiserror::Error;

/// 上游销售数据服务调用失败的类型化错误
///
/// 错误需要被复制到多个去重后的子区间结果中，因此只携带字符串信息。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Provider request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },

    #[error("Provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Malformed provider response: {message}")]
    MalformedResponse { message: String },

    #[error("Provider rejected the request: {message}")]
    Rejected { message: String },
}

/// 错误类别，用于日志与元数据
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    Timeout,
    Connection,
    HttpClient,
    HttpServer,
    MalformedResponse,
    Rejected,
}

impl ProviderError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::Timeout { .. } => ProviderErrorKind::Timeout,
            Self::Connection { .. } => ProviderErrorKind::Connection,
            Self::Http { status, .. } if *status >= 500 => ProviderErrorKind::HttpServer,
            Self::Http { .. } => ProviderErrorKind::HttpClient,
            Self::MalformedResponse { .. } => ProviderErrorKind::MalformedResponse,
            Self::Rejected { .. } => ProviderErrorKind::Rejected,
        }
    }

    /// 超时、连接失败、5xx 与 429 可以重试；其余 4xx 与响应格式问题立即失败
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connection { .. } => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::MalformedResponse { .. } | Self::Rejected { .. } => false,
        }
    }
}

impl ProviderErrorKind {
    /// 上游无法访问（超时、连接失败、5xx）
    ///
    /// 上游给出了明确应答（4xx、格式错误、业务拒绝）时不算作不可达。
    #[must_use]
    pub const fn is_unreachable(self) -> bool {
        matches!(self, Self::Timeout | Self::Connection | Self::HttpServer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(ProviderError::Timeout { timeout_ms: 30_000 }.is_retryable());
        assert!(ProviderError::connection("refused").is_retryable());
        assert!(
            ProviderError::Http {
                status: 502,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            ProviderError::Http {
                status: 429,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ProviderError::Http {
                status: 404,
                message: String::new()
            }
            .is_retryable()
        );
        assert!(!ProviderError::malformed("bad json").is_retryable());
    }

    #[test]
    fn test_unreachable_kinds() {
        let server = ProviderError::Http {
            status: 503,
            message: "down".into(),
        };
        let client = ProviderError::Http {
            status: 401,
            message: "nope".into(),
        };
        assert!(server.kind().is_unreachable());
        assert!(!client.kind().is_unreachable());
        assert!(ProviderError::Timeout { timeout_ms: 1 }.kind().is_unreachable());
        assert!(!ProviderError::malformed("x").kind().is_unreachable());
    }
}
