//! # 应用配置结构定义

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 应用主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP 服务配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 上游销售数据服务配置
    #[serde(default)]
    pub provider: ProviderConfig,
    /// 批量分发配置
    #[serde(default)]
    pub batch: BatchConfig,
    /// 上游响应缓存配置
    #[serde(default)]
    pub cache: CacheConfig,
}

/// HTTP 服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
    /// API 前缀，为空时路由直接挂在根路径
    pub api_prefix: String,
    /// 是否启用CORS
    pub enable_cors: bool,
    /// 允许的CORS源地址
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            api_prefix: String::new(),
            enable_cors: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// 上游销售数据服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// 服务根地址，例如 `https://sales.example.com/api`
    pub base_url: String,
    /// 仪表盘数据接口路径
    pub endpoint_path: String,
    /// Bearer token
    pub token: String,
    /// 单次请求超时（秒），上限 30
    pub timeout_seconds: u64,
    /// 建立连接超时（秒）
    pub connect_timeout_seconds: u64,
    /// 重试配置
    pub retry: RetryConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            endpoint_path: "/main_dashboard_data".to_string(),
            token: String::new(),
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
            retry: RetryConfig::default(),
        }
    }
}

impl ProviderConfig {
    /// 完整的接口地址
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.endpoint_path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }
}

/// 重试退避配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// 首次失败之后的最大重试次数
    pub max_retries: u32,
    /// 首次重试前的等待时间（毫秒）
    pub base_delay_ms: u64,
    /// 每次重试的退避倍数
    pub backoff_factor: u32,
    /// 单次等待的上限（毫秒）
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            backoff_factor: 2,
            max_delay_ms: 8000,
        }
    }
}

/// 批量分发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// 同时在途的上游请求上限
    pub max_concurrency: usize,
    /// 整个批次的超时时间（秒）
    pub batch_timeout_seconds: u64,
    /// 月度批次每组最多的周数
    pub max_weeks: usize,
    /// 单个周区间最多的天数
    pub max_week_days: i64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 6,
            batch_timeout_seconds: 90,
            max_weeks: 10,
            max_week_days: 7,
        }
    }
}

impl BatchConfig {
    #[must_use]
    pub const fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_seconds)
    }
}

/// 上游响应缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 是否启用
    pub enabled: bool,
    /// 过期时间（秒）
    pub ttl_seconds: u64,
    /// 最大条目数
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_seconds: 300,
            max_entries: 1000,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}
