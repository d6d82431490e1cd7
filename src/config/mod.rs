//! # 配置管理模块
//!
//! 处理应用配置加载、验证和管理

mod app_config;
mod manager;

pub use app_config::{
    AppConfig, BatchConfig, CacheConfig, ProviderConfig, RetryConfig, ServerConfig,
};
pub use manager::{CONFIG_PATH_ENV, ConfigManager, ConfigSource, ENV_OVERRIDE_PREFIX};

use crate::ensure_config;
use crate::error::Result;

/// 单次上游请求的超时上限（秒）
pub const MAX_PROVIDER_TIMEOUT_SECONDS: u64 = 30;

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<()> {
    ensure_config!(config.server.port != 0, "无效的服务器端口: 0");

    let prefix = &config.server.api_prefix;
    ensure_config!(
        prefix.is_empty() || (prefix.starts_with('/') && !prefix.ends_with('/')),
        "API前缀必须以 / 开头且不能以 / 结尾: {}",
        prefix
    );

    ensure_config!(
        !config.provider.base_url.trim().is_empty(),
        "上游服务地址 provider.base_url 不能为空"
    );
    ensure_config!(
        config.provider.base_url.starts_with("http://")
            || config.provider.base_url.starts_with("https://"),
        "上游服务地址必须是 http(s) URL: {}",
        config.provider.base_url
    );
    ensure_config!(
        !config.provider.token.trim().is_empty(),
        "上游服务令牌 provider.token 不能为空"
    );
    ensure_config!(
        (1..=MAX_PROVIDER_TIMEOUT_SECONDS).contains(&config.provider.timeout_seconds),
        "provider.timeout_seconds 必须在 1..={} 之间: {}",
        MAX_PROVIDER_TIMEOUT_SECONDS,
        config.provider.timeout_seconds
    );
    ensure_config!(
        config.provider.retry.backoff_factor >= 1,
        "provider.retry.backoff_factor 必须大于等于1"
    );

    ensure_config!(
        config.batch.max_concurrency > 0,
        "batch.max_concurrency 必须大于0"
    );
    ensure_config!(
        config.batch.batch_timeout_seconds > 0,
        "batch.batch_timeout_seconds 必须大于0"
    );
    ensure_config!(config.batch.max_weeks > 0, "batch.max_weeks 必须大于0");
    ensure_config!(
        config.batch.max_week_days > 0,
        "batch.max_week_days 必须大于0"
    );

    if config.cache.enabled {
        ensure_config!(config.cache.ttl_seconds > 0, "cache.ttl_seconds 必须大于0");
        ensure_config!(config.cache.max_entries > 0, "cache.max_entries 必须大于0");
    }

    Ok(())
}
