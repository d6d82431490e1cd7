//! 上游销售数据服务模块。
//!
//! - `client`：`SalesDataProvider` trait 与基于 reqwest 的实现
//! - `retry`：指数退避重试决策
//! - `types`：上游响应结构
//! - `cache`：可选的响应缓存包装

mod cache;
mod client;
mod retry;
mod types;

pub use cache::{CachedProvider, is_cacheable};
pub use client::{HttpProviderClient, SalesDataProvider};
pub use retry::{RetryDecision, RetryPolicy, RetryReason};
pub use types::{DashboardSnapshot, RawProviderResponse};

use std::sync::Arc;

use crate::config::{CacheConfig, ProviderConfig};
use crate::error::Result;

/// 根据配置构造数据源，启用缓存时包上一层 `CachedProvider`
pub fn build_provider(
    provider: &ProviderConfig,
    cache: &CacheConfig,
) -> Result<Arc<dyn SalesDataProvider>> {
    let client = HttpProviderClient::new(provider)?;
    if cache.enabled {
        Ok(Arc::new(CachedProvider::new(client, cache)))
    } else {
        Ok(Arc::new(client))
    }
}
