//! # 上游响应缓存
//!
//! 包装任意 `SalesDataProvider`，按日期区间缓存成功的响应。
//! 只缓存完全属于过去的区间（结束日期早于今天），当天及以后的数据仍在变化。

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use moka::future::Cache;

use super::client::SalesDataProvider;
use super::types::DashboardSnapshot;
use crate::batch::range::DateRange;
use crate::config::CacheConfig;
use crate::error::ProviderError;
use crate::ldebug;
use crate::logging::{LogComponent, LogStage};

/// 带缓存的数据源
pub struct CachedProvider<P> {
    inner: P,
    cache: Cache<DateRange, DashboardSnapshot>,
}

impl<P: SalesDataProvider> CachedProvider<P> {
    #[must_use]
    pub fn new(inner: P, config: &CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl())
            .build();
        Self { inner, cache }
    }

    pub const fn inner(&self) -> &P {
        &self.inner
    }
}

/// 区间是否可以缓存
#[must_use]
pub fn is_cacheable(range: &DateRange, today: NaiveDate) -> bool {
    range.end() < today
}

#[async_trait]
impl<P: SalesDataProvider> SalesDataProvider for CachedProvider<P> {
    async fn fetch_range(&self, range: &DateRange) -> Result<DashboardSnapshot, ProviderError> {
        let cacheable = is_cacheable(range, Local::now().date_naive());

        let cached = if cacheable {
            self.cache.get(range).await
        } else {
            None
        };

        if let Some(snapshot) = cached {
            ldebug!(
                "system",
                LogStage::Cache,
                LogComponent::Cache,
                "cache_hit",
                "命中上游响应缓存",
                range = range.to_string()
            );
            return Ok(snapshot);
        }

        let snapshot = self.inner.fetch_range(range).await?;
        if cacheable {
            self.cache.insert(*range, snapshot.clone()).await;
        }
        Ok(snapshot)
    }
}
