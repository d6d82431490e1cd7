//! # 测试辅助
//!
//! `MockSalesProvider`：按日期区间返回预设结果的数据源替身，
//! 记录调用次数与同时在途的请求峰值，用于验证并发上限与去重。

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::batch::range::DateRange;
use crate::error::ProviderError;
use crate::provider::{DashboardSnapshot, SalesDataProvider};

type Outcome = Result<DashboardSnapshot, ProviderError>;

/// 数据源替身
pub struct MockSalesProvider {
    outcomes: DashMap<DateRange, Outcome>,
    default_outcome: Outcome,
    delay: Duration,
    delays: DashMap<DateRange, Duration>,
    calls: DashMap<DateRange, usize>,
    call_count: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: AtomicUsize,
}

impl MockSalesProvider {
    /// 未预设的区间默认返回 `MalformedResponse`
    #[must_use]
    pub fn new() -> Self {
        Self {
            outcomes: DashMap::new(),
            default_outcome: Err(ProviderError::malformed("no canned response for range")),
            delay: Duration::ZERO,
            delays: DashMap::new(),
            calls: DashMap::new(),
            call_count: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_total(self, range: DateRange, total: f64) -> Self {
        self.outcomes
            .insert(range, Ok(DashboardSnapshot::with_total(total)));
        self
    }

    #[must_use]
    pub fn with_error(self, range: DateRange, error: ProviderError) -> Self {
        self.outcomes.insert(range, Err(error));
        self
    }

    #[must_use]
    pub fn with_default_total(mut self, total: f64) -> Self {
        self.default_outcome = Ok(DashboardSnapshot::with_total(total));
        self
    }

    #[must_use]
    pub fn with_default_error(mut self, error: ProviderError) -> Self {
        self.default_outcome = Err(error);
        self
    }

    /// 所有请求的统一延迟
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 单个区间的延迟，优先于统一延迟
    #[must_use]
    pub fn with_delay_for(self, range: DateRange, delay: Duration) -> Self {
        self.delays.insert(range, delay);
        self
    }

    /// 总调用次数
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// 某个区间被调用的次数
    pub fn calls_for(&self, range: &DateRange) -> usize {
        self.calls.get(range).map_or(0, |count| *count)
    }

    /// 同时在途请求数的峰值
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Default for MockSalesProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SalesDataProvider for MockSalesProvider {
    async fn fetch_range(&self, range: &DateRange) -> Outcome {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        *self.calls.entry(*range).or_insert(0) += 1;

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
        };

        let delay = self.delays.get(range).map_or(self.delay, |d| *d);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.outcomes
            .get(range)
            .map_or_else(|| self.default_outcome.clone(), |outcome| outcome.clone())
    }
}

/// 请求结束（包括被取消）时减少在途计数
struct InFlightGuard {
    in_flight: Arc<AtomicUsize>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}
