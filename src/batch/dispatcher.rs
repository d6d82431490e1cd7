//! # 批量分发器
//!
//! 把一组子区间请求并发地发往上游，返回与输入顺序一致的结果。
//!
//! - 同时在途的上游请求数由进程级信号量限制
//! - 单个子区间失败不会取消或阻塞其他子区间
//! - 整个批次受外层截止时间约束，超时未完成的子区间记为 `Timeout`
//! - 同一批次中相同的日期区间只请求一次，结果复制给所有引用它的请求

use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{Instant, timeout_at};

use super::range::DateRange;
use super::types::{SubRangeRequest, SubRangeResult};
use crate::error::ProviderError;
use crate::logging::{LogComponent, LogStage};
use crate::provider::{DashboardSnapshot, SalesDataProvider};
use crate::{ldebug, linfo, lwarn};

type Outcome = Result<DashboardSnapshot, ProviderError>;

/// 批量分发器
#[derive(Clone)]
pub struct BatchDispatcher {
    provider: Arc<dyn SalesDataProvider>,
    semaphore: Arc<Semaphore>,
    max_concurrency: usize,
    batch_timeout: Duration,
}

impl BatchDispatcher {
    /// `max_concurrency` 为 0 时按 1 处理
    pub fn new(
        provider: Arc<dyn SalesDataProvider>,
        max_concurrency: usize,
        batch_timeout: Duration,
    ) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            provider,
            semaphore: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
            batch_timeout,
        }
    }

    #[must_use]
    pub const fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    #[must_use]
    pub const fn batch_timeout(&self) -> Duration {
        self.batch_timeout
    }

    /// 分发一组请求
    ///
    /// 总是返回与 `requests` 等长、同序的结果。
    pub async fn dispatch(
        &self,
        request_id: &str,
        requests: &[SubRangeRequest],
    ) -> Vec<SubRangeResult> {
        if requests.is_empty() {
            return Vec::new();
        }

        let unique = unique_ranges(requests);
        let deadline = Instant::now() + self.batch_timeout;

        ldebug!(
            request_id,
            LogStage::Dispatch,
            LogComponent::Dispatcher,
            "dispatch_start",
            "开始分发子区间请求",
            requests = requests.len(),
            unique_ranges = unique.len(),
            max_concurrency = self.max_concurrency
        );

        let outcomes = join_all(
            unique
                .iter()
                .map(|range| self.fetch_before(*range, deadline)),
        )
        .await;
        let by_range: HashMap<DateRange, Outcome> = unique.into_iter().zip(outcomes).collect();

        let results: Vec<SubRangeResult> = requests
            .iter()
            .map(|request| {
                let outcome = by_range.get(&request.range).cloned().unwrap_or_else(|| {
                    Err(ProviderError::malformed("no outcome recorded for range"))
                });
                SubRangeResult::from_outcome(request, &outcome)
            })
            .collect();

        let failed = results.iter().filter(|r| !r.success).count();
        linfo!(
            request_id,
            LogStage::Dispatch,
            LogComponent::Dispatcher,
            "dispatch_complete",
            "子区间请求全部结束",
            requests = results.len(),
            failed = failed
        );

        results
    }

    /// 在截止时间之前获取单个区间（包括排队等待信号量的时间）
    async fn fetch_before(&self, range: DateRange, deadline: Instant) -> Outcome {
        let provider = Arc::clone(&self.provider);
        let semaphore = Arc::clone(&self.semaphore);

        let call = async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| ProviderError::connection("dispatcher semaphore closed"))?;
            provider.fetch_range(&range).await
        };

        match timeout_at(deadline, call).await {
            Ok(outcome) => outcome,
            Err(_) => {
                lwarn!(
                    "system",
                    LogStage::Dispatch,
                    LogComponent::Dispatcher,
                    "batch_deadline_exceeded",
                    "批次超时，放弃未完成的子区间",
                    range = range.to_string()
                );
                Err(ProviderError::Timeout {
                    timeout_ms: u64::try_from(self.batch_timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        }
    }
}

/// 按首次出现顺序去重
fn unique_ranges(requests: &[SubRangeRequest]) -> Vec<DateRange> {
    let mut seen = std::collections::HashSet::with_capacity(requests.len());
    requests
        .iter()
        .map(|r| r.range)
        .filter(|range| seen.insert(*range))
        .collect()
}
