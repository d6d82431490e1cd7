//! # 批量对比服务
//!
//! 串起日期区间计算、分发与聚合，HTTP 处理器和 CLI 共用。

use std::sync::Arc;
use std::time::Instant;

use super::aggregator::aggregate;
use super::contract::{ContractResponse, SummaryData, summary_response};
use super::dispatcher::BatchDispatcher;
use super::range::{DateRange, PeriodKind, comparison_range, decompose};
use super::types::{BatchResult, SubRangeRequest};
use crate::config::BatchConfig;
use crate::linfo;
use crate::logging::{LogComponent, LogStage};
use crate::provider::SalesDataProvider;

/// 批量对比服务
#[derive(Clone)]
pub struct BatchService {
    dispatcher: BatchDispatcher,
}

impl BatchService {
    pub fn new(provider: Arc<dyn SalesDataProvider>, config: &BatchConfig) -> Self {
        Self {
            dispatcher: BatchDispatcher::new(
                provider,
                config.max_concurrency,
                config.batch_timeout(),
            ),
        }
    }

    #[must_use]
    pub const fn dispatcher(&self) -> &BatchDispatcher {
        &self.dispatcher
    }

    /// 执行一次对比批次
    ///
    /// 两组请求在同一次分发中并发执行，共享并发上限与截止时间。
    pub async fn run(
        &self,
        request_id: &str,
        current: &[SubRangeRequest],
        comparison: &[SubRangeRequest],
    ) -> BatchResult {
        let started = Instant::now();

        let mut requests = Vec::with_capacity(current.len() + comparison.len());
        requests.extend_from_slice(current);
        requests.extend_from_slice(comparison);

        let mut current_results = self.dispatcher.dispatch(request_id, &requests).await;
        let comparison_results = current_results.split_off(current.len());

        let result = aggregate(current_results, comparison_results, started);

        linfo!(
            request_id,
            LogStage::Aggregation,
            LogComponent::Aggregator,
            "batch_complete",
            "批量对比完成",
            total_requests = result.metadata.total_requests,
            failed_requests = result.metadata.failed_requests,
            success_rate = result.metadata.success_rate,
            execution_time_ms = result.metadata.execution_time_ms
        );

        result
    }

    /// 按统计周期汇总一个区间，并与对比区间比较
    pub async fn summarize(
        &self,
        request_id: &str,
        range: DateRange,
        kind: PeriodKind,
    ) -> ContractResponse<SummaryData> {
        let comparison = comparison_range(&range, kind);
        let current_requests = decompose(&range, kind);
        let comparison_requests = decompose(&comparison, kind);

        linfo!(
            request_id,
            LogStage::Dispatch,
            LogComponent::Dispatcher,
            "summarize",
            "开始周期汇总",
            period = kind.as_str(),
            current = range.to_string(),
            comparison = comparison.to_string()
        );

        let result = self
            .run(request_id, &current_requests, &comparison_requests)
            .await;
        summary_response(result, kind, range, comparison)
    }
}
