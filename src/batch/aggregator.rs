//! # 结果聚合
//!
//! 把分发器返回的两组子区间结果合并为 `BatchResult`：合计、环比与执行元数据。

use std::time::Instant;

use super::types::{BatchMetadata, BatchResult, PeriodResult, SubRangeResult};

/// 聚合两组结果
///
/// 失败的子区间计为 0，并保留在结果中。
#[must_use]
pub fn aggregate(
    current: Vec<SubRangeResult>,
    comparison: Vec<SubRangeResult>,
    started: Instant,
) -> BatchResult {
    let total_requests = current.len() + comparison.len();
    let failed_requests = current
        .iter()
        .chain(&comparison)
        .filter(|r| !r.success)
        .count();

    let percentage_change = if comparison.is_empty() {
        None
    } else {
        Some(percentage_change(period_total(&current), period_total(&comparison)))
    };

    let execution_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    BatchResult {
        current_period: into_period(current),
        comparison_period: into_period(comparison),
        percentage_change,
        metadata: BatchMetadata {
            total_requests,
            failed_requests,
            success_rate: success_rate(total_requests, failed_requests),
            execution_time_ms,
        },
    }
}

/// 环比变化百分比，保留一位小数
///
/// 对比值为 0 时：当前值为正返回 100，否则返回 0。
#[must_use]
pub fn percentage_change(current: f64, comparison: f64) -> f64 {
    if comparison == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    round1((current - comparison) / comparison * 100.0)
}

fn period_total(results: &[SubRangeResult]) -> f64 {
    results.iter().filter(|r| r.success).map(|r| r.total).sum()
}

fn into_period(ranges: Vec<SubRangeResult>) -> PeriodResult {
    let total = period_total(&ranges);
    PeriodResult { ranges, total }
}

fn success_rate(total: usize, failed: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round1((total - failed) as f64 / total as f64 * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
