//! # 批量请求与结果类型

use serde::Serialize;
use serde_json::Value;

use super::range::DateRange;
use crate::error::{ProviderError, ProviderErrorKind};
use crate::provider::DashboardSnapshot;

/// 单个子区间请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubRangeRequest {
    /// 调用方给定的键，在同一组内唯一
    pub key: String,
    /// 展示用标签
    pub label: String,
    pub range: DateRange,
}

impl SubRangeRequest {
    pub fn new(key: impl Into<String>, label: impl Into<String>, range: DateRange) -> Self {
        let key = key.into();
        debug_assert!(!key.is_empty(), "sub-range key must not be empty");
        Self {
            key,
            label: label.into(),
            range,
        }
    }
}

/// 单个子区间的处理结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubRangeResult {
    pub key: String,
    pub label: String,
    pub range: DateRange,
    pub success: bool,
    /// 失败时为 0
    pub total: f64,
    /// 上游返回的完整快照，失败时为空
    pub details: Option<Value>,
    pub error: Option<String>,
    #[serde(skip)]
    pub error_kind: Option<ProviderErrorKind>,
}

impl SubRangeResult {
    pub fn from_outcome(
        request: &SubRangeRequest,
        outcome: &Result<DashboardSnapshot, ProviderError>,
    ) -> Self {
        match outcome {
            Ok(snapshot) => Self {
                key: request.key.clone(),
                label: request.label.clone(),
                range: request.range,
                success: true,
                total: snapshot.total_sales,
                details: Some(snapshot.to_details()),
                error: None,
                error_kind: None,
            },
            Err(err) => Self {
                key: request.key.clone(),
                label: request.label.clone(),
                range: request.range,
                success: false,
                total: 0.0,
                details: None,
                error: Some(err.to_string()),
                error_kind: Some(err.kind()),
            },
        }
    }
}

/// 一组子区间结果及其合计
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodResult {
    /// 与请求顺序一致
    pub ranges: Vec<SubRangeResult>,
    /// 成功子区间的 `total_sales` 之和
    pub total: f64,
}

/// 批次执行元数据
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchMetadata {
    pub total_requests: usize,
    pub failed_requests: usize,
    /// 成功率百分比，保留一位小数
    pub success_rate: f64,
    pub execution_time_ms: u64,
}

/// 一次批量对比的完整结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchResult {
    pub current_period: PeriodResult,
    pub comparison_period: PeriodResult,
    /// 对比组为空时为 `None`
    pub percentage_change: Option<f64>,
    pub metadata: BatchMetadata,
}

impl BatchResult {
    /// 所有子区间都失败，且失败原因都是上游不可达
    #[must_use]
    pub fn is_total_outage(&self) -> bool {
        self.metadata.total_requests > 0
            && self
                .current_period
                .ranges
                .iter()
                .chain(&self.comparison_period.ranges)
                .all(|r| {
                    !r.success
                        && r
                            .error_kind
                            .is_some_and(ProviderErrorKind::is_unreachable)
                })
    }
}
