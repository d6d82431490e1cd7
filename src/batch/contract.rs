//! # 响应契约
//!
//! 把 `BatchResult` 整理成前端约定的 JSON 结构。
//!
//! 传输层的 `success` 在部分甚至全部子区间失败时仍为 `true`，降级信息放在 `metadata` 中；
//! 只有所有子区间都因上游不可达而失败时才返回 `success: false` 与 `data: null`。

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::range::{DateRange, PeriodKind};
use super::types::{BatchMetadata, BatchResult, PeriodResult, SubRangeResult};
use crate::logging::{LogComponent, LogStage};
use crate::lwarn;

/// 上游整体不可用时的提示信息
pub const UNAVAILABLE_MESSAGE: &str =
    "Sales data provider is unavailable; no sub-range could be fetched";

/// 响应外壳
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

/// 契约层给出的结果状态，由 HTTP 层映射为状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractStatus {
    Ok,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractResponse<T> {
    pub status: ContractStatus,
    pub body: BatchEnvelope<T>,
}

impl<T> ContractResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            status: ContractStatus::Ok,
            body: BatchEnvelope {
                success: true,
                message: None,
                data: Some(data),
            },
        }
    }

    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self.status, ContractStatus::Unavailable)
    }
}

/// 单个子区间的输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodEntry {
    pub label: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total: f64,
    pub details: Option<Value>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SubRangeResult> for PeriodEntry {
    fn from(result: SubRangeResult) -> Self {
        Self {
            label: result.label,
            start_date: result.range.start(),
            end_date: result.range.end(),
            total: result.total,
            details: result.details,
            success: result.success,
            error: result.error,
        }
    }
}

type Entries = IndexMap<String, PeriodEntry>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyMetadata {
    pub current_week_total: f64,
    pub previous_week_total: f64,
    pub week_over_week_change: Option<f64>,
    #[serde(flatten)]
    pub metrics: BatchMetadata,
}

/// `POST /batch/weekly` 的 `data`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyData {
    pub current_week: Entries,
    pub previous_week: Entries,
    pub metadata: WeeklyMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyMetadata {
    pub current_month_total: f64,
    pub previous_month_total: f64,
    pub month_over_month_change: Option<f64>,
    #[serde(flatten)]
    pub metrics: BatchMetadata,
}

/// `POST /batch/monthly` 的 `data`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyData {
    pub current_month_weeks: Entries,
    pub previous_month_weeks: Entries,
    pub metadata: MonthlyMetadata,
}

/// 汇总接口中的一个周期
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total: f64,
    pub breakdown: Entries,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetadata {
    pub current_total: f64,
    pub comparison_total: f64,
    pub percentage_change: Option<f64>,
    #[serde(flatten)]
    pub metrics: BatchMetadata,
}

/// `POST /dashboard/summary` 的 `data`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryData {
    pub period: PeriodKind,
    pub current_period: SummaryPeriod,
    pub comparison_period: SummaryPeriod,
    pub metadata: SummaryMetadata,
}

/// 上游不可用时的响应
pub fn unavailable<T>(message: impl Into<String>) -> ContractResponse<T> {
    ContractResponse {
        status: ContractStatus::Unavailable,
        body: BatchEnvelope {
            success: false,
            message: Some(message.into()),
            data: None,
        },
    }
}

/// 周对比响应
#[must_use]
pub fn weekly_response(result: BatchResult) -> ContractResponse<WeeklyData> {
    if let Some(outage) = check_outage(&result, "weekly") {
        return outage;
    }

    let BatchResult {
        current_period,
        comparison_period,
        percentage_change,
        metadata,
    } = result;

    ContractResponse::ok(WeeklyData {
        metadata: WeeklyMetadata {
            current_week_total: current_period.total,
            previous_week_total: comparison_period.total,
            week_over_week_change: percentage_change,
            metrics: metadata,
        },
        current_week: entries(current_period),
        previous_week: entries(comparison_period),
    })
}

/// 月对比响应
#[must_use]
pub fn monthly_response(result: BatchResult) -> ContractResponse<MonthlyData> {
    if let Some(outage) = check_outage(&result, "monthly") {
        return outage;
    }

    let BatchResult {
        current_period,
        comparison_period,
        percentage_change,
        metadata,
    } = result;

    ContractResponse::ok(MonthlyData {
        metadata: MonthlyMetadata {
            current_month_total: current_period.total,
            previous_month_total: comparison_period.total,
            month_over_month_change: percentage_change,
            metrics: metadata,
        },
        current_month_weeks: entries(current_period),
        previous_month_weeks: entries(comparison_period),
    })
}

/// 通用周期汇总响应
#[must_use]
pub fn summary_response(
    result: BatchResult,
    kind: PeriodKind,
    current: DateRange,
    comparison: DateRange,
) -> ContractResponse<SummaryData> {
    if let Some(outage) = check_outage(&result, "summary") {
        return outage;
    }

    let BatchResult {
        current_period,
        comparison_period,
        percentage_change,
        metadata,
    } = result;

    ContractResponse::ok(SummaryData {
        period: kind,
        metadata: SummaryMetadata {
            current_total: current_period.total,
            comparison_total: comparison_period.total,
            percentage_change,
            metrics: metadata,
        },
        current_period: summary_period(current, current_period),
        comparison_period: summary_period(comparison, comparison_period),
    })
}

fn check_outage<T>(result: &BatchResult, operation: &str) -> Option<ContractResponse<T>> {
    if !result.is_total_outage() {
        return None;
    }

    lwarn!(
        "system",
        LogStage::Response,
        LogComponent::Contract,
        "provider_unavailable",
        "所有子区间都因上游不可达而失败",
        batch = operation,
        total_requests = result.metadata.total_requests
    );
    Some(unavailable(UNAVAILABLE_MESSAGE))
}

fn entries(period: PeriodResult) -> Entries {
    period
        .ranges
        .into_iter()
        .map(|r| (r.key.clone(), PeriodEntry::from(r)))
        .collect()
}

fn summary_period(range: DateRange, period: PeriodResult) -> SummaryPeriod {
    SummaryPeriod {
        start_date: range.start(),
        end_date: range.end(),
        total: period.total,
        breakdown: entries(period),
    }
}
