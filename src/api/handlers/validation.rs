//! # 请求参数校验
//!
//! 把入站 JSON 转换为子区间请求。所有问题按字段收集后一次性返回，
//! 字段名形如 `current_week.3`、`current_month_weeks.1.start_date`。

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;

use crate::batch::range::{DATE_FORMAT, DateRange, PeriodKind, parse_date};
use crate::batch::types::SubRangeRequest;
use crate::config::BatchConfig;
use crate::error::ValidationErrors;

/// 单日周期请求允许的天数
const MAX_DAY_PERIOD_DAYS: i64 = 1;
/// 月周期请求允许的天数
const MAX_MONTH_PERIOD_DAYS: i64 = 31;

/// `POST /batch/weekly` 请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeeklyBatchRequest {
    #[serde(default)]
    pub current_week: Vec<String>,
    #[serde(default)]
    pub previous_week: Vec<String>,
}

/// 月度批次中的一周
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthWeekInput {
    #[serde(default)]
    pub week_key: String,
    #[serde(default)]
    pub week_name: Option<String>,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

/// `POST /batch/monthly` 请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthlyBatchRequest {
    #[serde(default)]
    pub current_month_weeks: Vec<MonthWeekInput>,
    #[serde(default)]
    pub previous_month_weeks: Vec<MonthWeekInput>,
}

/// `POST /dashboard/summary` 请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryRequest {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub period: String,
}

/// 校验通过的对比批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBatch {
    pub current: Vec<SubRangeRequest>,
    pub comparison: Vec<SubRangeRequest>,
}

/// 校验通过的汇总请求
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedSummary {
    pub range: DateRange,
    pub kind: PeriodKind,
}

/// 校验周对比请求
///
/// 当前周 1..=`max_week_days` 个日期，上周 0..=`max_week_days` 个；日期合法、不重复、不晚于今天。
pub fn validate_weekly(
    request: &WeeklyBatchRequest,
    today: NaiveDate,
    config: &BatchConfig,
) -> Result<ValidatedBatch, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let current = weekly_days(
        "current_week",
        &request.current_week,
        true,
        today,
        config,
        &mut errors,
    );
    let comparison = weekly_days(
        "previous_week",
        &request.previous_week,
        false,
        today,
        config,
        &mut errors,
    );
    errors.into_result(ValidatedBatch {
        current,
        comparison,
    })
}

fn weekly_days(
    field: &str,
    dates: &[String],
    required: bool,
    today: NaiveDate,
    config: &BatchConfig,
    errors: &mut ValidationErrors,
) -> Vec<SubRangeRequest> {
    let max = usize::try_from(config.max_week_days).unwrap_or(usize::MAX);
    if required && dates.is_empty() {
        errors.add(field, "至少需要一个日期");
    }
    if dates.len() > max {
        errors.add(field, format!("最多允许 {max} 个日期"));
    }

    let mut seen = HashSet::new();
    let mut requests = Vec::with_capacity(dates.len());
    for (index, raw) in dates.iter().enumerate() {
        let item = format!("{field}.{index}");
        let day = match parse_date(&item, raw) {
            Ok(day) => day,
            Err(e) => {
                errors.add(item, e.to_string());
                continue;
            }
        };
        if day > today {
            errors.add(&item, format!("日期 {raw} 晚于今天"));
        }
        if !seen.insert(day) {
            errors.add(&item, format!("日期 {raw} 重复"));
            continue;
        }
        requests.push(SubRangeRequest::new(
            day.format(DATE_FORMAT).to_string(),
            day.format("%A").to_string(),
            DateRange::single_day(day),
        ));
    }
    requests
}

/// 校验月对比请求
///
/// 每组 1..=`max_weeks` 周（上月组可以为空）；键非空且唯一，区间合法、
/// 不超过 `max_week_days` 天、不晚于今天，组内各周互不重叠。
pub fn validate_monthly(
    request: &MonthlyBatchRequest,
    today: NaiveDate,
    config: &BatchConfig,
) -> Result<ValidatedBatch, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let current = month_weeks(
        "current_month_weeks",
        &request.current_month_weeks,
        true,
        today,
        config,
        &mut errors,
    );
    let comparison = month_weeks(
        "previous_month_weeks",
        &request.previous_month_weeks,
        false,
        today,
        config,
        &mut errors,
    );
    errors.into_result(ValidatedBatch {
        current,
        comparison,
    })
}

fn month_weeks(
    field: &str,
    weeks: &[MonthWeekInput],
    required: bool,
    today: NaiveDate,
    config: &BatchConfig,
    errors: &mut ValidationErrors,
) -> Vec<SubRangeRequest> {
    if required && weeks.is_empty() {
        errors.add(field, "至少需要一周");
    }
    if weeks.len() > config.max_weeks {
        errors.add(field, format!("最多允许 {} 周", config.max_weeks));
    }

    let mut keys = HashSet::new();
    let mut requests: Vec<SubRangeRequest> = Vec::with_capacity(weeks.len());
    // 所有解析成功的区间，包括因其他原因被拒绝的周
    let mut parsed: Vec<(String, DateRange)> = Vec::with_capacity(weeks.len());
    for (index, week) in weeks.iter().enumerate() {
        let item = format!("{field}.{index}");
        let key = week.week_key.trim();
        let mut valid = true;

        if key.is_empty() {
            errors.add(format!("{item}.week_key"), "不能为空");
            valid = false;
        } else if !keys.insert(key.to_string()) {
            errors.add(format!("{item}.week_key"), format!("键 {key} 重复"));
            valid = false;
        }

        let start_field = format!("{item}.start_date");
        let end_field = format!("{item}.end_date");
        let start = parse_date(&start_field, &week.start_date)
            .map_err(|e| errors.add(&start_field, e.to_string()))
            .ok();
        let end = parse_date(&end_field, &week.end_date)
            .map_err(|e| errors.add(&end_field, e.to_string()))
            .ok();
        let (Some(start), Some(end)) = (start, end) else {
            continue;
        };

        let range = match DateRange::new(start, end) {
            Ok(range) => range,
            Err(e) => {
                errors.add(&end_field, e.to_string());
                continue;
            }
        };
        if range.num_days() > config.max_week_days {
            errors.add(
                &item,
                format!("每周最多 {} 天，实际 {} 天", config.max_week_days, range.num_days()),
            );
            valid = false;
        }
        if range.end() > today {
            errors.add(&end_field, "日期晚于今天");
            valid = false;
        }
        if let Some((other, _)) = parsed.iter().find(|(_, r)| r.overlaps(&range)) {
            errors.add(&item, format!("与 {other} 的日期区间重叠"));
            valid = false;
        }
        parsed.push((item.clone(), range));

        if valid {
            let label = week
                .week_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(key);
            requests.push(SubRangeRequest::new(key, label, range));
        }
    }
    requests
}

/// 校验汇总请求
///
/// `day` 周期只允许单日，`week` 最多 `max_week_days` 天，`month` 最多 31 天。
pub fn validate_summary(
    request: &SummaryRequest,
    today: NaiveDate,
    config: &BatchConfig,
) -> Result<ValidatedSummary, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let kind = request
        .period
        .parse::<PeriodKind>()
        .map_err(|e| errors.add(e.field(), e.to_string()))
        .ok();
    let range = DateRange::parse(&request.start_date, &request.end_date)
        .map_err(|e| errors.add(e.field(), e.to_string()))
        .ok();

    if let (Some(kind), Some(range)) = (kind, range) {
        let max_days = match kind {
            PeriodKind::Day => MAX_DAY_PERIOD_DAYS,
            PeriodKind::Week => config.max_week_days,
            PeriodKind::Month => MAX_MONTH_PERIOD_DAYS,
        };
        if range.num_days() > max_days {
            errors.add(
                "end_date",
                format!("{kind} 周期最多 {max_days} 天，实际 {} 天", range.num_days()),
            );
        }
        if range.end() > today {
            errors.add("end_date", "日期晚于今天");
        }
        return errors.into_result(ValidatedSummary { range, kind });
    }

    Err(errors)
}
