//! # 日期区间计算
//!
//! 纯函数：根据统计周期推导对比区间，并把区间拆分为批量请求所需的子区间。
//! 所有日期都是闭区间、按自然日计算。

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::types::SubRangeRequest;

/// 日期字符串格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 日期区间相关错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("end date {end} is before start date {start}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: String, value: String },

    #[error("unknown period '{0}', expected day, week or month")]
    UnknownPeriod(String),
}

impl RangeError {
    /// 出错的请求字段名
    #[must_use]
    pub fn field(&self) -> String {
        match self {
            Self::Inverted { .. } => "end_date".to_string(),
            Self::InvalidDate { field, .. } => field.clone(),
            Self::UnknownPeriod(_) => "period".to_string(),
        }
    }
}

/// 解析 `YYYY-MM-DD`
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, RangeError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| RangeError::InvalidDate {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// 闭区间日期范围，保证 `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if start > end {
            return Err(RangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// 单日区间
    #[must_use]
    pub const fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// 从 `start_date`/`end_date` 字符串构造
    pub fn parse(start: &str, end: &str) -> Result<Self, RangeError> {
        let start = parse_date("start_date", start)?;
        let end = parse_date("end_date", end)?;
        Self::new(start, end)
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// 区间包含的天数（含首尾）
    #[must_use]
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// 两个区间是否有交集
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// 区间内的每一天，按时间顺序
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(move |day| *day <= self.end)
    }

    /// 两端同时平移若干天
    #[must_use]
    pub fn shift_days(&self, days: i64) -> Self {
        Self {
            start: self.start + Duration::days(days),
            end: self.end + Duration::days(days),
        }
    }

    /// 两端同时回退一个自然月，日期超出目标月份时截断到月末
    #[must_use]
    pub fn previous_month(&self) -> Self {
        // 截断是单调的，start <= end 不会被破坏
        Self {
            start: sub_one_month(self.start),
            end: sub_one_month(self.end),
        }
    }

    /// 区间的默认键：单日为日期本身，否则为 `start_end`
    #[must_use]
    pub fn key(&self) -> String {
        if self.start == self.end {
            self.start.format(DATE_FORMAT).to_string()
        } else {
            format!(
                "{}_{}",
                self.start.format(DATE_FORMAT),
                self.end.format(DATE_FORMAT)
            )
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

fn sub_one_month(date: NaiveDate) -> NaiveDate {
    // chrono 在目标月份天数不足时会截断到月末；只有超出年份范围才会失败
    date.checked_sub_months(Months::new(1))
        .unwrap_or(NaiveDate::MIN)
}

/// 统计周期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Day,
    Week,
    Month,
}

impl PeriodKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodKind {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Self::Day),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            other => Err(RangeError::UnknownPeriod(other.to_string())),
        }
    }
}

/// 计算对比区间
///
/// - `Week`/`Day`：整体回退 7 天（上周同一星期）
/// - `Month`：整体回退一个自然月，超出目标月份的日期截断到月末
#[must_use]
pub fn comparison_range(range: &DateRange, kind: PeriodKind) -> DateRange {
    match kind {
        PeriodKind::Day | PeriodKind::Week => range.shift_days(-7),
        PeriodKind::Month => range.previous_month(),
    }
}

/// 把区间拆分为子区间请求
///
/// - `Week`：区间内每天一个，键为 ISO 日期，标签为星期名
/// - `Month`：按周一开始的自然周切分，首尾周截断在区间内，键为 `week_1..week_n`
/// - `Day`：区间本身作为唯一的子区间
#[must_use]
pub fn decompose(range: &DateRange, kind: PeriodKind) -> Vec<SubRangeRequest> {
    match kind {
        PeriodKind::Day => vec![SubRangeRequest::new(
            range.key(),
            range.start().format("%A").to_string(),
            *range,
        )],
        PeriodKind::Week => range
            .days()
            .map(|day| {
                SubRangeRequest::new(
                    day.format(DATE_FORMAT).to_string(),
                    day.format("%A").to_string(),
                    DateRange::single_day(day),
                )
            })
            .collect(),
        PeriodKind::Month => calendar_weeks(range)
            .into_iter()
            .enumerate()
            .map(|(index, week)| {
                let number = index + 1;
                SubRangeRequest::new(
                    format!("week_{number}"),
                    format!(
                        "Week {number} ({} - {})",
                        week.start().format("%b %d"),
                        week.end().format("%b %d")
                    ),
                    week,
                )
            })
            .collect(),
    }
}

/// 按周一开始的自然周切分区间
fn calendar_weeks(range: &DateRange) -> Vec<DateRange> {
    let mut weeks = Vec::new();
    let mut cursor = range.start();

    while cursor <= range.end() {
        let days_to_sunday = 6 - i64::from(cursor.weekday().num_days_from_monday());
        let week_end = (cursor + Duration::days(days_to_sunday)).min(range.end());
        weeks.push(DateRange {
            start: cursor,
            end: week_end,
        });
        cursor = week_end + Duration::days(1);
    }

    weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn range(start: &str, end: &str) -> DateRange {
        DateRange::parse(start, end).unwrap()
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = DateRange::parse("2025-01-10", "2025-01-09").unwrap_err();
        assert!(matches!(err, RangeError::Inverted { .. }));
        assert_eq!(err.field(), "end_date");
    }

    #[test]
    fn test_invalid_date_reports_field() {
        let err = DateRange::parse("2025-13-01", "2025-01-09").unwrap_err();
        assert_eq!(err.field(), "start_date");
        assert!(err.to_string().contains("2025-13-01"));
    }

    #[test]
    fn test_week_comparison() {
        assert_eq!(
            comparison_range(&range("2025-01-08", "2025-01-14"), PeriodKind::Week),
            range("2025-01-01", "2025-01-07")
        );
    }

    #[test]
    fn test_day_comparison_is_same_weekday_last_week() {
        let compared = comparison_range(&range("2025-09-03", "2025-09-03"), PeriodKind::Day);
        assert_eq!(compared, range("2025-08-27", "2025-08-27"));
        assert_eq!(compared.start().weekday(), date("2025-09-03").weekday());
    }

    #[rstest]
    #[case("2025-01-31", "2025-01-31", "2024-12-31", "2024-12-31")]
    #[case("2025-03-31", "2025-03-31", "2025-02-28", "2025-02-28")]
    #[case("2024-03-31", "2024-03-31", "2024-02-29", "2024-02-29")]
    #[case("2025-03-01", "2025-03-31", "2025-02-01", "2025-02-28")]
    #[case("2025-03-30", "2025-03-31", "2025-02-28", "2025-02-28")]
    fn test_month_comparison_clamps(
        #[case] start: &str,
        #[case] end: &str,
        #[case] expected_start: &str,
        #[case] expected_end: &str,
    ) {
        assert_eq!(
            comparison_range(&range(start, end), PeriodKind::Month),
            range(expected_start, expected_end)
        );
    }

    #[test]
    fn test_week_decomposition_is_complete_and_ordered() {
        let week = range("2025-09-02", "2025-09-08");
        let parts = decompose(&week, PeriodKind::Week);

        assert_eq!(parts.len(), 7);
        assert_eq!(parts[0].key, "2025-09-02");
        assert_eq!(parts[0].label, "Tuesday");
        assert_eq!(parts[6].key, "2025-09-08");

        for pair in parts.windows(2) {
            assert_eq!(pair[0].range.end() + Duration::days(1), pair[1].range.start());
        }
        assert_eq!(parts.first().unwrap().range.start(), week.start());
        assert_eq!(parts.last().unwrap().range.end(), week.end());
    }

    #[rstest]
    #[case("2025-09-02", "2025-09-02", 1)]
    #[case("2025-09-02", "2025-09-04", 3)]
    #[case("2025-12-29", "2026-01-04", 7)]
    fn test_short_week_decomposes_only_present_days(
        #[case] start: &str,
        #[case] end: &str,
        #[case] expected: usize,
    ) {
        let parts = decompose(&range(start, end), PeriodKind::Week);
        assert_eq!(parts.len(), expected);
        assert!(parts.iter().all(|p| p.range.num_days() == 1));
    }

    #[test]
    fn test_month_decomposition_uses_monday_weeks() {
        // 2025-09-01 是周一
        let parts = decompose(&range("2025-09-01", "2025-09-30"), PeriodKind::Month);
        let keys: Vec<&str> = parts.iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys, vec!["week_1", "week_2", "week_3", "week_4", "week_5"]);
        assert_eq!(parts[0].range, range("2025-09-01", "2025-09-07"));
        assert_eq!(parts[4].range, range("2025-09-29", "2025-09-30"));
        assert_eq!(parts[0].label, "Week 1 (Sep 01 - Sep 07)");
    }

    #[test]
    fn test_month_decomposition_truncates_edges() {
        // 2025-10-01 是周三
        let parts = decompose(&range("2025-10-01", "2025-10-31"), PeriodKind::Month);
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0].range, range("2025-10-01", "2025-10-05"));
        assert_eq!(parts[4].range, range("2025-10-27", "2025-10-31"));

        let covered: i64 = parts.iter().map(|p| p.range.num_days()).sum();
        assert_eq!(covered, 31);
    }

    #[test]
    fn test_month_decomposition_across_month_boundary() {
        let parts = decompose(&range("2025-09-25", "2025-10-08"), PeriodKind::Month);
        assert_eq!(parts[0].range, range("2025-09-25", "2025-09-28"));
        assert_eq!(parts[1].range, range("2025-09-29", "2025-10-05"));
        assert_eq!(parts[2].range, range("2025-10-06", "2025-10-08"));
    }

    #[test]
    fn test_sunday_start_month_touches_six_weeks() {
        // 2025-06-01 是周日
        let parts = decompose(&range("2025-06-01", "2025-06-30"), PeriodKind::Month);
        assert_eq!(parts.len(), 6);
        assert_eq!(parts[0].range.num_days(), 1);
    }

    #[test]
    fn test_day_decomposition_is_identity() {
        let day = range("2025-09-03", "2025-09-03");
        let parts = decompose(&day, PeriodKind::Day);
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].range, day);
        assert_eq!(parts[0].key, "2025-09-03");
    }

    #[test]
    fn test_period_kind_parsing() {
        assert_eq!("week".parse::<PeriodKind>().unwrap(), PeriodKind::Week);
        assert_eq!("Monthly".parse::<PeriodKind>().unwrap(), PeriodKind::Month);
        assert!("year".parse::<PeriodKind>().is_err());
    }

    #[test]
    fn test_overlap_detection() {
        let a = range("2025-09-01", "2025-09-07");
        assert!(a.overlaps(&range("2025-09-07", "2025-09-10")));
        assert!(!a.overlaps(&range("2025-09-08", "2025-09-10")));
    }
}
