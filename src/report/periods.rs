//! Calendar bucketing of a report range.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ReportError;
use crate::domain::{Period, TICK};

/// Bucketing unit of a report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
    Year,
}

impl Granularity {
    /// First day of the bucket containing `date`
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Self::Day => date,
            Self::Month => date.with_day(1).unwrap_or(date),
            Self::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date),
        }
    }

    /// First day of the bucket following the one starting at `bucket_start`.
    /// `None` past the end of the representable calendar.
    pub fn next_bucket(self, bucket_start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Day => bucket_start.succ_opt(),
            Self::Month => {
                let (year, month) = match bucket_start.month() {
                    12 => (bucket_start.year() + 1, 1),
                    m => (bucket_start.year(), m + 1),
                };
                NaiveDate::from_ymd_opt(year, month, 1)
            }
            Self::Year => NaiveDate::from_ymd_opt(bucket_start.year() + 1, 1, 1),
        }
    }

    /// Number of buckets touched by the dates `start..=end`, without building
    /// them. Zero when `start > end`.
    pub fn bucket_count(self, start: NaiveDate, end: NaiveDate) -> u64 {
        if start > end {
            return 0;
        }
        let span = match self {
            Self::Day => (end - start).num_days(),
            Self::Month => {
                let months = |d: NaiveDate| i64::from(d.year()) * 12 + i64::from(d.month0());
                months(end) - months(start)
            }
            Self::Year => i64::from(end.year()) - i64::from(start.year()),
        };
        span.unsigned_abs() + 1
    }

    pub fn label(self, date: NaiveDate) -> String {
        let fmt = match self {
            Self::Day => "%d.%m.%Y",
            Self::Month => "%m.%Y",
            Self::Year => "%Y",
        };
        date.format(fmt).to_string()
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day => write!(f, "day"),
            Self::Month => write!(f, "month"),
            Self::Year => write!(f, "year"),
        }
    }
}

impl FromStr for Granularity {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(ReportError::InvalidGranularity(s.to_string())),
        }
    }
}

/// Split `[start, end]` into consecutive calendar buckets, each clipped to
/// the range. Empty when `start > end`.
pub fn generate_periods(
    start: NaiveDateTime,
    end: NaiveDateTime,
    granularity: Granularity,
) -> Vec<Period> {
    let mut periods = Vec::new();
    if start > end {
        return periods;
    }

    let mut cursor = granularity.bucket_start(start.date());
    while cursor <= end.date() {
        let next = granularity.next_bucket(cursor);
        let bucket_end = match next {
            Some(next) => next.and_time(NaiveTime::MIN) - TICK,
            None => NaiveDateTime::MAX,
        };

        periods.push(Period {
            label: granularity.label(cursor),
            range_start: cursor.and_time(NaiveTime::MIN).max(start),
            range_end: bucket_end.min(end),
        });

        match next {
            Some(next) => cursor = next,
            None => break,
        }
    }

    periods
}

/// The single period used when a report has no granularity
pub fn whole_range(start: NaiveDateTime, end: NaiveDateTime) -> Period {
    Period {
        label: format!(
            "{}-{}",
            start.date().format("%d.%m.%Y"),
            end.date().format("%d.%m.%Y")
        ),
        range_start: start,
        range_end: end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn end_of_day(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .unwrap()
    }

    #[rstest]
    #[case("day", Granularity::Day)]
    #[case("Month", Granularity::Month)]
    #[case(" year ", Granularity::Year)]
    fn test_parse_granularity(#[case] input: &str, #[case] expected: Granularity) {
        assert_eq!(input.parse::<Granularity>().unwrap(), expected);
    }

    #[test]
    fn test_parse_invalid_granularity() {
        let err = "week".parse::<Granularity>().unwrap_err();
        assert!(matches!(err, ReportError::InvalidGranularity(ref v) if v == "week"));
    }

    #[test]
    fn test_daily_periods() {
        let periods = generate_periods(at(2025, 1, 1, 0, 0), end_of_day(2025, 1, 3), Granularity::Day);
        let labels: Vec<_> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["01.01.2025", "02.01.2025", "03.01.2025"]);
        assert_eq!(periods[1].range_start, at(2025, 1, 2, 0, 0));
        assert_eq!(periods[1].range_end, end_of_day(2025, 1, 2));
    }

    #[test]
    fn test_month_boundary_is_clipped() {
        let start = at(2025, 1, 30, 0, 0);
        let end = end_of_day(2025, 2, 2);
        let periods = generate_periods(start, end, Granularity::Month);

        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].label, "01.2025");
        assert_eq!(periods[0].range_start, start);
        assert_eq!(periods[0].range_end, end_of_day(2025, 1, 31));
        assert_eq!(periods[1].label, "02.2025");
        assert_eq!(periods[1].range_start, at(2025, 2, 1, 0, 0));
        assert_eq!(periods[1].range_end, end);
    }

    #[test]
    fn test_leap_february() {
        let periods = generate_periods(at(2024, 1, 15, 0, 0), end_of_day(2024, 4, 10), Granularity::Month);
        let labels: Vec<_> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["01.2024", "02.2024", "03.2024", "04.2024"]);
        assert_eq!(periods[1].range_end, end_of_day(2024, 2, 29));
    }

    #[test]
    fn test_month_iteration_from_the_31st() {
        // Jan 31 must not skip February
        let periods = generate_periods(at(2025, 1, 31, 12, 0), end_of_day(2025, 3, 1), Granularity::Month);
        let labels: Vec<_> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["01.2025", "02.2025", "03.2025"]);
    }

    #[test]
    fn test_yearly_periods() {
        let periods = generate_periods(at(2023, 11, 5, 8, 30), at(2025, 2, 1, 0, 0), Granularity::Year);
        let labels: Vec<_> = periods.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2023", "2024", "2025"]);
        assert_eq!(periods[0].range_start, at(2023, 11, 5, 8, 30));
        assert_eq!(periods[1].range_end, end_of_day(2024, 12, 31));
        assert_eq!(periods[2].range_end, at(2025, 2, 1, 0, 0));
    }

    #[test]
    fn test_single_instant_range() {
        let t = at(2025, 6, 1, 12, 0);
        let periods = generate_periods(t, t, Granularity::Day);
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].range_start, t);
        assert_eq!(periods[0].range_end, t);
    }

    #[test]
    fn test_reversed_range_is_empty() {
        assert!(generate_periods(at(2025, 2, 1, 0, 0), at(2025, 1, 1, 0, 0), Granularity::Day).is_empty());
    }

    #[rstest]
    #[case(Granularity::Day, 3)]
    #[case(Granularity::Month, 2)]
    #[case(Granularity::Year, 1)]
    fn test_bucket_count(#[case] g: Granularity, #[case] expected: u64) {
        let start = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        assert_eq!(g.bucket_count(start, end), expected);
        assert_eq!(g.bucket_count(end, start), 0);
    }

    #[test]
    fn test_bucket_count_of_widest_range() {
        let start = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(9999, 12, 31).unwrap();
        assert_eq!(Granularity::Day.bucket_count(start, end), 3_652_059);
        assert_eq!(Granularity::Month.bucket_count(start, end), 9999 * 12);
        assert_eq!(Granularity::Year.bucket_count(start, end), 9999);
    }

    #[test]
    fn test_whole_range_label() {
        let p = whole_range(at(2025, 1, 1, 0, 0), end_of_day(2025, 3, 31));
        assert_eq!(p.label, "01.01.2025-31.03.2025");
    }

    fn granularity() -> impl Strategy<Value = Granularity> {
        prop_oneof![
            Just(Granularity::Day),
            Just(Granularity::Month),
            Just(Granularity::Year),
        ]
    }

    proptest! {
        #[test]
        fn prop_periods_partition_range(
            start_offset in 0i64..(3 * 365 * 24 * 60),
            len in 0i64..(800 * 24 * 60),
            g in granularity(),
        ) {
            let base = at(2023, 1, 1, 0, 0);
            let start = base + chrono::Duration::minutes(start_offset);
            let end = start + chrono::Duration::minutes(len);
            let periods = generate_periods(start, end, g);

            prop_assert!(!periods.is_empty());
            prop_assert_eq!(periods.len() as u64, g.bucket_count(start.date(), end.date()));
            prop_assert_eq!(periods[0].range_start, start);
            prop_assert_eq!(periods.last().unwrap().range_end, end);
            for p in &periods {
                prop_assert!(p.range_start <= p.range_end);
            }
            for pair in periods.windows(2) {
                prop_assert_eq!(pair[0].range_end + TICK, pair[1].range_start);
                prop_assert_ne!(&pair[0].label, &pair[1].label);
            }
        }
    }
}
