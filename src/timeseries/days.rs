//! Calendar-day expansion of date ranges
//!
//! Each day maps to a UTC bucket `[d T00:00:00Z, d T23:59:59Z]` that is sent
//! upstream as a custom date range.

use chrono::{Days, NaiveDate};
use thiserror::Error;

use crate::query::DateRangeParam;

const LABEL_FORMAT: &str = "%b %d";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid date range: start {start} is after end {end}")]
pub struct InvalidDateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Inclusive range of calendar dates with `start <= end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, InvalidDateRange> {
        if start > end {
            return Err(InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// `today` minus `days` through `today`
    pub fn last_days(days: u32, today: NaiveDate) -> Self {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Calendar days covered, both ends included
    pub fn day_count(&self) -> u64 {
        (self.end - self.start).num_days().unsigned_abs() + 1
    }

    pub fn days(&self) -> Vec<NaiveDate> {
        expand_days(self.start, self.end)
    }

    /// Whole-range query parameter, for single aggregate queries
    pub fn as_param(&self) -> DateRangeParam {
        DateRangeParam::Custom(self.start.to_string(), self.end.to_string())
    }
}

/// Every calendar day from `start` to `end`, inclusive and ascending.
///
/// A reversed range yields no days.
pub fn expand_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    if start > end {
        return Vec::new();
    }
    start.iter_days().take_while(|day| *day <= end).collect()
}

/// UTC bounds of a single calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub start: String,
    pub end: String,
}

impl DayBucket {
    pub fn for_day(date: NaiveDate) -> Self {
        Self {
            date,
            start: format!("{date}T00:00:00Z"),
            end: format!("{date}T23:59:59Z"),
        }
    }

    pub fn label(&self) -> String {
        self.date.format(LABEL_FORMAT).to_string()
    }

    pub fn date_range(&self) -> DateRangeParam {
        DateRangeParam::Custom(self.start.clone(), self.end.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_day_range() {
        assert_eq!(expand_days(date(2024, 3, 5), date(2024, 3, 5)), vec![date(2024, 3, 5)]);
    }

    #[test]
    fn reversed_range_is_empty() {
        assert!(expand_days(date(2024, 3, 6), date(2024, 3, 5)).is_empty());
        assert_eq!(
            DateRange::new(date(2024, 3, 6), date(2024, 3, 5)),
            Err(InvalidDateRange {
                start: date(2024, 3, 6),
                end: date(2024, 3, 5)
            })
        );
    }

    #[test]
    fn day_count_matches_span_across_month_and_leap_day() {
        let cases = [
            (date(2024, 2, 27), date(2024, 3, 2)),
            (date(2023, 12, 30), date(2024, 1, 2)),
            (date(2024, 1, 1), date(2024, 12, 31)),
        ];

        for (start, end) in cases {
            let days = expand_days(start, end);
            let expected = (end - start).num_days() + 1;
            assert_eq!(days.len() as i64, expected);
            assert_eq!(days.first(), Some(&start));
            assert_eq!(days.last(), Some(&end));
            assert!(days.windows(2).all(|w| w[0] < w[1]));
            assert!(days.iter().all(|d| *d >= start && *d <= end));
        }

        assert!(expand_days(date(2024, 2, 28), date(2024, 3, 1)).contains(&date(2024, 2, 29)));
    }

    #[test]
    fn bucket_bounds_are_utc_day_edges() {
        let bucket = DayBucket::for_day(date(2024, 3, 5));
        assert_eq!(bucket.start, "2024-03-05T00:00:00Z");
        assert_eq!(bucket.end, "2024-03-05T23:59:59Z");
        assert_eq!(bucket.label(), "Mar 05");
        assert_eq!(
            bucket.date_range(),
            DateRangeParam::Custom("2024-03-05T00:00:00Z".into(), "2024-03-05T23:59:59Z".into())
        );
    }

    #[test]
    fn last_days_includes_today() {
        let range = DateRange::last_days(30, date(2024, 3, 31));
        assert_eq!(range.start(), date(2024, 3, 1));
        assert_eq!(range.days().len(), 31);
        assert_eq!(range.day_count(), 31);
        assert_eq!(DateRange::single(date(2024, 3, 31)).day_count(), 1);
    }
}
