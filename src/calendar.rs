//! Calendar-day utilities
//!
//! Every analyzer buckets and offsets dates through this module so that day
//! truncation, day offsets and month keys behave identically everywhere.
//! Timestamps are treated as already normalized to a single zone.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Truncate a timestamp to its calendar day
pub fn truncate_to_day(timestamp: NaiveDateTime) -> NaiveDate {
    timestamp.date()
}

/// Offset a day by `days` (may be negative). `None` if the result leaves the
/// representable date range.
pub fn add_days(day: NaiveDate, days: i64) -> Option<NaiveDate> {
    day.checked_add_signed(Duration::try_days(days)?)
}

/// Whole days from `earlier` to `later` (negative if `later` is before `earlier`)
pub fn day_difference(later: NaiveDate, earlier: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Whether `day` lies in the closed interval `[start, start + window_days]`
pub fn within_window(day: NaiveDate, start: NaiveDate, window_days: i64) -> bool {
    let offset = day_difference(day, start);
    (0..=window_days).contains(&offset)
}

/// Calendar year-month bucket key, rendered as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Build a key; `None` if `month` is not in 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    /// Month containing `day`
    pub fn from_date(day: NaiveDate) -> Self {
        Self {
            year: day.year(),
            month: day.month(),
        }
    }

    /// Month containing `timestamp`
    pub fn from_timestamp(timestamp: NaiveDateTime) -> Self {
        Self::from_date(truncate_to_day(timestamp))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("expected YYYY-MM, got `{s}`"))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in `{s}`"))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in `{s}`"))?;
        YearMonth::new(year, month).ok_or_else(|| format!("month out of range in `{s}`"))
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
