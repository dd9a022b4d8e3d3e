//! Monday-aligned weeks and inclusive week windows.

use std::fmt;

use chrono::{Datelike, NaiveDate, TimeDelta, Weekday};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Start date of a sales week. Always a Monday.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Week(NaiveDate);

impl Week {
    /// The week containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let back = i64::from(date.weekday().num_days_from_monday());
        Self(date - TimeDelta::days(back))
    }

    /// Wrap a date that must already be a Monday.
    pub fn from_monday(date: NaiveDate) -> Result<Self, ModelError> {
        if date.weekday() != Weekday::Mon {
            return Err(ModelError::NotMonday { date });
        }
        Ok(Self(date))
    }

    pub fn date(self) -> NaiveDate {
        self.0
    }

    /// Shift by a whole number of weeks (negative moves back).
    pub fn offset(self, weeks: i64) -> Self {
        Self(self.0 + TimeDelta::weeks(weeks))
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    pub fn previous(self) -> Self {
        self.offset(-1)
    }

    /// Whole weeks from `earlier` to `self`, floored.
    pub fn weeks_since(self, earlier: Week) -> i64 {
        (self.0 - earlier.0).num_days().div_euclid(7)
    }

    pub fn days_since(self, earlier: Week) -> i64 {
        (self.0 - earlier.0).num_days()
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Inclusive range of weeks `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: Week,
    pub end: Week,
}

impl WeekRange {
    pub fn new(start: Week, end: Week) -> Result<Self, ModelError> {
        if end < start {
            return Err(ModelError::InvalidWindow {
                start: start.date(),
                end: end.date(),
            });
        }
        Ok(Self { start, end })
    }

    /// Window of `weeks` weeks ending at `end` (inclusive).
    ///
    /// `weeks` of zero is treated as one.
    pub fn ending_at(end: Week, weeks: u32) -> Self {
        let span = i64::from(weeks.max(1)) - 1;
        Self {
            start: end.offset(-span),
            end,
        }
    }

    pub fn contains(&self, week: Week) -> bool {
        self.start <= week && week <= self.end
    }

    /// Number of calendar weeks covered.
    pub fn len_weeks(&self) -> u32 {
        let weeks = self.end.weeks_since(self.start) + 1;
        u32::try_from(weeks).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for WeekRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn containing_aligns_back_to_monday() {
        // 2024-01-04 is a Thursday
        assert_eq!(Week::containing(date(2024, 1, 4)).date(), date(2024, 1, 1));
        assert_eq!(Week::containing(date(2024, 1, 1)).date(), date(2024, 1, 1));
        assert_eq!(Week::containing(date(2024, 1, 7)).date(), date(2024, 1, 1));
    }

    #[test]
    fn from_monday_rejects_other_days() {
        assert!(Week::from_monday(date(2024, 1, 2)).is_err());
        assert!(Week::from_monday(date(2024, 1, 8)).is_ok());
    }

    #[test]
    fn weeks_since_floors() {
        let a = Week::containing(date(2024, 1, 1));
        let b = a.offset(3);
        assert_eq!(b.weeks_since(a), 3);
        assert_eq!(a.weeks_since(b), -3);
    }

    #[test]
    fn range_ending_at() {
        let end = Week::containing(date(2024, 2, 5));
        let range = WeekRange::ending_at(end, 4);
        assert_eq!(range.start, end.offset(-3));
        assert_eq!(range.len_weeks(), 4);
        assert!(range.contains(end.offset(-2)));
        assert!(!range.contains(end.next()));
    }
}
