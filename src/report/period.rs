//! Reporting period: the (year, month) bucket a report covers.

use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::{MailKpiError, Result};

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBucket {
    pub year: i32,
    /// 1..=12
    pub month: u32,
}

impl MonthBucket {
    /// Bucket `offset` months before the month of `today` (`offset <= 0`).
    ///
    /// The rollover follows the long-standing report arithmetic, including
    /// its branch for offsets reaching back a year or more.
    pub fn from_offset(today: NaiveDate, offset: i32) -> Result<Self> {
        if offset > 0 {
            return Err(MailKpiError::InvalidMonthOffset(offset));
        }
        let current_year = today.year();
        let total = today.month() as i32 + offset;

        let (year, month) = if total >= 1 {
            (current_year, total)
        } else if total == 0 {
            (current_year - 1, 12)
        } else if total > -12 {
            (current_year - 1, 12 - (total.abs() % 12))
        } else {
            (
                current_year - total.abs() / 12 - 1,
                12 - (total.abs() % 12),
            )
        };

        Ok(Self {
            year,
            month: month as u32,
        })
    }

    /// Whether a date falls in this bucket.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Cut-off used for backlog: midnight at the start of the month's last day.
    ///
    /// Years chrono cannot represent clamp to the nearest end of its range.
    pub fn month_end(&self) -> NaiveDateTime {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|first| first.pred_opt())
            .and_then(|last| last.and_hms_opt(0, 0, 0))
            .unwrap_or(if self.year < 0 {
                NaiveDateTime::MIN
            } else {
                NaiveDateTime::MAX
            })
    }

    /// Column header of the report, e.g. `2024-3`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.year, self.month)
    }
}

impl fmt::Display for MonthBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn bucket(today: NaiveDate, offset: i32) -> (i32, u32) {
        let b = MonthBucket::from_offset(today, offset).unwrap();
        (b.year, b.month)
    }

    #[test]
    fn test_zero_offset_is_current_month() {
        assert_eq!(bucket(day(2024, 7, 15), 0), (2024, 7));
    }

    #[test]
    fn test_january_minus_one_is_previous_december() {
        assert_eq!(bucket(day(2024, 1, 10), -1), (2023, 12));
    }

    #[test]
    fn test_within_same_year() {
        assert_eq!(bucket(day(2024, 7, 1), -6), (2024, 1));
    }

    #[test]
    fn test_previous_year() {
        assert_eq!(bucket(day(2024, 3, 1), -5), (2023, 10));
        assert_eq!(bucket(day(2024, 3, 1), -14), (2023, 1));
    }

    #[test]
    fn test_multi_year_offsets() {
        // total = -12
        assert_eq!(bucket(day(2024, 3, 1), -15), (2022, 12));
        // total = -13
        assert_eq!(bucket(day(2024, 3, 1), -16), (2022, 11));
        // total = -24
        assert_eq!(bucket(day(2024, 1, 1), -25), (2021, 12));
    }

    #[test]
    fn test_positive_offset_rejected() {
        assert!(matches!(
            MonthBucket::from_offset(day(2024, 1, 1), 1),
            Err(MailKpiError::InvalidMonthOffset(1))
        ));
    }

    #[test]
    fn test_month_end_is_start_of_last_day() {
        let feb = MonthBucket {
            year: 2024,
            month: 2,
        };
        assert_eq!(
            feb.month_end(),
            day(2024, 2, 29).and_hms_opt(0, 0, 0).unwrap()
        );
        let dec = MonthBucket {
            year: 2023,
            month: 12,
        };
        assert_eq!(
            dec.month_end(),
            day(2023, 12, 31).and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_month_end_far_past_clamps_to_min() {
        let b = MonthBucket::from_offset(day(2024, 3, 1), -12_000_000).unwrap();
        assert!(b.year < NaiveDate::MIN.year());
        assert_eq!(b.month_end(), NaiveDateTime::MIN);
    }

    #[test]
    fn test_contains_and_label() {
        let b = MonthBucket {
            year: 2024,
            month: 3,
        };
        assert!(b.contains(day(2024, 3, 31)));
        assert!(!b.contains(day(2023, 3, 1)));
        assert_eq!(b.label(), "2024-3");
    }
}
