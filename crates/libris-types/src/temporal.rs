use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Calendar date of a loan event (issue or return).
///
/// Loans are tracked at day granularity; there is no time-of-day or time-zone
/// component. Ordering and subtraction work on whole calendar days, so the
/// distance between two dates is independent of how they were entered.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoanDate(NaiveDate);

impl LoanDate {
    /// Build a date from its components, rejecting impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, TypeError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| TypeError::InvalidDate {
                value: format!("{year:04}-{month:02}-{day:02}"),
            })
    }

    /// Parse an ISO `YYYY-MM-DD` date.
    pub fn parse(raw: &str) -> Result<Self, TypeError> {
        NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| TypeError::InvalidDate {
                value: raw.to_string(),
            })
    }

    pub const fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    pub const fn as_naive(&self) -> NaiveDate {
        self.0
    }

    /// Whole calendar days from `earlier` to `self`. Negative when `self`
    /// precedes `earlier`.
    pub fn days_since(&self, earlier: &Self) -> i64 {
        self.0.signed_duration_since(earlier.0).num_days()
    }

    /// The date `days` calendar days later, or `None` past the representable range.
    pub fn checked_add_days(&self, days: u32) -> Option<Self> {
        self.0.checked_add_days(Days::new(u64::from(days))).map(Self)
    }
}

impl From<NaiveDate> for LoanDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl FromStr for LoanDate {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Debug for LoanDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LoanDate({})", self.0.format(DATE_FORMAT))
    }
}

impl fmt::Display for LoanDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> LoanDate {
        LoanDate::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn parse_iso_date() {
        let parsed = LoanDate::parse("2024-03-09").unwrap();
        assert_eq!(parsed, date(2024, 3, 9));
        assert_eq!(format!("{parsed}"), "2024-03-09");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(LoanDate::parse("09/03/2024").is_err());
        assert!(LoanDate::parse("2024-02-30").is_err());
        assert!("".parse::<LoanDate>().is_err());
    }

    #[test]
    fn from_ymd_rejects_impossible_dates() {
        let err = LoanDate::from_ymd(2023, 2, 29).unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidDate {
                value: "2023-02-29".into()
            }
        );
    }

    #[test]
    fn days_since_crosses_month_and_leap_day() {
        assert_eq!(date(2024, 3, 1).days_since(&date(2024, 2, 28)), 2);
        assert_eq!(date(2023, 3, 1).days_since(&date(2023, 2, 28)), 1);
        assert_eq!(date(2024, 1, 1).days_since(&date(2023, 12, 18)), 14);
    }

    #[test]
    fn days_since_is_negative_backwards() {
        assert_eq!(date(2024, 1, 1).days_since(&date(2024, 1, 5)), -4);
    }

    #[test]
    fn add_days_crosses_year() {
        assert_eq!(date(2023, 12, 25).checked_add_days(14), Some(date(2024, 1, 8)));
    }

    #[test]
    fn serde_uses_iso_text() {
        let json = serde_json::to_string(&date(2024, 6, 1)).unwrap();
        assert_eq!(json, "\"2024-06-01\"");
        let back: LoanDate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, date(2024, 6, 1));
    }

    proptest! {
        #[test]
        fn add_then_diff_is_identity(offset in 0i64..50_000, days in 0u32..5_000) {
            let base = date(1970, 1, 1).checked_add_days(offset as u32).unwrap();
            let later = base.checked_add_days(days).unwrap();
            prop_assert_eq!(later.days_since(&base), i64::from(days));
            prop_assert!(later >= base);
        }
    }
}
