//! `Date` type backed by `chrono::NaiveDate`.
//!
//! Dates are stored as a serial number of days so that they stay `Copy`,
//! cheap to compare and cheap to offset.  Serial 1 is January 1, 1900; the
//! valid range is 1901-01-01 to 2199-12-31.  Calendar arithmetic (months,
//! years, weekdays) goes through `chrono`.

use crate::time_unit::TimeUnit;
use chrono::{Datelike, Months, NaiveDate, Weekday};
use ql_core::errors::{Error, Result};

/// `num_days_from_ce()` of 1899-12-31.
const EPOCH_OFFSET: i32 = 693_595;

/// A calendar date.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(i32);

impl Date {
    /// Earliest supported date: January 1, 1901.
    pub const MIN: Date = Date(366);

    /// Latest supported date: December 31, 2199.
    pub const MAX: Date = Date(109_573);

    /// Create a date from year, month (1–12) and day of month.
    ///
    /// # Errors
    /// [`Error::Date`] if the triple is not a valid calendar date or falls
    /// outside [`Date::MIN`]..=[`Date::MAX`].
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        let naive = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| Error::Date(format!("invalid date {year}-{month:02}-{day:02}")))?;
        Self::from_naive(naive)
    }

    /// Create a date from a `chrono::NaiveDate`.
    pub fn from_naive(date: NaiveDate) -> Result<Self> {
        Self::from_serial(date.num_days_from_ce() - EPOCH_OFFSET)
    }

    /// Create a date from its serial number.
    pub fn from_serial(serial: i32) -> Result<Self> {
        let d = Date(serial);
        if d < Self::MIN || d > Self::MAX {
            return Err(Error::Date(format!(
                "serial {serial} outside [{}, {}]",
                Self::MIN.0,
                Self::MAX.0
            )));
        }
        Ok(d)
    }

    /// Today's date according to the local clock.
    pub fn today() -> Self {
        Date(chrono::Local::now().date_naive().num_days_from_ce() - EPOCH_OFFSET)
    }

    /// The serial number.
    pub fn serial(self) -> i32 {
        self.0
    }

    /// The equivalent `chrono::NaiveDate`.
    pub fn naive(self) -> NaiveDate {
        NaiveDate::from_num_days_from_ce_opt(self.0 + EPOCH_OFFSET).unwrap_or_default()
    }

    /// Year.
    pub fn year(self) -> i32 {
        self.naive().year()
    }

    /// Month (1–12).
    pub fn month(self) -> u32 {
        self.naive().month()
    }

    /// Day of the month (1–31).
    pub fn day_of_month(self) -> u32 {
        self.naive().day()
    }

    /// Day of the week.
    pub fn weekday(self) -> Weekday {
        self.naive().weekday()
    }

    /// Return `true` on Saturdays and Sundays.
    pub fn is_weekend(self) -> bool {
        matches!(self.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Advance by `n` calendar days.
    pub fn add_days(self, n: i32) -> Result<Self> {
        Self::from_serial(self.0 + n)
    }

    /// Advance by `n` units.  Month and year steps clamp to the end of the
    /// target month (Jan 31 + 1M = Feb 28/29).
    pub fn advance(self, n: i32, unit: TimeUnit) -> Result<Self> {
        match unit {
            TimeUnit::Days => self.add_days(n),
            TimeUnit::Weeks => self.add_days(n * 7),
            TimeUnit::Months => {
                let months = Months::new(n.unsigned_abs());
                let naive = if n >= 0 {
                    self.naive().checked_add_months(months)
                } else {
                    self.naive().checked_sub_months(months)
                };
                let naive = naive.ok_or_else(|| {
                    Error::Date(format!("{self} advanced by {n} months overflows"))
                })?;
                Self::from_naive(naive)
            }
            TimeUnit::Years => self.advance(n * 12, TimeUnit::Months),
        }
    }

    /// Last calendar day of this date's month.
    pub fn end_of_month(self) -> Self {
        let naive = self.naive();
        let days = days_in_month(naive.year(), naive.month());
        Date(self.0 + (days - naive.day()) as i32)
    }

    /// Return `true` if this is the last calendar day of its month.
    pub fn is_end_of_month(self) -> bool {
        self == self.end_of_month()
    }
}

/// Return `true` if `year` is a leap year.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in `year`.
pub fn days_in_year(year: i32) -> i32 {
    if is_leap_year(year) {
        366
    } else {
        365
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 31,
    }
}

// ── Operators ─────────────────────────────────────────────────────────────────

impl std::ops::Add<i32> for Date {
    type Output = Date;
    fn add(self, days: i32) -> Date {
        Date(self.0 + days)
    }
}

impl std::ops::Sub<i32> for Date {
    type Output = Date;
    fn sub(self, days: i32) -> Date {
        Date(self.0 - days)
    }
}

/// Number of calendar days from `rhs` to `self`.
impl std::ops::Sub<Date> for Date {
    type Output = i32;
    fn sub(self, rhs: Date) -> i32 {
        self.0 - rhs.0
    }
}

impl std::fmt::Display for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.naive().format("%Y-%m-%d"))
    }
}

impl std::fmt::Debug for Date {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Date({self})")
    }
}
