//! Day-count conventions.
//!
//! A day counter turns a pair of dates into a year fraction.  The set is
//! closed, so it is an enum: term structures copy it by value and composed
//! structures can hand their original's counter straight through.

use crate::date::{days_in_year, Date};
use ql_core::{Real, Time};

/// A convention for measuring the fraction of a year between two dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DayCounter {
    /// Actual days / 365.
    #[default]
    Actual365Fixed,
    /// Actual days / 360.
    Actual360,
    /// 30/360 (bond basis).
    Thirty360,
    /// Actual/Actual (ISDA): each calendar year weighted by its own length.
    ActualActualIsda,
}

impl DayCounter {
    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            DayCounter::Actual365Fixed => "Actual/365 (Fixed)",
            DayCounter::Actual360 => "Actual/360",
            DayCounter::Thirty360 => "30/360 (Bond Basis)",
            DayCounter::ActualActualIsda => "Actual/Actual (ISDA)",
        }
    }

    /// Number of days from `d1` to `d2` under this convention.
    pub fn day_count(self, d1: Date, d2: Date) -> i32 {
        match self {
            DayCounter::Thirty360 => {
                let (y1, m1, mut dd1) = (d1.year(), d1.month() as i32, d1.day_of_month() as i32);
                let (y2, m2, mut dd2) = (d2.year(), d2.month() as i32, d2.day_of_month() as i32);
                if dd1 == 31 {
                    dd1 = 30;
                }
                if dd2 == 31 && dd1 == 30 {
                    dd2 = 30;
                }
                360 * (y2 - y1) + 30 * (m2 - m1) + (dd2 - dd1)
            }
            _ => d2 - d1,
        }
    }

    /// Fraction of a year from `d1` to `d2`; negative if `d2 < d1`.
    pub fn year_fraction(self, d1: Date, d2: Date) -> Time {
        match self {
            DayCounter::Actual365Fixed => self.day_count(d1, d2) as Real / 365.0,
            DayCounter::Actual360 | DayCounter::Thirty360 => {
                self.day_count(d1, d2) as Real / 360.0
            }
            DayCounter::ActualActualIsda => {
                if d1 > d2 {
                    return -self.year_fraction(d2, d1);
                }
                let (y1, y2) = (d1.year(), d2.year());
                if y1 == y2 {
                    return (d2 - d1) as Real / days_in_year(y1) as Real;
                }
                let start_of = |y: i32| Date::from_ymd(y, 1, 1).unwrap_or(Date::MAX);
                let mut sum = (start_of(y1 + 1) - d1) as Real / days_in_year(y1) as Real;
                sum += (y2 - y1 - 1) as Real;
                sum += (d2 - start_of(y2)) as Real / days_in_year(y2) as Real;
                sum
            }
        }
    }
}

impl std::fmt::Display for DayCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn actual_conventions() {
        let (d1, d2) = (date(2023, 1, 1), date(2024, 1, 1));
        assert_abs_diff_eq!(DayCounter::Actual365Fixed.year_fraction(d1, d2), 1.0);
        assert_abs_diff_eq!(DayCounter::Actual360.year_fraction(d1, d2), 365.0 / 360.0);
        assert_abs_diff_eq!(DayCounter::Actual365Fixed.year_fraction(d2, d1), -1.0);
    }

    #[test]
    fn thirty_360_month_ends() {
        let dc = DayCounter::Thirty360;
        assert_eq!(dc.day_count(date(2023, 1, 31), date(2023, 3, 31)), 60);
        assert_eq!(dc.day_count(date(2023, 1, 15), date(2023, 7, 15)), 180);
        assert_abs_diff_eq!(dc.year_fraction(date(2023, 1, 15), date(2024, 1, 15)), 1.0);
    }

    #[test]
    fn actual_actual_isda_spans_leap_year() {
        let dc = DayCounter::ActualActualIsda;
        let yf = dc.year_fraction(date(2023, 11, 1), date(2024, 5, 1));
        let expected = 61.0 / 365.0 + 121.0 / 366.0;
        assert_abs_diff_eq!(yf, expected, epsilon = 1e-14);
        assert_abs_diff_eq!(dc.year_fraction(date(2020, 1, 1), date(2023, 1, 1)), 3.0);
    }
}
