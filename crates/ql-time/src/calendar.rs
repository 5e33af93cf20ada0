//! Business-day calendars.
//!
//! Only the two holiday-free calendars are provided; the set is closed and
//! `Copy` so that term structures can carry one by value.

use crate::business_day_convention::BusinessDayConvention;
use crate::date::Date;
use crate::period::Period;
use crate::time_unit::TimeUnit;
use ql_core::errors::Result;

/// A financial calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Calendar {
    /// Every day is a business day.
    #[default]
    NullCalendar,
    /// Saturdays and Sundays are holidays; no other holidays.
    WeekendsOnly,
}

impl Calendar {
    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Calendar::NullCalendar => "Null",
            Calendar::WeekendsOnly => "Weekends only",
        }
    }

    /// Return `true` if `date` is a business day.
    pub fn is_business_day(self, date: Date) -> bool {
        match self {
            Calendar::NullCalendar => true,
            Calendar::WeekendsOnly => !date.is_weekend(),
        }
    }

    /// Return `true` if `date` is not a business day.
    pub fn is_holiday(self, date: Date) -> bool {
        !self.is_business_day(date)
    }

    /// Return `true` if `date` is the last business day of its month.
    pub fn is_end_of_month(self, date: Date) -> bool {
        date.month() != self.adjust(date + 1, BusinessDayConvention::Following).month()
    }

    /// Last business day of the month containing `date`.
    pub fn end_of_month(self, date: Date) -> Date {
        self.adjust(date.end_of_month(), BusinessDayConvention::Preceding)
    }

    /// Roll `date` to a business day according to `convention`.
    pub fn adjust(self, date: Date, convention: BusinessDayConvention) -> Date {
        let mut d = date;
        match convention {
            BusinessDayConvention::Unadjusted => date,
            BusinessDayConvention::Following => {
                while self.is_holiday(d) {
                    d = d + 1;
                }
                d
            }
            BusinessDayConvention::Preceding => {
                while self.is_holiday(d) {
                    d = d - 1;
                }
                d
            }
            BusinessDayConvention::ModifiedFollowing => {
                let adjusted = self.adjust(date, BusinessDayConvention::Following);
                if adjusted.month() != date.month() {
                    self.adjust(date, BusinessDayConvention::Preceding)
                } else {
                    adjusted
                }
            }
            BusinessDayConvention::ModifiedPreceding => {
                let adjusted = self.adjust(date, BusinessDayConvention::Preceding);
                if adjusted.month() != date.month() {
                    self.adjust(date, BusinessDayConvention::Following)
                } else {
                    adjusted
                }
            }
        }
    }

    /// Advance `date` by `n` business days (backwards if `n < 0`).
    pub fn advance_business_days(self, date: Date, n: i32) -> Date {
        let step = if n >= 0 { 1 } else { -1 };
        let mut d = date;
        let mut remaining = n.abs();
        while remaining > 0 {
            d = d + step;
            if self.is_business_day(d) {
                remaining -= 1;
            }
        }
        d
    }

    /// Advance `date` by `period` and roll the result.
    ///
    /// Day periods count business days.  With `end_of_month`, a start date
    /// on the last business day of its month lands on the last business day
    /// of the target month.
    pub fn advance(
        self,
        date: Date,
        period: Period,
        convention: BusinessDayConvention,
        end_of_month: bool,
    ) -> Result<Date> {
        if period.length == 0 {
            return Ok(self.adjust(date, convention));
        }
        match period.unit {
            TimeUnit::Days => Ok(self.advance_business_days(date, period.length)),
            TimeUnit::Weeks => {
                let d = date.advance(period.length, TimeUnit::Weeks)?;
                Ok(self.adjust(d, convention))
            }
            TimeUnit::Months | TimeUnit::Years => {
                let d = date.advance(period.length, period.unit)?;
                if end_of_month && self.is_end_of_month(date) {
                    Ok(self.end_of_month(d))
                } else {
                    Ok(self.adjust(d, convention))
                }
            }
        }
    }

    /// Business days in `(d1, d2]`; negative if `d2 < d1`.
    pub fn business_days_between(self, d1: Date, d2: Date) -> i32 {
        let (start, end, sign) = if d2 >= d1 { (d1, d2, 1) } else { (d2, d1, -1) };
        let mut count = 0;
        let mut d = start + 1;
        while d <= end {
            if self.is_business_day(d) {
                count += 1;
            }
            d = d + 1;
        }
        sign * count
    }
}

impl std::fmt::Display for Calendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn null_calendar_always_business() {
        assert!(Calendar::NullCalendar.is_business_day(date(2023, 12, 25)));
        assert!(Calendar::NullCalendar.is_business_day(date(2023, 9, 2)));
    }

    #[test]
    fn weekend_adjustment() {
        let cal = Calendar::WeekendsOnly;
        // 2023-09-02 is a Saturday
        let sat = date(2023, 9, 2);
        assert!(cal.is_holiday(sat));
        assert_eq!(cal.adjust(sat, BusinessDayConvention::Following), date(2023, 9, 4));
        assert_eq!(cal.adjust(sat, BusinessDayConvention::Preceding), date(2023, 9, 1));
        // 2023-09-30 is a Saturday; following would cross into October
        assert_eq!(
            cal.adjust(date(2023, 9, 30), BusinessDayConvention::ModifiedFollowing),
            date(2023, 9, 29)
        );
    }

    #[test]
    fn advance_by_business_days_and_months() {
        let cal = Calendar::WeekendsOnly;
        let fri = date(2023, 9, 1);
        assert_eq!(cal.advance_business_days(fri, 2), date(2023, 9, 5));
        let d = cal
            .advance(fri, Period::new(2, TimeUnit::Days), BusinessDayConvention::Following, false)
            .unwrap();
        assert_eq!(d, date(2023, 9, 5));
        // 2023-06-30 (Fri) is the last business day of June
        let eom = cal
            .advance(
                date(2023, 6, 30),
                Period::new(3, TimeUnit::Months),
                BusinessDayConvention::ModifiedFollowing,
                true,
            )
            .unwrap();
        assert_eq!(eom, date(2023, 9, 29));
    }

    #[test]
    fn business_days_between() {
        let cal = Calendar::WeekendsOnly;
        assert_eq!(cal.business_days_between(date(2023, 9, 4), date(2023, 9, 8)), 4);
        assert_eq!(cal.business_days_between(date(2023, 9, 8), date(2023, 9, 4)), -4);
    }
}
