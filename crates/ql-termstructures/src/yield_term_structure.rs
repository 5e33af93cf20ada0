//! `YieldTermStructure` — interest-rate term structures.
//!
//! Three quantities describe a yield curve:
//!
//! * **discount factor** `P(0,t)`;
//! * **zero yield**, the continuously-compounded rate `-ln P(0,t) / t`;
//! * **instantaneous forward**, `-d ln P(0,t) / dt`.
//!
//! Implementors override one of the `*_impl` hooks (usually
//! [`discount_impl`](YieldTermStructure::discount_impl) or
//! [`zero_yield_impl`](YieldTermStructure::zero_yield_impl)); the others
//! follow from it.  Public queries check the domain first and then call the
//! hooks, so the hooks never see out-of-range times unless extrapolation was
//! requested.

use crate::term_structure::TermStructure;
use ql_core::{errors::Result, DiscountFactor, Rate, Real, Time};
use ql_time::{Compounding, Date, DayCounter, Frequency, InterestRate};

/// Time step used for instantaneous rates.
pub const DT: Real = 1.0e-4;

/// An interest-rate term structure.
///
/// The default hooks are defined in terms of each other: an implementor
/// that overrides neither `discount_impl` nor `zero_yield_impl` recurses
/// without end.
pub trait YieldTermStructure: TermStructure {
    /// Discount factor at `t`; defaults to `exp(-z(t) t)`.
    fn discount_impl(&self, t: Time) -> Result<DiscountFactor> {
        if t == 0.0 {
            return Ok(1.0);
        }
        Ok((-self.zero_yield_impl(t)? * t).exp())
    }

    /// Continuously-compounded zero yield at `t`; defaults to
    /// `-ln P(t) / t`, taken over `DT` at `t = 0`.
    fn zero_yield_impl(&self, t: Time) -> Result<Rate> {
        let t = if t == 0.0 { DT } else { t };
        Ok(-self.discount_impl(t)?.ln() / t)
    }

    /// Instantaneous forward at `t`; defaults to a centred difference of
    /// `ln P` over `DT`.
    fn forward_impl(&self, t: Time) -> Result<Rate> {
        let t1 = (t - DT / 2.0).max(0.0);
        let t2 = t1 + DT;
        Ok((self.discount_impl(t1)?.ln() - self.discount_impl(t2)?.ln()) / DT)
    }

    // ── Public queries ───────────────────────────────────────────────────

    /// Discount factor at time `t`.
    fn discount(&self, t: Time, extrapolate: bool) -> Result<DiscountFactor> {
        self.check_range(t, extrapolate)?;
        self.discount_impl(t)
    }

    /// Discount factor at `date`.
    fn discount_date(&self, date: Date, extrapolate: bool) -> Result<DiscountFactor> {
        self.check_range_date(date, extrapolate)?;
        self.discount_impl(self.time_from_reference(date)?)
    }

    /// Zero rate at `t` under the given conventions.
    fn zero_rate(
        &self,
        t: Time,
        compounding: Compounding,
        frequency: Frequency,
        extrapolate: bool,
    ) -> Result<InterestRate> {
        self.check_range(t, extrapolate)?;
        let day_counter = self.day_counter()?;
        if t == 0.0 {
            let compound = 1.0 / self.discount_impl(DT)?;
            return InterestRate::implied_rate(compound, day_counter, compounding, frequency, DT);
        }
        let compound = 1.0 / self.discount_impl(t)?;
        InterestRate::implied_rate(compound, day_counter, compounding, frequency, t)
    }

    /// Zero rate between the reference date and `date`, measured with
    /// `day_counter`.
    fn zero_rate_date(
        &self,
        date: Date,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
        extrapolate: bool,
    ) -> Result<InterestRate> {
        self.check_range_date(date, extrapolate)?;
        let reference = self.reference_date()?;
        if date == reference {
            let compound = 1.0 / self.discount_impl(DT)?;
            return InterestRate::implied_rate(compound, day_counter, compounding, frequency, DT);
        }
        let compound = 1.0 / self.discount_impl(self.time_from_reference(date)?)?;
        let t = day_counter.year_fraction(reference, date);
        InterestRate::implied_rate(compound, day_counter, compounding, frequency, t)
    }

    /// Forward rate between `t1` and `t2`; instantaneous when they coincide.
    fn forward_rate(
        &self,
        t1: Time,
        t2: Time,
        compounding: Compounding,
        frequency: Frequency,
        extrapolate: bool,
    ) -> Result<InterestRate> {
        let day_counter = self.day_counter()?;
        let (t1, t2) = if t1 == t2 {
            let t1 = (t1 - DT / 2.0).max(0.0);
            (t1, t1 + DT)
        } else {
            ql_core::ensure!(t2 > t1, "t2 ({t2}) < t1 ({t1})");
            (t1, t2)
        };
        self.check_range(t2, extrapolate)?;
        self.check_range(t1, extrapolate)?;
        let compound = self.discount_impl(t1)? / self.discount_impl(t2)?;
        InterestRate::implied_rate(compound, day_counter, compounding, frequency, t2 - t1)
    }

    /// Forward rate between two dates, measured with `day_counter`.
    #[allow(clippy::too_many_arguments)]
    fn forward_rate_dates(
        &self,
        d1: Date,
        d2: Date,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
        extrapolate: bool,
    ) -> Result<InterestRate> {
        if d1 == d2 {
            self.check_range_date(d1, extrapolate)?;
            let t = self.time_from_reference(d1)?;
            let t1 = (t - DT / 2.0).max(0.0);
            let compound = self.discount_impl(t1)? / self.discount_impl(t1 + DT)?;
            return InterestRate::implied_rate(compound, day_counter, compounding, frequency, DT);
        }
        ql_core::ensure!(d1 < d2, "{d1} later than {d2}");
        self.check_range_date(d2, extrapolate)?;
        self.check_range_date(d1, extrapolate)?;
        let compound = self.discount_impl(self.time_from_reference(d1)?)?
            / self.discount_impl(self.time_from_reference(d2)?)?;
        InterestRate::implied_rate(
            compound,
            day_counter,
            compounding,
            frequency,
            day_counter.year_fraction(d1, d2),
        )
    }

    /// Instantaneous continuously-compounded forward at `t`.
    fn instantaneous_forward(&self, t: Time, extrapolate: bool) -> Result<Rate> {
        self.check_range(t, extrapolate)?;
        self.forward_impl(t)
    }
}
