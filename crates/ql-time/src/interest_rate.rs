//! Interest rates with compounding and day-counting conventions.
//!
//! An `InterestRate` bundles a rate with a [`DayCounter`], a [`Compounding`]
//! rule and a [`Frequency`].  It converts between rates and compound factors
//! and between compounding conventions.

use crate::date::Date;
use crate::day_counter::DayCounter;
use crate::frequency::Frequency;
use ql_core::{ensure, errors::Result, Real, Time};

/// How interest is compounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compounding {
    /// `1 + r t`
    Simple,
    /// `(1 + r/f)^(f t)`
    Compounded,
    /// `e^(r t)`
    Continuous,
    /// Simple up to one period, compounded beyond.
    SimpleThenCompounded,
    /// Compounded up to one period, simple beyond.
    CompoundedThenSimple,
}

/// An interest rate with its conventions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterestRate {
    rate: Real,
    day_counter: DayCounter,
    compounding: Compounding,
    frequency: Frequency,
}

impl InterestRate {
    /// Create a new interest rate.
    ///
    /// # Errors
    /// Compounded conventions need a frequency with a whole number of
    /// periods per year.
    pub fn new(
        rate: Real,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Result<Self> {
        if !matches!(compounding, Compounding::Simple | Compounding::Continuous) {
            ensure!(
                frequency.periods_per_year().is_some(),
                "{compounding:?} compounding needs a periodic frequency, got {frequency}"
            );
        }
        Ok(Self {
            rate,
            day_counter,
            compounding,
            frequency,
        })
    }

    /// The rate value.
    pub fn rate(&self) -> Real {
        self.rate
    }

    /// The day counter.
    pub fn day_counter(&self) -> DayCounter {
        self.day_counter
    }

    /// The compounding convention.
    pub fn compounding(&self) -> Compounding {
        self.compounding
    }

    /// The compounding frequency.
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    fn periods(&self) -> Real {
        self.frequency.periods_per_year().unwrap_or(1) as Real
    }

    /// Growth of one unit of currency over `t` years.
    pub fn compound_factor(&self, t: Time) -> Result<Real> {
        ensure!(t >= 0.0, "negative time ({t}) not allowed");
        let r = self.rate;
        let f = self.periods();
        let factor = match self.compounding {
            Compounding::Simple => 1.0 + r * t,
            Compounding::Compounded => (1.0 + r / f).powf(f * t),
            Compounding::Continuous => (r * t).exp(),
            Compounding::SimpleThenCompounded if t <= 1.0 / f => 1.0 + r * t,
            Compounding::SimpleThenCompounded => (1.0 + r / f).powf(f * t),
            Compounding::CompoundedThenSimple if t <= 1.0 / f => (1.0 + r / f).powf(f * t),
            Compounding::CompoundedThenSimple => 1.0 + r * t,
        };
        ensure!(factor > 0.0, "non-positive compound factor {factor} for rate {r}");
        Ok(factor)
    }

    /// Compound factor between two dates, measured with the rate's day counter.
    pub fn compound_factor_between(&self, d1: Date, d2: Date) -> Result<Real> {
        self.compound_factor(self.day_counter.year_fraction(d1, d2))
    }

    /// Discount factor over `t` years.
    pub fn discount_factor(&self, t: Time) -> Result<Real> {
        Ok(1.0 / self.compound_factor(t)?)
    }

    /// The rate that grows one unit to `compound` over `t` years.
    pub fn implied_rate(
        compound: Real,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
        t: Time,
    ) -> Result<Self> {
        ensure!(compound > 0.0, "positive compound factor required, got {compound}");
        let template = Self::new(0.0, day_counter, compounding, frequency)?;
        let rate = if compound == 1.0 {
            ensure!(t >= 0.0, "non-negative time required, got {t}");
            0.0
        } else {
            ensure!(t > 0.0, "positive time required, got {t}");
            let f = template.periods();
            let simple = (compound - 1.0) / t;
            let periodic = (compound.powf(1.0 / (f * t)) - 1.0) * f;
            match compounding {
                Compounding::Simple => simple,
                Compounding::Compounded => periodic,
                Compounding::Continuous => compound.ln() / t,
                Compounding::SimpleThenCompounded if t <= 1.0 / f => simple,
                Compounding::SimpleThenCompounded => periodic,
                Compounding::CompoundedThenSimple if t <= 1.0 / f => periodic,
                Compounding::CompoundedThenSimple => simple,
            }
        };
        Ok(Self { rate, ..template })
    }

    /// The rate under other conventions with the same compound factor over `t`.
    pub fn equivalent_rate(
        &self,
        compounding: Compounding,
        frequency: Frequency,
        t: Time,
    ) -> Result<Self> {
        Self::implied_rate(
            self.compound_factor(t)?,
            self.day_counter,
            compounding,
            frequency,
            t,
        )
    }
}

impl std::fmt::Display for InterestRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.4}% {} {:?} {}",
            self.rate * 100.0,
            self.day_counter,
            self.compounding,
            self.frequency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    const DC: DayCounter = DayCounter::Actual365Fixed;

    #[test]
    fn compound_factors() {
        let simple = InterestRate::new(0.05, DC, Compounding::Simple, Frequency::Annual).unwrap();
        assert_abs_diff_eq!(simple.compound_factor(2.0).unwrap(), 1.10, epsilon = 1e-14);
        let semi =
            InterestRate::new(0.10, DC, Compounding::Compounded, Frequency::Semiannual).unwrap();
        assert_abs_diff_eq!(semi.compound_factor(1.0).unwrap(), 1.1025, epsilon = 1e-14);
        let cont =
            InterestRate::new(0.05, DC, Compounding::Continuous, Frequency::NoFrequency).unwrap();
        assert_abs_diff_eq!(cont.discount_factor(1.0).unwrap(), (-0.05f64).exp(), epsilon = 1e-14);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(InterestRate::new(0.05, DC, Compounding::Compounded, Frequency::NoFrequency).is_err());
        let r = InterestRate::new(0.05, DC, Compounding::Simple, Frequency::Annual).unwrap();
        assert!(r.compound_factor(-1.0).is_err());
        assert!(InterestRate::implied_rate(0.0, DC, Compounding::Simple, Frequency::Annual, 1.0)
            .is_err());
    }

    #[test]
    fn implied_rate_of_unit_factor_is_zero() {
        let r = InterestRate::implied_rate(1.0, DC, Compounding::Continuous, Frequency::Annual, 0.0)
            .unwrap();
        assert_eq!(r.rate(), 0.0);
    }

    proptest! {
        #[test]
        fn equivalent_rate_round_trip(rate in -0.02f64..0.2, t in 0.1f64..30.0) {
            let annual = InterestRate::new(rate, DC, Compounding::Compounded, Frequency::Annual).unwrap();
            let cont = annual.equivalent_rate(Compounding::Continuous, Frequency::NoFrequency, t).unwrap();
            let back = cont.equivalent_rate(Compounding::Compounded, Frequency::Annual, t).unwrap();
            prop_assert!((back.rate() - rate).abs() < 1e-10);
        }
    }
}
