//! `FlatForward` — a yield curve with a single forward rate read from a
//! quote.
//!
//! The quote is read lazily: setting it marks the curve stale, and the
//! rate is rebuilt the next time a discount factor is asked for.

use crate::term_structure::{TermStructure, TermStructureCore};
use crate::yield_term_structure::YieldTermStructure;
use ql_core::{
    errors::{Error, Result},
    register_with, DiscountFactor, Handle, LazyObject, LazyState, Natural, Observable,
    ObservableImpl, Observer, Rate, Time,
};
use ql_quotes::{quote_handle, Quote, QuoteHandleExt, SimpleQuote};
use ql_time::{Calendar, Compounding, Date, DayCounter, Frequency, InterestRate, Settings};
use std::cell::Cell;
use std::rc::Rc;

/// Flat-forward yield curve.
#[derive(Debug)]
pub struct FlatForward {
    core: TermStructureCore,
    lazy: LazyState,
    forward: Handle<dyn Quote>,
    compounding: Compounding,
    frequency: Frequency,
    rate: Cell<Option<InterestRate>>,
}

impl FlatForward {
    /// Flat curve from a fixed reference date.
    pub fn new(
        reference_date: Date,
        forward: Handle<dyn Quote>,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Rc<Self> {
        Self::build(
            TermStructureCore::fixed(reference_date, Calendar::NullCalendar, day_counter),
            forward,
            compounding,
            frequency,
        )
    }

    /// Flat continuously-compounded curve at a constant rate.
    pub fn with_rate(reference_date: Date, rate: Rate, day_counter: DayCounter) -> Rc<Self> {
        let quote = Rc::new(SimpleQuote::new(rate));
        Self::new(
            reference_date,
            quote_handle(&quote),
            day_counter,
            Compounding::Continuous,
            Frequency::Annual,
        )
    }

    /// Flat curve whose reference date follows the evaluation date.
    pub fn floating(
        settings: Rc<Settings>,
        settlement_days: Natural,
        calendar: Calendar,
        forward: Handle<dyn Quote>,
        day_counter: DayCounter,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Rc<Self> {
        Self::build(
            TermStructureCore::floating(settings, settlement_days, calendar, day_counter),
            forward,
            compounding,
            frequency,
        )
    }

    fn build(
        core: TermStructureCore,
        forward: Handle<dyn Quote>,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Rc<Self> {
        let curve = Rc::new(Self {
            core,
            lazy: LazyState::new(),
            forward,
            compounding,
            frequency,
            rate: Cell::new(None),
        });
        register_with(&curve, &curve.forward);
        curve.core.observe_settings(&curve);
        curve
    }

    /// The flat rate under the curve's own conventions.
    pub fn rate(&self) -> Result<InterestRate> {
        self.calculate()?;
        self.rate
            .get()
            .ok_or_else(|| Error::NotSet("flat forward rate".into()))
    }
}

impl Observable for FlatForward {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for FlatForward {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for FlatForward {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        let rate = InterestRate::new(
            self.forward.value()?,
            self.core.day_counter(),
            self.compounding,
            self.frequency,
        )?;
        self.rate.set(Some(rate));
        Ok(())
    }
}

impl TermStructure for FlatForward {
    crate::delegate_to_core!(core);

    fn max_date(&self) -> Result<Date> {
        Ok(Date::MAX)
    }
}

impl YieldTermStructure for FlatForward {
    fn discount_impl(&self, t: Time) -> Result<DiscountFactor> {
        self.rate()?.discount_factor(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_core::Freshness;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn continuous_discount_and_zero() {
        let curve = FlatForward::with_rate(date(2025, 1, 2), 0.05, DayCounter::Actual365Fixed);
        assert_eq!(curve.discount(0.0, false).unwrap(), 1.0);
        assert_abs_diff_eq!(curve.discount(1.0, false).unwrap(), (-0.05f64).exp(), epsilon = 1e-15);
        assert_abs_diff_eq!(curve.discount(10.0, false).unwrap(), (-0.5f64).exp(), epsilon = 1e-14);
        let zero = curve
            .zero_rate(3.0, Compounding::Continuous, Frequency::NoFrequency, false)
            .unwrap();
        assert_abs_diff_eq!(zero.rate(), 0.05, epsilon = 1e-14);
        assert_abs_diff_eq!(curve.instantaneous_forward(2.0, false).unwrap(), 0.05, epsilon = 1e-9);
    }

    #[test]
    fn annual_compounding() {
        let quote = Rc::new(SimpleQuote::new(0.05));
        let curve = FlatForward::new(
            date(2025, 1, 2),
            quote_handle(&quote),
            DayCounter::Actual365Fixed,
            Compounding::Compounded,
            Frequency::Annual,
        );
        let zero = curve
            .zero_rate(2.0, Compounding::Continuous, Frequency::NoFrequency, false)
            .unwrap();
        assert_abs_diff_eq!(zero.rate(), 1.05f64.ln(), epsilon = 1e-14);
    }

    #[test]
    fn quote_moves_are_picked_up_lazily() {
        let quote = Rc::new(SimpleQuote::new(0.03));
        let curve = FlatForward::new(
            date(2025, 1, 2),
            quote_handle(&quote),
            DayCounter::Actual365Fixed,
            Compounding::Continuous,
            Frequency::Annual,
        );
        assert_eq!(curve.freshness(), Freshness::NeverCalculated);
        assert_abs_diff_eq!(curve.discount(1.0, false).unwrap(), (-0.03f64).exp(), epsilon = 1e-15);
        quote.set_value(0.04).unwrap();
        assert_eq!(curve.freshness(), Freshness::Stale);
        assert_abs_diff_eq!(curve.discount(1.0, false).unwrap(), (-0.04f64).exp(), epsilon = 1e-15);
    }

    #[test]
    fn invalid_quote_fails_and_recovers() {
        let quote = Rc::new(SimpleQuote::empty());
        let curve = FlatForward::new(
            date(2025, 1, 2),
            quote_handle(&quote),
            DayCounter::Actual365Fixed,
            Compounding::Continuous,
            Frequency::Annual,
        );
        assert!(matches!(curve.discount(1.0, false), Err(Error::NotSet(_))));
        assert_eq!(curve.freshness(), Freshness::NeverCalculated);
        quote.set_value(0.02).unwrap();
        assert_abs_diff_eq!(curve.discount(1.0, false).unwrap(), (-0.02f64).exp(), epsilon = 1e-15);
    }

    #[test]
    fn floating_curve_moves_with_evaluation_date() {
        let settings = Rc::new(Settings::with_evaluation_date(date(2024, 1, 15)));
        let quote = Rc::new(SimpleQuote::new(0.03));
        let curve = FlatForward::floating(
            Rc::clone(&settings),
            0,
            Calendar::NullCalendar,
            quote_handle(&quote),
            DayCounter::Actual365Fixed,
            Compounding::Continuous,
            Frequency::Annual,
        );
        let pay = date(2025, 1, 14);
        assert_abs_diff_eq!(
            curve.discount_date(pay, false).unwrap(),
            (-0.03f64).exp(),
            epsilon = 1e-15
        );
        settings.set_evaluation_date(date(2024, 7, 15)).unwrap();
        assert_eq!(curve.freshness(), Freshness::Stale);
        let t = 183.0 / 365.0;
        assert_abs_diff_eq!(
            curve.discount_date(pay, false).unwrap(),
            (-0.03_f64 * t).exp(),
            epsilon = 1e-15
        );
    }
}
