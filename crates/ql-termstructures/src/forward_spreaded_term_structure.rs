//! `ForwardSpreadedTermStructure` — another curve with a spread added to its
//! instantaneous forwards.
//!
//! Adding `s` to every instantaneous forward adds `s` to every continuously
//! compounded zero yield, so both hooks are overridden directly.

use crate::term_structure::{Extrapolator, TermStructure};
use crate::yield_term_structure::YieldTermStructure;
use ql_core::{
    errors::Result, register_with, Handle, LazyObject, LazyState, Observable, ObservableImpl,
    Observer, Rate, Time,
};
use ql_quotes::{Quote, QuoteHandleExt};
use ql_time::{Compounding, Date, Frequency};
use std::rc::Rc;

/// Forward-spreaded yield curve.
#[derive(Debug)]
pub struct ForwardSpreadedTermStructure {
    lazy: LazyState,
    extrapolator: Extrapolator,
    original: Handle<dyn YieldTermStructure>,
    spread: Handle<dyn Quote>,
}

impl ForwardSpreadedTermStructure {
    /// Spread `original` by `spread`.
    pub fn new(original: Handle<dyn YieldTermStructure>, spread: Handle<dyn Quote>) -> Rc<Self> {
        let curve = Rc::new(Self {
            lazy: LazyState::new(),
            extrapolator: Extrapolator::new(),
            original,
            spread,
        });
        register_with(&curve, &curve.original);
        register_with(&curve, &curve.spread);
        curve
    }
}

impl Observable for ForwardSpreadedTermStructure {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for ForwardSpreadedTermStructure {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for ForwardSpreadedTermStructure {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        Ok(())
    }
}

impl TermStructure for ForwardSpreadedTermStructure {
    crate::delegate_to_handle!(original);

    fn max_date(&self) -> Result<Date> {
        self.original.current()?.max_date()
    }

    fn extrapolator(&self) -> &Extrapolator {
        &self.extrapolator
    }
}

impl YieldTermStructure for ForwardSpreadedTermStructure {
    fn zero_yield_impl(&self, t: Time) -> Result<Rate> {
        self.calculate()?;
        let zero = self
            .original
            .current()?
            .zero_rate(t, Compounding::Continuous, Frequency::NoFrequency, true)?;
        Ok(zero.rate() + self.spread.value()?)
    }

    fn forward_impl(&self, t: Time) -> Result<Rate> {
        self.calculate()?;
        let forward = self.original.current()?.forward_rate(
            t,
            t,
            Compounding::Continuous,
            Frequency::NoFrequency,
            true,
        )?;
        Ok(forward.rate() + self.spread.value()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat_forward::FlatForward;
    use approx::assert_abs_diff_eq;
    use ql_core::{Error, Freshness, RelinkableHandle};
    use ql_quotes::{quote_handle, SimpleQuote};
    use ql_time::DayCounter;

    fn reference() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    #[test]
    fn forwards_shift_by_spread() {
        let flat: Rc<dyn YieldTermStructure> =
            FlatForward::with_rate(reference(), 0.03, DayCounter::Actual365Fixed);
        let spread = Rc::new(SimpleQuote::new(0.01));
        let curve = ForwardSpreadedTermStructure::new(Handle::new(flat), quote_handle(&spread));
        assert_abs_diff_eq!(curve.instantaneous_forward(2.0, false).unwrap(), 0.04, epsilon = 1e-9);
        assert_abs_diff_eq!(
            curve.discount(2.0, false).unwrap(),
            (-0.08f64).exp(),
            epsilon = 1e-14
        );
        assert_eq!(curve.reference_date().unwrap(), reference());
        assert_eq!(curve.day_counter().unwrap(), DayCounter::Actual365Fixed);
    }

    #[test]
    fn spread_change_invalidates() {
        let flat: Rc<dyn YieldTermStructure> =
            FlatForward::with_rate(reference(), 0.03, DayCounter::Actual365Fixed);
        let spread = Rc::new(SimpleQuote::new(0.01));
        let curve = ForwardSpreadedTermStructure::new(Handle::new(flat), quote_handle(&spread));
        curve.discount(1.0, false).unwrap();
        spread.set_value(0.02).unwrap();
        assert_eq!(curve.freshness(), Freshness::Stale);
        let zero = curve
            .zero_rate(1.0, Compounding::Continuous, Frequency::NoFrequency, false)
            .unwrap();
        assert_abs_diff_eq!(zero.rate(), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn empty_original_is_not_set() {
        let original = RelinkableHandle::<dyn YieldTermStructure>::empty();
        let spread = Rc::new(SimpleQuote::new(0.01));
        let curve = ForwardSpreadedTermStructure::new(original.handle(), quote_handle(&spread));
        assert!(matches!(curve.reference_date(), Err(Error::NotSet(_))));
        assert!(matches!(curve.discount(1.0, true), Err(Error::NotSet(_))));
        let flat: Rc<dyn YieldTermStructure> =
            FlatForward::with_rate(reference(), 0.03, DayCounter::Actual365Fixed);
        original.link_to(flat).unwrap();
        assert_abs_diff_eq!(curve.discount(1.0, false).unwrap(), (-0.04f64).exp(), epsilon = 1e-14);
    }
}
