//! `ZeroSpreadedTermStructure` — another curve with a spread added to its
//! zero yields.
//!
//! The spread is added to the original zero rate under the given
//! compounding convention, and the sum converted back to a continuously
//! compounded yield.  With continuous compounding this is plain addition.

use crate::term_structure::{Extrapolator, TermStructure};
use crate::yield_term_structure::{YieldTermStructure, DT};
use ql_core::{
    errors::Result, register_with, Handle, LazyObject, LazyState, Observable, ObservableImpl,
    Observer, Rate, Spread, Time,
};
use ql_quotes::{Quote, QuoteHandleExt};
use ql_time::{Compounding, Date, Frequency, InterestRate};
use std::rc::Rc;

/// Add `spread` to the zero rate of `original` at `t`, under the given
/// conventions, returning the continuously compounded equivalent.
pub(crate) fn spreaded_zero_yield(
    original: &dyn YieldTermStructure,
    t: Time,
    spread: Spread,
    compounding: Compounding,
    frequency: Frequency,
) -> Result<Rate> {
    let t = if t == 0.0 { DT } else { t };
    let zero = original.zero_rate(t, compounding, frequency, true)?;
    let spreaded = InterestRate::new(
        zero.rate() + spread,
        zero.day_counter(),
        zero.compounding(),
        zero.frequency(),
    )?;
    Ok(spreaded
        .equivalent_rate(Compounding::Continuous, Frequency::NoFrequency, t)?
        .rate())
}

/// Zero-spreaded yield curve.
#[derive(Debug)]
pub struct ZeroSpreadedTermStructure {
    lazy: LazyState,
    extrapolator: Extrapolator,
    original: Handle<dyn YieldTermStructure>,
    spread: Handle<dyn Quote>,
    compounding: Compounding,
    frequency: Frequency,
}

impl ZeroSpreadedTermStructure {
    /// Spread the continuously compounded zero yields of `original`.
    pub fn new(original: Handle<dyn YieldTermStructure>, spread: Handle<dyn Quote>) -> Rc<Self> {
        Self::with_compounding(
            original,
            spread,
            Compounding::Continuous,
            Frequency::NoFrequency,
        )
    }

    /// Spread the zero rates of `original` expressed under `compounding`.
    pub fn with_compounding(
        original: Handle<dyn YieldTermStructure>,
        spread: Handle<dyn Quote>,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Rc<Self> {
        let curve = Rc::new(Self {
            lazy: LazyState::new(),
            extrapolator: Extrapolator::new(),
            original,
            spread,
            compounding,
            frequency,
        });
        register_with(&curve, &curve.original);
        register_with(&curve, &curve.spread);
        curve
    }
}

impl Observable for ZeroSpreadedTermStructure {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for ZeroSpreadedTermStructure {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for ZeroSpreadedTermStructure {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        Ok(())
    }
}

impl TermStructure for ZeroSpreadedTermStructure {
    crate::delegate_to_handle!(original);

    fn max_date(&self) -> Result<Date> {
        self.original.current()?.max_date()
    }

    fn extrapolator(&self) -> &Extrapolator {
        &self.extrapolator
    }
}

impl YieldTermStructure for ZeroSpreadedTermStructure {
    fn zero_yield_impl(&self, t: Time) -> Result<Rate> {
        self.calculate()?;
        spreaded_zero_yield(
            self.original.current()?.as_ref(),
            t,
            self.spread.value()?,
            self.compounding,
            self.frequency,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat_forward::FlatForward;
    use approx::assert_abs_diff_eq;
    use ql_quotes::{quote_handle, SimpleQuote};
    use ql_time::DayCounter;

    fn flat(rate: Rate) -> Handle<dyn YieldTermStructure> {
        let curve: Rc<dyn YieldTermStructure> = FlatForward::with_rate(
            Date::from_ymd(2024, 1, 15).unwrap(),
            rate,
            DayCounter::Actual365Fixed,
        );
        Handle::new(curve)
    }

    #[test]
    fn continuous_spread_adds() {
        let spread = Rc::new(SimpleQuote::new(0.005));
        let curve = ZeroSpreadedTermStructure::new(flat(0.03), quote_handle(&spread));
        for t in [0.25, 1.0, 7.5] {
            let zero = curve
                .zero_rate(t, Compounding::Continuous, Frequency::NoFrequency, false)
                .unwrap();
            assert_abs_diff_eq!(zero.rate(), 0.035, epsilon = 1e-12);
        }
    }

    #[test]
    fn annual_spread_goes_through_equivalent_rate() {
        let spread = Rc::new(SimpleQuote::new(0.01));
        let curve = ZeroSpreadedTermStructure::with_compounding(
            flat(0.03),
            quote_handle(&spread),
            Compounding::Compounded,
            Frequency::Annual,
        );
        let annual = 0.03f64.exp() - 1.0;
        let expected = (1.0 + annual + 0.01).ln();
        let zero = curve
            .zero_rate(2.0, Compounding::Continuous, Frequency::NoFrequency, false)
            .unwrap();
        assert_abs_diff_eq!(zero.rate(), expected, epsilon = 1e-12);
        // not the naive sum
        assert!((zero.rate() - 0.04).abs() > 1e-4);
    }
}
