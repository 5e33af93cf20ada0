//! `ProxyYieldTermStructure` — a yield curve standing in for whatever curve
//! a handle currently points to.
//!
//! Every query is delegated; relinking the handle invalidates dependents
//! exactly as a change in the underlying curve would.

use crate::term_structure::{Extrapolator, TermStructure};
use crate::yield_term_structure::YieldTermStructure;
use ql_core::{
    errors::Result, register_with, DiscountFactor, Handle, LazyObject, LazyState, Observable,
    ObservableImpl, Observer, Rate, Time,
};
use ql_time::Date;
use std::rc::Rc;

/// Pure delegation to the curve behind a handle.
#[derive(Debug)]
pub struct ProxyYieldTermStructure {
    lazy: LazyState,
    extrapolator: Extrapolator,
    original: Handle<dyn YieldTermStructure>,
}

impl ProxyYieldTermStructure {
    /// Proxy for the curve behind `original`.
    pub fn new(original: Handle<dyn YieldTermStructure>) -> Rc<Self> {
        let proxy = Rc::new(Self {
            lazy: LazyState::new(),
            extrapolator: Extrapolator::new(),
            original,
        });
        register_with(&proxy, &proxy.original);
        proxy
    }

    /// The wrapped handle.
    pub fn original(&self) -> &Handle<dyn YieldTermStructure> {
        &self.original
    }
}

impl Observable for ProxyYieldTermStructure {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for ProxyYieldTermStructure {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for ProxyYieldTermStructure {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        Ok(())
    }
}

impl TermStructure for ProxyYieldTermStructure {
    crate::delegate_to_handle!(original);

    fn max_date(&self) -> Result<Date> {
        self.original.current()?.max_date()
    }

    fn extrapolator(&self) -> &Extrapolator {
        &self.extrapolator
    }
}

impl YieldTermStructure for ProxyYieldTermStructure {
    fn discount_impl(&self, t: Time) -> Result<DiscountFactor> {
        self.calculate()?;
        self.original.current()?.discount(t, true)
    }

    fn zero_yield_impl(&self, t: Time) -> Result<Rate> {
        self.calculate()?;
        self.original.current()?.zero_yield_impl(t)
    }

    fn forward_impl(&self, t: Time) -> Result<Rate> {
        self.calculate()?;
        self.original.current()?.instantaneous_forward(t, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flat_forward::FlatForward;
    use approx::assert_abs_diff_eq;
    use ql_core::{Error, RelinkableHandle};
    use ql_time::DayCounter;
    use std::cell::Cell;

    fn today() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    #[derive(Default)]
    struct Counter(Cell<u32>);

    impl Observer for Counter {
        fn update(&self) -> Result<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn delegates_everything() {
        let flat: Rc<dyn YieldTermStructure> =
            FlatForward::with_rate(today(), 0.025, DayCounter::Actual360);
        let proxy = ProxyYieldTermStructure::new(Handle::new(flat));
        assert_eq!(proxy.reference_date().unwrap(), today());
        assert_eq!(proxy.day_counter().unwrap(), DayCounter::Actual360);
        assert_eq!(proxy.max_date().unwrap(), Date::MAX);
        assert_abs_diff_eq!(proxy.discount(4.0, false).unwrap(), (-0.1f64).exp(), epsilon = 1e-15);
        assert_abs_diff_eq!(proxy.instantaneous_forward(1.0, false).unwrap(), 0.025, epsilon = 1e-9);
    }

    #[test]
    fn relink_notifies_once_and_switches() {
        let target = RelinkableHandle::<dyn YieldTermStructure>::empty();
        let proxy = ProxyYieldTermStructure::new(target.handle());
        let counter = Rc::new(Counter::default());
        register_with(&counter, proxy.as_ref());
        assert!(matches!(proxy.day_counter(), Err(Error::NotSet(_))));

        target
            .link_to(FlatForward::with_rate(today(), 0.02, DayCounter::Actual365Fixed))
            .unwrap();
        assert_abs_diff_eq!(proxy.discount(1.0, false).unwrap(), (-0.02f64).exp(), epsilon = 1e-15);
        target
            .link_to(FlatForward::with_rate(today(), 0.04, DayCounter::Actual365Fixed))
            .unwrap();
        assert_eq!(counter.0.get(), 1);
        assert_abs_diff_eq!(proxy.discount(1.0, false).unwrap(), (-0.04f64).exp(), epsilon = 1e-15);
    }
}
