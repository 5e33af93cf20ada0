//! `ImpliedTermStructure` — the forward curve implied by another curve as
//! seen from a later reference date.
//!
//! Discount factors are ratios of the original's: `P'(t) = P(t0 + t) /
//! P(t0)`, with `t0` the original's time to the new reference date.  `t0`
//! is recomputed on each query since the original's reference date may
//! float.

use crate::term_structure::{Extrapolator, TermStructure};
use crate::yield_term_structure::YieldTermStructure;
use ql_core::{
    errors::Result, register_with, DiscountFactor, Handle, LazyObject, LazyState, Natural,
    Observable, ObservableImpl, Observer, Time,
};
use ql_time::{Calendar, Date, DayCounter};
use std::rc::Rc;

/// Yield curve implied at a future reference date.
#[derive(Debug)]
pub struct ImpliedTermStructure {
    lazy: LazyState,
    extrapolator: Extrapolator,
    original: Handle<dyn YieldTermStructure>,
    reference_date: Date,
}

impl ImpliedTermStructure {
    /// The curve implied by `original` at `reference_date`.
    pub fn new(original: Handle<dyn YieldTermStructure>, reference_date: Date) -> Rc<Self> {
        let curve = Rc::new(Self {
            lazy: LazyState::new(),
            extrapolator: Extrapolator::new(),
            original,
            reference_date,
        });
        register_with(&curve, &curve.original);
        curve
    }
}

impl Observable for ImpliedTermStructure {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for ImpliedTermStructure {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for ImpliedTermStructure {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        Ok(())
    }
}

impl TermStructure for ImpliedTermStructure {
    fn reference_date(&self) -> Result<Date> {
        Ok(self.reference_date)
    }

    fn day_counter(&self) -> Result<DayCounter> {
        self.original.current()?.day_counter()
    }

    fn calendar(&self) -> Result<Calendar> {
        self.original.current()?.calendar()
    }

    fn settlement_days(&self) -> Result<Natural> {
        self.original.current()?.settlement_days()
    }

    fn max_date(&self) -> Result<Date> {
        self.original.current()?.max_date()
    }

    fn extrapolator(&self) -> &Extrapolator {
        &self.extrapolator
    }
}

impl YieldTermStructure for ImpliedTermStructure {
    fn discount_impl(&self, t: Time) -> Result<DiscountFactor> {
        self.calculate()?;
        let original = self.original.current()?;
        let t0 = original.time_from_reference(self.reference_date)?;
        Ok(original.discount(t0 + t, true)? / original.discount(t0, true)?)
    }
}
