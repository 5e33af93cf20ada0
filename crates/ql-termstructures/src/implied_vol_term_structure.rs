//! `ImpliedVolTermStructure` — a Black volatility surface seen from a later
//! reference date.
//!
//! Variance to horizon `t` is the original's forward variance between the
//! new reference date and `t` years after it.  The time shift is recomputed
//! on each query.

use crate::black_vol_term_structure::BlackVolTermStructure;
use crate::term_structure::{Extrapolator, TermStructure};
use crate::volatility_term_structure::VolatilityTermStructure;
use ql_core::{
    errors::Result, register_with, Handle, LazyObject, LazyState, Natural, Observable,
    ObservableImpl, Observer, Real, Time,
};
use ql_time::{BusinessDayConvention, Calendar, Date, DayCounter};
use std::rc::Rc;

/// Black volatility implied at a future reference date.
#[derive(Debug)]
pub struct ImpliedVolTermStructure {
    lazy: LazyState,
    extrapolator: Extrapolator,
    original: Handle<dyn BlackVolTermStructure>,
    reference_date: Date,
}

impl ImpliedVolTermStructure {
    /// The surface implied by `original` at `reference_date`.
    pub fn new(original: Handle<dyn BlackVolTermStructure>, reference_date: Date) -> Rc<Self> {
        let surface = Rc::new(Self {
            lazy: LazyState::new(),
            extrapolator: Extrapolator::new(),
            original,
            reference_date,
        });
        register_with(&surface, &surface.original);
        surface
    }

    fn time_shift(&self, original: &dyn BlackVolTermStructure) -> Result<Time> {
        original.time_from_reference(self.reference_date)
    }
}

impl Observable for ImpliedVolTermStructure {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for ImpliedVolTermStructure {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for ImpliedVolTermStructure {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        Ok(())
    }
}

impl TermStructure for ImpliedVolTermStructure {
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

impl VolatilityTermStructure for ImpliedVolTermStructure {
    fn business_day_convention(&self) -> Result<BusinessDayConvention> {
        self.original.current()?.business_day_convention()
    }

    fn min_strike(&self) -> Result<Real> {
        self.original.current()?.min_strike()
    }

    fn max_strike(&self) -> Result<Real> {
        self.original.current()?.max_strike()
    }
}

impl BlackVolTermStructure for ImpliedVolTermStructure {
    fn black_variance_impl(&self, t: Time, strike: Real) -> Result<Real> {
        self.calculate()?;
        let original = self.original.current()?;
        let shift = self.time_shift(original.as_ref())?;
        original.black_forward_variance(shift, shift + t, strike, true)
    }
}
