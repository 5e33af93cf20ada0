//! `BlackVolTermStructure` — Black volatility over time and strike, and the
//! flat `BlackConstantVol` surface.
//!
//! Implementors provide either
//! [`black_vol_impl`](BlackVolTermStructure::black_vol_impl) or
//! [`black_variance_impl`](BlackVolTermStructure::black_variance_impl); the
//! other is derived.  Forward variances between two times come from the
//! difference of total variances and must be non-negative.

use crate::term_structure::{TermStructure, TermStructureCore};
use crate::volatility_term_structure::VolatilityTermStructure;
use ql_core::{
    ensure, errors::Result, register_with, Handle, LazyObject, LazyState, Natural, Observable,
    ObservableImpl, Observer, Real, Time, Volatility,
};
use ql_quotes::{quote_handle, Quote, QuoteHandleExt, SimpleQuote};
use ql_time::{BusinessDayConvention, Calendar, Date, DayCounter, Settings};
use std::rc::Rc;

/// Offset used when a zero-length interval is asked for.
const EPSILON: Time = 1.0e-5;

/// Black volatility term structure.
pub trait BlackVolTermStructure: VolatilityTermStructure {
    /// Black volatility at `(t, strike)`; defaults to `sqrt(variance / t)`.
    fn black_vol_impl(&self, t: Time, strike: Real) -> Result<Volatility> {
        let t = if t == 0.0 { EPSILON } else { t };
        Ok((self.black_variance_impl(t, strike)? / t).sqrt())
    }

    /// Total variance at `(t, strike)`; defaults to `vol² t`.
    fn black_variance_impl(&self, t: Time, strike: Real) -> Result<Real> {
        let vol = self.black_vol_impl(t, strike)?;
        Ok(vol * vol * t)
    }

    /// Black volatility at time `t`.
    fn black_vol(&self, t: Time, strike: Real, extrapolate: bool) -> Result<Volatility> {
        self.check_range(t, extrapolate)?;
        self.check_strike(strike, extrapolate)?;
        self.black_vol_impl(t, strike)
    }

    /// Black volatility at `date`.
    fn black_vol_date(&self, date: Date, strike: Real, extrapolate: bool) -> Result<Volatility> {
        self.check_range_date(date, extrapolate)?;
        self.black_vol(self.time_from_reference(date)?, strike, true)
    }

    /// Total variance at time `t`.
    fn black_variance(&self, t: Time, strike: Real, extrapolate: bool) -> Result<Real> {
        self.check_range(t, extrapolate)?;
        self.check_strike(strike, extrapolate)?;
        self.black_variance_impl(t, strike)
    }

    /// Total variance at `date`.
    fn black_variance_date(&self, date: Date, strike: Real, extrapolate: bool) -> Result<Real> {
        self.check_range_date(date, extrapolate)?;
        self.black_variance(self.time_from_reference(date)?, strike, true)
    }

    /// Variance accumulated between `t1` and `t2`.
    ///
    /// # Errors
    /// [`Error::Precondition`](ql_core::Error::Precondition) if `t2 < t1` or
    /// the total variance decreases between them.
    fn black_forward_variance(
        &self,
        t1: Time,
        t2: Time,
        strike: Real,
        extrapolate: bool,
    ) -> Result<Real> {
        ensure!(t2 >= t1, "initial time ({t1}) must be less than final time ({t2})");
        self.check_range(t2, extrapolate)?;
        self.check_strike(strike, extrapolate)?;
        let v1 = self.black_variance_impl(t1, strike)?;
        let v2 = self.black_variance_impl(t2, strike)?;
        ensure!(
            v2 >= v1,
            "variances must be non-decreasing: {v1} at {t1}, {v2} at {t2}"
        );
        Ok(v2 - v1)
    }

    /// Volatility of the variance accumulated between `t1` and `t2`;
    /// instantaneous when they coincide.
    fn black_forward_vol(
        &self,
        t1: Time,
        t2: Time,
        strike: Real,
        extrapolate: bool,
    ) -> Result<Volatility> {
        ensure!(t2 >= t1, "initial time ({t1}) must be less than final time ({t2})");
        self.check_range(t2, extrapolate)?;
        self.check_strike(strike, extrapolate)?;
        if t2 > t1 {
            let variance = self.black_forward_variance(t1, t2, strike, true)?;
            return Ok((variance / (t2 - t1)).sqrt());
        }
        if t1 == 0.0 {
            return Ok((self.black_variance_impl(EPSILON, strike)? / EPSILON).sqrt());
        }
        let eps = EPSILON.min(t1);
        let v1 = self.black_variance_impl(t1 - eps, strike)?;
        let v2 = self.black_variance_impl(t1 + eps, strike)?;
        ensure!(v2 >= v1, "variances must be non-decreasing around {t1}");
        Ok(((v2 - v1) / (2.0 * eps)).sqrt())
    }
}

// ── BlackConstantVol ──────────────────────────────────────────────────────────

/// A flat Black volatility read from a quote.
#[derive(Debug)]
pub struct BlackConstantVol {
    core: TermStructureCore,
    lazy: LazyState,
    volatility: Handle<dyn Quote>,
}

impl BlackConstantVol {
    /// Flat volatility from a fixed reference date.
    pub fn new(
        reference_date: Date,
        calendar: Calendar,
        volatility: Handle<dyn Quote>,
        day_counter: DayCounter,
    ) -> Rc<Self> {
        Self::build(
            TermStructureCore::fixed(reference_date, calendar, day_counter),
            volatility,
        )
    }

    /// Flat constant volatility from a fixed reference date.
    pub fn with_volatility(
        reference_date: Date,
        calendar: Calendar,
        volatility: Volatility,
        day_counter: DayCounter,
    ) -> Rc<Self> {
        let quote = Rc::new(SimpleQuote::new(volatility));
        Self::new(reference_date, calendar, quote_handle(&quote), day_counter)
    }

    /// Flat volatility whose reference date follows the evaluation date.
    pub fn floating(
        settings: Rc<Settings>,
        settlement_days: Natural,
        calendar: Calendar,
        volatility: Handle<dyn Quote>,
        day_counter: DayCounter,
    ) -> Rc<Self> {
        Self::build(
            TermStructureCore::floating(settings, settlement_days, calendar, day_counter),
            volatility,
        )
    }

    fn build(core: TermStructureCore, volatility: Handle<dyn Quote>) -> Rc<Self> {
        let surface = Rc::new(Self {
            core,
            lazy: LazyState::new(),
            volatility,
        });
        register_with(&surface, &surface.volatility);
        surface.core.observe_settings(&surface);
        surface
    }
}

impl Observable for BlackConstantVol {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for BlackConstantVol {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for BlackConstantVol {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        Ok(())
    }
}

impl TermStructure for BlackConstantVol {
    crate::delegate_to_core!(core);

    fn max_date(&self) -> Result<Date> {
        Ok(Date::MAX)
    }
}

impl VolatilityTermStructure for BlackConstantVol {
    fn business_day_convention(&self) -> Result<BusinessDayConvention> {
        Ok(BusinessDayConvention::Following)
    }

    fn min_strike(&self) -> Result<Real> {
        Ok(Real::MIN)
    }

    fn max_strike(&self) -> Result<Real> {
        Ok(Real::MAX)
    }
}

impl BlackVolTermStructure for BlackConstantVol {
    fn black_vol_impl(&self, _t: Time, _strike: Real) -> Result<Volatility> {
        self.calculate()?;
        self.volatility.value()
    }
}
