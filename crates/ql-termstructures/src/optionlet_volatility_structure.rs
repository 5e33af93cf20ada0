//! `OptionletVolatilityStructure` — caplet/floorlet volatilities, and the
//! flat `ConstantOptionletVolatility`.

use crate::smile_section::{FlatSmileSection, SmileSection, VolatilityType};
use crate::term_structure::{TermStructure, TermStructureCore};
use crate::volatility_term_structure::VolatilityTermStructure;
use ql_core::{
    errors::Result, register_with, Handle, LazyObject, LazyState, Natural, Observable,
    ObservableImpl, Observer, Real, Time, Volatility,
};
use ql_quotes::{quote_handle, Quote, QuoteHandleExt, SimpleQuote};
use ql_time::{BusinessDayConvention, Calendar, Date, DayCounter, Settings};
use std::rc::Rc;

/// Volatility of single-period interest-rate options.
pub trait OptionletVolatilityStructure: VolatilityTermStructure {
    /// Volatility at `(t, strike)`.
    fn volatility_impl(&self, t: Time, strike: Real) -> Result<Volatility>;

    /// Smile section at option time `t`.
    fn smile_section_impl(&self, t: Time) -> Result<Rc<dyn SmileSection>>;

    /// Quoting convention of the volatilities.
    fn volatility_type(&self) -> VolatilityType {
        VolatilityType::ShiftedLognormal
    }

    /// Displacement of shifted-lognormal volatilities.
    fn displacement(&self) -> Real {
        0.0
    }

    /// Volatility at option time `t`.
    fn volatility(&self, t: Time, strike: Real, extrapolate: bool) -> Result<Volatility> {
        self.check_range(t, extrapolate)?;
        self.check_strike(strike, extrapolate)?;
        self.volatility_impl(t, strike)
    }

    /// Volatility at option date `date`.
    fn volatility_date(&self, date: Date, strike: Real, extrapolate: bool) -> Result<Volatility> {
        self.check_range_date(date, extrapolate)?;
        self.volatility(self.time_from_reference(date)?, strike, true)
    }

    /// Total variance at option time `t`.
    fn black_variance(&self, t: Time, strike: Real, extrapolate: bool) -> Result<Real> {
        let vol = self.volatility(t, strike, extrapolate)?;
        Ok(vol * vol * t)
    }

    /// Smile section at option time `t`.
    fn smile_section(&self, t: Time, extrapolate: bool) -> Result<Rc<dyn SmileSection>> {
        self.check_range(t, extrapolate)?;
        self.smile_section_impl(t)
    }
}

// ── ConstantOptionletVolatility ───────────────────────────────────────────────

/// Flat optionlet volatility read from a quote.
#[derive(Debug)]
pub struct ConstantOptionletVolatility {
    core: TermStructureCore,
    lazy: LazyState,
    volatility: Handle<dyn Quote>,
    convention: BusinessDayConvention,
    volatility_type: VolatilityType,
    displacement: Real,
}

impl ConstantOptionletVolatility {
    /// Flat lognormal volatility from a fixed reference date.
    pub fn new(
        reference_date: Date,
        calendar: Calendar,
        convention: BusinessDayConvention,
        volatility: Handle<dyn Quote>,
        day_counter: DayCounter,
    ) -> Rc<Self> {
        Self::build(
            TermStructureCore::fixed(reference_date, calendar, day_counter),
            convention,
            volatility,
            VolatilityType::ShiftedLognormal,
            0.0,
        )
    }

    /// Flat lognormal constant volatility from a fixed reference date.
    pub fn with_volatility(
        reference_date: Date,
        calendar: Calendar,
        convention: BusinessDayConvention,
        volatility: Volatility,
        day_counter: DayCounter,
    ) -> Rc<Self> {
        let quote = Rc::new(SimpleQuote::new(volatility));
        Self::new(
            reference_date,
            calendar,
            convention,
            quote_handle(&quote),
            day_counter,
        )
    }

    /// Flat volatility whose reference date follows the evaluation date.
    #[allow(clippy::too_many_arguments)]
    pub fn floating(
        settings: Rc<Settings>,
        settlement_days: Natural,
        calendar: Calendar,
        convention: BusinessDayConvention,
        volatility: Handle<dyn Quote>,
        day_counter: DayCounter,
        volatility_type: VolatilityType,
        displacement: Real,
    ) -> Rc<Self> {
        Self::build(
            TermStructureCore::floating(settings, settlement_days, calendar, day_counter),
            convention,
            volatility,
            volatility_type,
            displacement,
        )
    }

    fn build(
        core: TermStructureCore,
        convention: BusinessDayConvention,
        volatility: Handle<dyn Quote>,
        volatility_type: VolatilityType,
        displacement: Real,
    ) -> Rc<Self> {
        let structure = Rc::new(Self {
            core,
            lazy: LazyState::new(),
            volatility,
            convention,
            volatility_type,
            displacement,
        });
        register_with(&structure, &structure.volatility);
        structure.core.observe_settings(&structure);
        structure
    }
}

impl Observable for ConstantOptionletVolatility {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for ConstantOptionletVolatility {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for ConstantOptionletVolatility {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        Ok(())
    }
}

impl TermStructure for ConstantOptionletVolatility {
    crate::delegate_to_core!(core);

    fn max_date(&self) -> Result<Date> {
        Ok(Date::MAX)
    }
}

impl VolatilityTermStructure for ConstantOptionletVolatility {
    fn business_day_convention(&self) -> Result<BusinessDayConvention> {
        Ok(self.convention)
    }

    fn min_strike(&self) -> Result<Real> {
        Ok(match self.volatility_type {
            VolatilityType::ShiftedLognormal => -self.displacement,
            VolatilityType::Normal => Real::MIN,
        })
    }

    fn max_strike(&self) -> Result<Real> {
        Ok(Real::MAX)
    }
}

impl OptionletVolatilityStructure for ConstantOptionletVolatility {
    fn volatility_impl(&self, _t: Time, _strike: Real) -> Result<Volatility> {
        self.calculate()?;
        self.volatility.value()
    }

    fn smile_section_impl(&self, t: Time) -> Result<Rc<dyn SmileSection>> {
        let vol = self.volatility_impl(t, 0.0)?;
        Ok(Rc::new(FlatSmileSection::with_type(
            t,
            vol,
            None,
            self.volatility_type,
            self.displacement,
        )))
    }

    fn volatility_type(&self) -> VolatilityType {
        self.volatility_type
    }

    fn displacement(&self) -> Real {
        self.displacement
    }
}
