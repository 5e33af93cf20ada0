//! `SwaptionVolatilityStructure` — volatilities by option time and
//! underlying swap length, and the flat `ConstantSwaptionVolatility`.
//!
//! Swap lengths are measured in years.

use crate::smile_section::{FlatSmileSection, SmileSection, VolatilityType};
use crate::term_structure::{TermStructure, TermStructureCore};
use crate::volatility_term_structure::VolatilityTermStructure;
use ql_core::{
    ensure, errors::Error, errors::Result, register_with, Handle, LazyObject, LazyState, Natural,
    Observable, ObservableImpl, Observer, Real, Time, Volatility,
};
use ql_quotes::{quote_handle, Quote, QuoteHandleExt, SimpleQuote};
use ql_time::{BusinessDayConvention, Calendar, Date, DayCounter, Period, Settings, TimeUnit};
use std::rc::Rc;

/// Volatility of European swaptions.
pub trait SwaptionVolatilityStructure: VolatilityTermStructure {
    /// Longest underlying swap tenor served.
    fn max_swap_tenor(&self) -> Result<Period>;

    /// Volatility at `(option_time, swap_length, strike)`.
    fn volatility_impl(&self, option_time: Time, swap_length: Time, strike: Real)
        -> Result<Volatility>;

    /// Smile section at `(option_time, swap_length)`.
    fn smile_section_impl(&self, option_time: Time, swap_length: Time)
        -> Result<Rc<dyn SmileSection>>;

    /// Quoting convention of the volatilities.
    fn volatility_type(&self) -> VolatilityType {
        VolatilityType::ShiftedLognormal
    }

    /// Longest underlying swap length in years.
    fn max_swap_length(&self) -> Result<Time> {
        Ok(self.max_swap_tenor()?.years())
    }

    /// Check the swap-length domain.
    fn check_swap_length(&self, swap_length: Time, extrapolate: bool) -> Result<()> {
        ensure!(swap_length > 0.0, "non-positive swap length ({swap_length}) given");
        if extrapolate || self.allows_extrapolation() {
            return Ok(());
        }
        let max = self.max_swap_length()?;
        if swap_length > max {
            return Err(Error::Extrapolation(format!(
                "swap length ({swap_length}) longer than max swap length ({max})"
            )));
        }
        Ok(())
    }

    /// Volatility for an option expiring at `option_time` on a swap of
    /// `swap_length` years.
    fn volatility(
        &self,
        option_time: Time,
        swap_length: Time,
        strike: Real,
        extrapolate: bool,
    ) -> Result<Volatility> {
        self.check_range(option_time, extrapolate)?;
        self.check_swap_length(swap_length, extrapolate)?;
        self.check_strike(strike, extrapolate)?;
        self.volatility_impl(option_time, swap_length, strike)
    }

    /// Total variance for `(option_time, swap_length, strike)`.
    fn black_variance(
        &self,
        option_time: Time,
        swap_length: Time,
        strike: Real,
        extrapolate: bool,
    ) -> Result<Real> {
        let vol = self.volatility(option_time, swap_length, strike, extrapolate)?;
        Ok(vol * vol * option_time)
    }

    /// Smile section at `(option_time, swap_length)`.
    fn smile_section(
        &self,
        option_time: Time,
        swap_length: Time,
        extrapolate: bool,
    ) -> Result<Rc<dyn SmileSection>> {
        self.check_range(option_time, extrapolate)?;
        self.check_swap_length(swap_length, extrapolate)?;
        self.smile_section_impl(option_time, swap_length)
    }
}

// ── ConstantSwaptionVolatility ───────────────────────────────────────────────

/// Flat swaption volatility read from a quote.
#[derive(Debug)]
pub struct ConstantSwaptionVolatility {
    core: TermStructureCore,
    lazy: LazyState,
    volatility: Handle<dyn Quote>,
    convention: BusinessDayConvention,
    volatility_type: VolatilityType,
}

impl ConstantSwaptionVolatility {
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
    pub fn floating(
        settings: Rc<Settings>,
        settlement_days: Natural,
        calendar: Calendar,
        convention: BusinessDayConvention,
        volatility: Handle<dyn Quote>,
        day_counter: DayCounter,
        volatility_type: VolatilityType,
    ) -> Rc<Self> {
        Self::build(
            TermStructureCore::floating(settings, settlement_days, calendar, day_counter),
            convention,
            volatility,
            volatility_type,
        )
    }

    fn build(
        core: TermStructureCore,
        convention: BusinessDayConvention,
        volatility: Handle<dyn Quote>,
        volatility_type: VolatilityType,
    ) -> Rc<Self> {
        let structure = Rc::new(Self {
            core,
            lazy: LazyState::new(),
            volatility,
            convention,
            volatility_type,
        });
        register_with(&structure, &structure.volatility);
        structure.core.observe_settings(&structure);
        structure
    }
}

impl Observable for ConstantSwaptionVolatility {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for ConstantSwaptionVolatility {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for ConstantSwaptionVolatility {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        Ok(())
    }
}

impl TermStructure for ConstantSwaptionVolatility {
    crate::delegate_to_core!(core);

    fn max_date(&self) -> Result<Date> {
        Ok(Date::MAX)
    }
}

impl VolatilityTermStructure for ConstantSwaptionVolatility {
    fn business_day_convention(&self) -> Result<BusinessDayConvention> {
        Ok(self.convention)
    }

    fn min_strike(&self) -> Result<Real> {
        Ok(Real::MIN)
    }

    fn max_strike(&self) -> Result<Real> {
        Ok(Real::MAX)
    }
}

impl SwaptionVolatilityStructure for ConstantSwaptionVolatility {
    fn max_swap_tenor(&self) -> Result<Period> {
        Ok(Period::new(100, TimeUnit::Years))
    }

    fn volatility_impl(&self, _option_time: Time, _swap_length: Time, _strike: Real)
        -> Result<Volatility> {
        self.calculate()?;
        self.volatility.value()
    }

    fn smile_section_impl(&self, option_time: Time, swap_length: Time)
        -> Result<Rc<dyn SmileSection>> {
        let vol = self.volatility_impl(option_time, swap_length, 0.0)?;
        Ok(Rc::new(FlatSmileSection::with_type(
            option_time,
            vol,
            None,
            self.volatility_type,
            0.0,
        )))
    }

    fn volatility_type(&self) -> VolatilityType {
        self.volatility_type
    }
}
