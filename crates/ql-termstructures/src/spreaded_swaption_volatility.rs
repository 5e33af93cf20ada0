//! `SpreadedSwaptionVolatility` — swaption volatilities shifted by a spread
//! quote.

use crate::smile_section::{SmileSection, SpreadedSmileSection, VolatilityType};
use crate::swaption_volatility_structure::SwaptionVolatilityStructure;
use crate::term_structure::{Extrapolator, TermStructure};
use crate::volatility_term_structure::VolatilityTermStructure;
use ql_core::{
    errors::Result, register_with, Handle, LazyObject, LazyState, Observable, ObservableImpl,
    Observer, Real, Time, Volatility,
};
use ql_quotes::{Quote, QuoteHandleExt};
use ql_time::{BusinessDayConvention, Date, Period};
use std::rc::Rc;

/// Another swaption volatility structure plus a spread.
#[derive(Debug)]
pub struct SpreadedSwaptionVolatility {
    lazy: LazyState,
    extrapolator: Extrapolator,
    original: Handle<dyn SwaptionVolatilityStructure>,
    spread: Handle<dyn Quote>,
}

impl SpreadedSwaptionVolatility {
    /// Shift `original` by `spread`.
    pub fn new(
        original: Handle<dyn SwaptionVolatilityStructure>,
        spread: Handle<dyn Quote>,
    ) -> Rc<Self> {
        let structure = Rc::new(Self {
            lazy: LazyState::new(),
            extrapolator: Extrapolator::new(),
            original,
            spread,
        });
        register_with(&structure, &structure.original);
        register_with(&structure, &structure.spread);
        structure
    }
}

impl Observable for SpreadedSwaptionVolatility {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for SpreadedSwaptionVolatility {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for SpreadedSwaptionVolatility {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        Ok(())
    }
}

impl TermStructure for SpreadedSwaptionVolatility {
    crate::delegate_to_handle!(original);

    fn max_date(&self) -> Result<Date> {
        self.original.current()?.max_date()
    }

    fn extrapolator(&self) -> &Extrapolator {
        &self.extrapolator
    }
}

impl VolatilityTermStructure for SpreadedSwaptionVolatility {
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

impl SwaptionVolatilityStructure for SpreadedSwaptionVolatility {
    fn max_swap_tenor(&self) -> Result<Period> {
        self.original.current()?.max_swap_tenor()
    }

    fn volatility_impl(
        &self,
        option_time: Time,
        swap_length: Time,
        strike: Real,
    ) -> Result<Volatility> {
        self.calculate()?;
        let vol = self
            .original
            .current()?
            .volatility(option_time, swap_length, strike, true)?;
        Ok(vol + self.spread.value()?)
    }

    fn smile_section_impl(
        &self,
        option_time: Time,
        swap_length: Time,
    ) -> Result<Rc<dyn SmileSection>> {
        self.calculate()?;
        let base = self
            .original
            .current()?
            .smile_section(option_time, swap_length, true)?;
        Ok(SpreadedSmileSection::new(base, self.spread.clone()))
    }

    fn volatility_type(&self) -> VolatilityType {
        self.original
            .get()
            .map_or(VolatilityType::ShiftedLognormal, |o| o.volatility_type())
    }
}
