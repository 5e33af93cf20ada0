//! `SpreadedOptionletVolatility` — optionlet volatilities shifted by a
//! spread quote.

use crate::optionlet_volatility_structure::OptionletVolatilityStructure;
use crate::smile_section::{SmileSection, SpreadedSmileSection, VolatilityType};
use crate::term_structure::{Extrapolator, TermStructure};
use crate::volatility_term_structure::VolatilityTermStructure;
use ql_core::{
    errors::Result, register_with, Handle, LazyObject, LazyState, Observable, ObservableImpl,
    Observer, Real, Time, Volatility,
};
use ql_quotes::{Quote, QuoteHandleExt};
use ql_time::{BusinessDayConvention, Date};
use std::rc::Rc;

/// Another optionlet volatility structure plus a spread.
#[derive(Debug)]
pub struct SpreadedOptionletVolatility {
    lazy: LazyState,
    extrapolator: Extrapolator,
    original: Handle<dyn OptionletVolatilityStructure>,
    spread: Handle<dyn Quote>,
}

impl SpreadedOptionletVolatility {
    /// Shift `original` by `spread`.
    pub fn new(
        original: Handle<dyn OptionletVolatilityStructure>,
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

impl Observable for SpreadedOptionletVolatility {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for SpreadedOptionletVolatility {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for SpreadedOptionletVolatility {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        Ok(())
    }
}

impl TermStructure for SpreadedOptionletVolatility {
    crate::delegate_to_handle!(original);

    fn max_date(&self) -> Result<Date> {
        self.original.current()?.max_date()
    }

    fn extrapolator(&self) -> &Extrapolator {
        &self.extrapolator
    }
}

impl VolatilityTermStructure for SpreadedOptionletVolatility {
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

impl OptionletVolatilityStructure for SpreadedOptionletVolatility {
    fn volatility_impl(&self, t: Time, strike: Real) -> Result<Volatility> {
        self.calculate()?;
        Ok(self.original.current()?.volatility(t, strike, true)? + self.spread.value()?)
    }

    fn smile_section_impl(&self, t: Time) -> Result<Rc<dyn SmileSection>> {
        self.calculate()?;
        let base = self.original.current()?.smile_section(t, true)?;
        Ok(SpreadedSmileSection::new(base, self.spread.clone()))
    }

    fn volatility_type(&self) -> VolatilityType {
        self.original
            .get()
            .map_or(VolatilityType::ShiftedLognormal, |o| o.volatility_type())
    }

    fn displacement(&self) -> Real {
        self.original.get().map_or(0.0, |o| o.displacement())
    }
}
