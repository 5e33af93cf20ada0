//! `SmileSection` — the volatility smile at a single expiry.
//!
//! A smile section maps strike to implied volatility at a fixed exercise
//! time.  Volatility structures hand them out through
//! `smile_section(t)`; spreaded structures wrap the original's section in a
//! [`SpreadedSmileSection`] rather than building a new one.

use ql_core::{
    errors::{Error, Result},
    register_with, Handle, Observable, ObservableImpl, Observer, Real, Time, Volatility,
};
use ql_math::{bachelier_formula, black_formula, OptionType};
use ql_quotes::{Quote, QuoteHandleExt};
use std::rc::Rc;

/// How a volatility is quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VolatilityType {
    /// Black volatility of the (possibly shifted) underlying.
    #[default]
    ShiftedLognormal,
    /// Bachelier volatility.
    Normal,
}

/// Implied volatility against strike at one exercise time.
pub trait SmileSection: Observable + std::fmt::Debug {
    /// Exercise time in years.
    fn exercise_time(&self) -> Time;

    /// Smallest strike served.
    fn min_strike(&self) -> Real;

    /// Largest strike served.
    fn max_strike(&self) -> Real;

    /// At-the-money forward, when known.
    fn atm_level(&self) -> Option<Real>;

    /// Volatility at `strike`.
    fn volatility_impl(&self, strike: Real) -> Result<Volatility>;

    /// Total variance at `strike`.
    fn variance_impl(&self, strike: Real) -> Result<Real> {
        let v = self.volatility_impl(strike)?;
        Ok(v * v * self.exercise_time())
    }

    /// Quoting convention of the volatilities.
    fn volatility_type(&self) -> VolatilityType {
        VolatilityType::ShiftedLognormal
    }

    /// Displacement of a shifted-lognormal section.
    fn shift(&self) -> Real {
        0.0
    }

    /// Volatility at `strike`.
    fn volatility(&self, strike: Real) -> Result<Volatility> {
        self.volatility_impl(strike)
    }

    /// Total variance at `strike`.
    fn variance(&self, strike: Real) -> Result<Real> {
        self.variance_impl(strike)
    }

    /// Premium of a European option at `strike`, scaled by `discount`.
    ///
    /// # Errors
    /// [`Error::NotSet`] if the section has no ATM level.
    fn option_price(&self, strike: Real, option_type: OptionType, discount: Real) -> Result<Real> {
        let forward = self
            .atm_level()
            .ok_or_else(|| Error::NotSet("smile section ATM level".into()))?;
        let std_dev = self.variance(strike)?.sqrt();
        match self.volatility_type() {
            VolatilityType::ShiftedLognormal => {
                black_formula(option_type, strike, forward, std_dev, discount, self.shift())
            }
            VolatilityType::Normal => {
                bachelier_formula(option_type, strike, forward, std_dev, discount)
            }
        }
    }
}

// ── FlatSmileSection ──────────────────────────────────────────────────────────

/// A strike-independent smile.
#[derive(Debug)]
pub struct FlatSmileSection {
    exercise_time: Time,
    volatility: Volatility,
    atm_level: Option<Real>,
    volatility_type: VolatilityType,
    shift: Real,
    observable: ObservableImpl,
}

impl FlatSmileSection {
    /// A lognormal flat smile.
    pub fn new(exercise_time: Time, volatility: Volatility, atm_level: Option<Real>) -> Self {
        Self::with_type(
            exercise_time,
            volatility,
            atm_level,
            VolatilityType::ShiftedLognormal,
            0.0,
        )
    }

    /// A flat smile with an explicit quoting convention.
    pub fn with_type(
        exercise_time: Time,
        volatility: Volatility,
        atm_level: Option<Real>,
        volatility_type: VolatilityType,
        shift: Real,
    ) -> Self {
        Self {
            exercise_time,
            volatility,
            atm_level,
            volatility_type,
            shift,
            observable: ObservableImpl::new(),
        }
    }
}

impl Observable for FlatSmileSection {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl SmileSection for FlatSmileSection {
    fn exercise_time(&self) -> Time {
        self.exercise_time
    }

    fn min_strike(&self) -> Real {
        match self.volatility_type {
            VolatilityType::ShiftedLognormal => -self.shift,
            VolatilityType::Normal => Real::MIN,
        }
    }

    fn max_strike(&self) -> Real {
        Real::MAX
    }

    fn atm_level(&self) -> Option<Real> {
        self.atm_level
    }

    fn volatility_impl(&self, _strike: Real) -> Result<Volatility> {
        Ok(self.volatility)
    }

    fn volatility_type(&self) -> VolatilityType {
        self.volatility_type
    }

    fn shift(&self) -> Real {
        self.shift
    }
}

// ── SpreadedSmileSection ──────────────────────────────────────────────────────

/// Another section's smile shifted by a spread quote.
#[derive(Debug)]
pub struct SpreadedSmileSection {
    underlying: Rc<dyn SmileSection>,
    spread: Handle<dyn Quote>,
    observable: ObservableImpl,
}

impl SpreadedSmileSection {
    /// Wrap `underlying`, adding `spread` to every volatility.
    pub fn new(underlying: Rc<dyn SmileSection>, spread: Handle<dyn Quote>) -> Rc<Self> {
        let section = Rc::new(Self {
            underlying,
            spread,
            observable: ObservableImpl::new(),
        });
        register_with(&section, section.underlying.as_ref());
        register_with(&section, &section.spread);
        section
    }

    /// The wrapped section.
    pub fn underlying(&self) -> &Rc<dyn SmileSection> {
        &self.underlying
    }
}

impl Observer for SpreadedSmileSection {
    fn update(&self) -> Result<()> {
        self.observable.notify()
    }
}

impl Observable for SpreadedSmileSection {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl SmileSection for SpreadedSmileSection {
    fn exercise_time(&self) -> Time {
        self.underlying.exercise_time()
    }

    fn min_strike(&self) -> Real {
        self.underlying.min_strike()
    }

    fn max_strike(&self) -> Real {
        self.underlying.max_strike()
    }

    fn atm_level(&self) -> Option<Real> {
        self.underlying.atm_level()
    }

    fn volatility_impl(&self, strike: Real) -> Result<Volatility> {
        Ok(self.underlying.volatility(strike)? + self.spread.value()?)
    }

    fn volatility_type(&self) -> VolatilityType {
        self.underlying.volatility_type()
    }

    fn shift(&self) -> Real {
        self.underlying.shift()
    }
}
