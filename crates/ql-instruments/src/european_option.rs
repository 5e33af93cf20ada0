//! European options on a single underlying.

use crate::instrument::{has_occurred, Instrument, InstrumentCore};
use crate::payoff::{OptionType, PlainVanillaPayoff};
use ql_core::{errors::Result, register_with, Real};
use ql_time::{Date, Settings};
use std::rc::{Rc, Weak};

/// Arguments handed to engines pricing a [`EuropeanOption`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EuropeanOptionArguments {
    /// The payoff.
    pub payoff: PlainVanillaPayoff,
    /// The single exercise date.
    pub expiry: Date,
}

/// A plain vanilla option exercisable only at expiry.
#[derive(Debug)]
pub struct EuropeanOption {
    core: InstrumentCore<EuropeanOptionArguments>,
    payoff: PlainVanillaPayoff,
    expiry: Date,
    settings: Rc<Settings>,
}

impl EuropeanOption {
    /// Create an option; it expires once `expiry` is past the session's
    /// evaluation date.
    pub fn new(payoff: PlainVanillaPayoff, expiry: Date, settings: Rc<Settings>) -> Rc<Self> {
        let option = Rc::new_cyclic(|me: &Weak<Self>| Self {
            core: InstrumentCore::new(me.clone()),
            payoff,
            expiry,
            settings,
        });
        register_with(&option, option.settings.as_ref());
        option
    }

    /// Convenience: a plain call or put.
    pub fn vanilla(
        option_type: OptionType,
        strike: Real,
        expiry: Date,
        settings: Rc<Settings>,
    ) -> Rc<Self> {
        Self::new(PlainVanillaPayoff::new(option_type, strike), expiry, settings)
    }

    /// The payoff.
    pub fn payoff(&self) -> PlainVanillaPayoff {
        self.payoff
    }

    /// The exercise date.
    pub fn expiry(&self) -> Date {
        self.expiry
    }

    /// Sensitivity to the spot price.
    pub fn delta(&self) -> Result<Real> {
        self.result("delta")
    }

    /// Second-order sensitivity to the spot price.
    pub fn gamma(&self) -> Result<Real> {
        self.result("gamma")
    }

    /// Sensitivity to the volatility.
    pub fn vega(&self) -> Result<Real> {
        self.result("vega")
    }

    /// Sensitivity to the risk-free rate.
    pub fn rho(&self) -> Result<Real> {
        self.result("rho")
    }
}

crate::instrument_plumbing!(EuropeanOption);

impl Instrument for EuropeanOption {
    type Arguments = EuropeanOptionArguments;

    fn core(&self) -> &InstrumentCore<EuropeanOptionArguments> {
        &self.core
    }

    fn arguments(&self) -> Result<EuropeanOptionArguments> {
        Ok(EuropeanOptionArguments {
            payoff: self.payoff,
            expiry: self.expiry,
        })
    }

    fn is_expired(&self) -> Result<bool> {
        Ok(has_occurred(self.expiry, &self.settings))
    }
}
