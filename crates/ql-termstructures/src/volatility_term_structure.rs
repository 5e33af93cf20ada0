//! `VolatilityTermStructure` — volatility structures over time and strike.
//!
//! Adds a strike domain and a business-day convention for option dates to
//! [`TermStructure`].

use crate::term_structure::TermStructure;
use ql_core::errors::{Error, Result};
use ql_core::Real;
use ql_time::{BusinessDayConvention, Date, Period};

/// Base capability of volatility term structures.
pub trait VolatilityTermStructure: TermStructure {
    /// Convention used to roll option dates.
    fn business_day_convention(&self) -> Result<BusinessDayConvention>;

    /// Smallest strike served.
    fn min_strike(&self) -> Result<Real>;

    /// Largest strike served.
    fn max_strike(&self) -> Result<Real>;

    /// Expiry date of an option with the given tenor.
    fn option_date_from_tenor(&self, tenor: Period) -> Result<Date> {
        self.calendar()?.advance(
            self.reference_date()?,
            tenor,
            self.business_day_convention()?,
            false,
        )
    }

    /// Check that `strike` lies in the strike domain.
    ///
    /// # Errors
    /// [`Error::Extrapolation`] outside `[min_strike, max_strike]` unless
    /// `extrapolate` is set or extrapolation is enabled.
    fn check_strike(&self, strike: Real, extrapolate: bool) -> Result<()> {
        if extrapolate || self.allows_extrapolation() {
            return Ok(());
        }
        let (low, high) = (self.min_strike()?, self.max_strike()?);
        if strike < low || strike > high {
            return Err(Error::Extrapolation(format!(
                "strike ({strike}) is outside the curve domain [{low}, {high}]"
            )));
        }
        Ok(())
    }
}
