//! Calibration helpers: a market quote paired with a model-implied value.

use ql_core::{
    errors::{Error, Result},
    Handle, Observable, Real, Volatility,
};
use ql_math::solvers1d::brent;
use ql_quotes::{Quote, QuoteHandleExt};
use ql_termstructures::VolatilityType;
use std::rc::Rc;

/// Residual assigned to a helper whose error could not be computed for a
/// recoverable reason (e.g. the implied-vol solve did not converge).
pub const CALIBRATION_PENALTY: Real = 1.0;

/// Market values smaller than this are compared in absolute terms under
/// [`CalibrationErrorType::RelativePriceError`].
pub const RELATIVE_ERROR_FLOOR: Real = 1e-10;

/// How a helper measures the distance between model and market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalibrationErrorType {
    /// `(model − market) / market`.
    ///
    /// When `|market|` is below [`RELATIVE_ERROR_FLOOR`] the division is
    /// skipped and the error is `model − market`.
    #[default]
    RelativePriceError,
    /// `model − market`.
    PriceError,
    /// Black vol implied by the model price minus the market vol.
    ImpliedVolError,
}

/// Something a model can be calibrated against.
pub trait CalibrationHelper: Observable + std::fmt::Debug {
    /// Signed distance between model and market.
    fn calibration_error(&self) -> Result<Real>;

    /// Whether the market quote can be used.
    fn quote_is_valid(&self) -> bool;
}

/// A helper quoted as a Black (or Bachelier) volatility.
pub trait BlackCalibrationHelper: CalibrationHelper {
    /// The market volatility quote.
    fn volatility(&self) -> &Handle<dyn Quote>;

    /// Quoting convention of [`volatility`](Self::volatility).
    fn volatility_type(&self) -> VolatilityType {
        VolatilityType::ShiftedLognormal
    }

    /// How [`calibration_error`](CalibrationHelper::calibration_error)
    /// compares model and market.
    fn error_type(&self) -> CalibrationErrorType;

    /// Market price, from the quoted volatility.
    fn market_value(&self) -> Result<Real>;

    /// Price under the model being calibrated.
    fn model_value(&self) -> Result<Real>;

    /// Price of the helper's instrument at volatility `volatility`.
    fn black_price(&self, volatility: Volatility) -> Result<Real>;

    /// Volatility at which [`black_price`](Self::black_price) matches
    /// `target_value`.
    fn implied_volatility(
        &self,
        target_value: Real,
        accuracy: Real,
        max_evaluations: usize,
        min_vol: Volatility,
        max_vol: Volatility,
    ) -> Result<Volatility> {
        brent(
            |vol| Ok(self.black_price(vol)? - target_value),
            min_vol,
            max_vol,
            accuracy,
            max_evaluations,
        )
    }

    /// Calibration error dispatched on [`error_type`](Self::error_type).
    fn black_calibration_error(&self) -> Result<Real> {
        match self.error_type() {
            CalibrationErrorType::PriceError => Ok(self.model_value()? - self.market_value()?),
            CalibrationErrorType::RelativePriceError => {
                let market = self.market_value()?;
                let model = self.model_value()?;
                if market.abs() < RELATIVE_ERROR_FLOOR {
                    Ok(model - market)
                } else {
                    Ok((model - market) / market)
                }
            }
            CalibrationErrorType::ImpliedVolError => {
                let (min_vol, max_vol) = match self.volatility_type() {
                    VolatilityType::ShiftedLognormal => (0.0010, 10.0),
                    VolatilityType::Normal => (0.00005, 0.50),
                };
                let model = self.model_value()?;
                let implied = if model <= self.black_price(min_vol)? {
                    min_vol
                } else if model >= self.black_price(max_vol)? {
                    max_vol
                } else {
                    self.implied_volatility(model, 1e-12, 5000, min_vol, max_vol)?
                };
                Ok(implied - self.volatility().value()?)
            }
        }
    }
}

/// Weighted residuals `√w · e` of the helpers with a valid quote.
///
/// Helpers with an invalid quote are skipped; recoverable failures are
/// replaced by [`CALIBRATION_PENALTY`]; anything else aborts.
pub(crate) fn helper_residuals(
    helpers: &[Rc<dyn CalibrationHelper>],
    weights: &[Real],
) -> Result<Vec<Real>> {
    let mut residuals = Vec::with_capacity(helpers.len());
    for (i, helper) in helpers.iter().enumerate() {
        if !helper.quote_is_valid() {
            tracing::warn!(helper = i, "calibration helper excluded: invalid quote");
            continue;
        }
        let weight = weights.get(i).copied().unwrap_or(1.0);
        let error = match helper.calibration_error() {
            Ok(e) => e,
            Err(e) if e.is_recoverable() => {
                tracing::warn!(helper = i, error = %e, "calibration helper penalised");
                CALIBRATION_PENALTY
            }
            Err(e) => return Err(e),
        };
        residuals.push(weight.sqrt() * error);
    }
    Ok(residuals)
}

/// Weighted sum of squared calibration errors over the helpers with a
/// valid quote.
pub fn calibration_objective(
    helpers: &[Rc<dyn CalibrationHelper>],
    weights: &[Real],
) -> Result<Real> {
    if !weights.is_empty() && weights.len() != helpers.len() {
        return Err(Error::Precondition(format!(
            "mismatch between number of helpers ({}) and weights ({})",
            helpers.len(),
            weights.len()
        )));
    }
    Ok(helper_residuals(helpers, weights)?
        .iter()
        .map(|r| r * r)
        .sum())
}
