//! Short-rate model traits.
//!
//! ```text
//! CalibratedModel
//! └── ShortRateModel
//! ```

use crate::calibrated_model::CalibratedModel;
use ql_core::{errors::Result, DiscountFactor, Handle, Rate, Real, Time};
use ql_math::OptionType;
use ql_termstructures::YieldTermStructure;

/// A one-factor affine short-rate model fitted to a yield curve.
pub trait ShortRateModel: CalibratedModel {
    /// The curve the model is fitted to.
    fn term_structure(&self) -> &Handle<dyn YieldTermStructure>;

    /// Discount bond price `P(t, T)` given the short rate `rate` at `t`.
    fn discount_bond(&self, now: Time, maturity: Time, rate: Rate) -> Result<DiscountFactor>;

    /// Price at time zero of an option expiring at `maturity` on a discount
    /// bond maturing at `bond_maturity`.
    fn discount_bond_option(
        &self,
        option_type: OptionType,
        strike: Real,
        maturity: Time,
        bond_maturity: Time,
    ) -> Result<Real>;
}
