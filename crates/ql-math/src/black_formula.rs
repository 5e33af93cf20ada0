//! Black (lognormal) and Bachelier (normal) option formulas.
//!
//! All formulas work on the **total** standard deviation `σ √t` and return
//! forward premiums scaled by `discount`.  Shifted-lognormal quotes pass a
//! non-zero `displacement`.

use crate::distributions::{normal_cdf, normal_pdf};
use crate::solvers1d::brent;
use ql_core::{
    ensure,
    errors::{Error, Result},
    Real,
};

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    /// Right to buy.
    Call,
    /// Right to sell.
    Put,
}

impl OptionType {
    /// `+1` for calls, `-1` for puts.
    pub fn sign(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => f.write_str("Call"),
            OptionType::Put => f.write_str("Put"),
        }
    }
}

fn check_black_inputs(
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: Real,
    displacement: Real,
) -> Result<()> {
    ensure!(displacement >= 0.0, "displacement ({displacement}) must be non-negative");
    ensure!(
        strike + displacement >= 0.0,
        "strike + displacement ({strike} + {displacement}) must be non-negative"
    );
    ensure!(
        forward + displacement > 0.0,
        "forward + displacement ({forward} + {displacement}) must be positive"
    );
    ensure!(std_dev >= 0.0, "std dev ({std_dev}) must be non-negative");
    ensure!(discount > 0.0, "discount ({discount}) must be positive");
    Ok(())
}

/// Black-76 premium: `D·ω·(F N(ω d1) − K N(ω d2))`.
pub fn black_formula(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: Real,
    displacement: Real,
) -> Result<Real> {
    check_black_inputs(strike, forward, std_dev, discount, displacement)?;
    let w = option_type.sign();
    let f = forward + displacement;
    let k = strike + displacement;
    if std_dev == 0.0 {
        return Ok(discount * (w * (f - k)).max(0.0));
    }
    if k == 0.0 {
        return Ok(match option_type {
            OptionType::Call => discount * f,
            OptionType::Put => 0.0,
        });
    }
    let d1 = (f / k).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    let result = discount * w * (f * normal_cdf(w * d1) - k * normal_cdf(w * d2));
    // numerical noise can push deep out-of-the-money values slightly negative
    Ok(result.max(0.0))
}

/// Derivative of [`black_formula`] with respect to the total std dev.
pub fn black_formula_std_dev_derivative(
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: Real,
    displacement: Real,
) -> Result<Real> {
    check_black_inputs(strike, forward, std_dev, discount, displacement)?;
    let f = forward + displacement;
    let k = strike + displacement;
    if std_dev == 0.0 || k == 0.0 {
        return Ok(0.0);
    }
    let d1 = (f / k).ln() / std_dev + 0.5 * std_dev;
    Ok(discount * f * normal_pdf(d1))
}

/// Bachelier (normal model) premium.
pub fn bachelier_formula(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: Real,
) -> Result<Real> {
    ensure!(std_dev >= 0.0, "std dev ({std_dev}) must be non-negative");
    ensure!(discount > 0.0, "discount ({discount}) must be positive");
    let w = option_type.sign();
    let intrinsic = w * (forward - strike);
    if std_dev == 0.0 {
        return Ok(discount * intrinsic.max(0.0));
    }
    let d = intrinsic / std_dev;
    Ok(discount * (intrinsic * normal_cdf(d) + std_dev * normal_pdf(d)).max(0.0))
}

/// Total std dev implied by a Black premium.
///
/// # Errors
/// * [`Error::Precondition`] if the premium is below intrinsic value or
///   above the no-arbitrage upper bound;
/// * [`Error::NotConverged`] if the solver runs out of evaluations.
#[allow(clippy::too_many_arguments)]
pub fn black_formula_implied_std_dev(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    black_price: Real,
    discount: Real,
    displacement: Real,
    accuracy: Real,
    max_evaluations: usize,
) -> Result<Real> {
    check_black_inputs(strike, forward, 0.0, discount, displacement)?;
    let f = forward + displacement;
    let k = strike + displacement;
    let intrinsic = discount * (option_type.sign() * (f - k)).max(0.0);
    ensure!(
        black_price >= intrinsic - accuracy,
        "{option_type} premium ({black_price}) lower than intrinsic value ({intrinsic})"
    );
    let upper = match option_type {
        OptionType::Call => discount * f,
        OptionType::Put => discount * k,
    };
    ensure!(
        black_price < upper,
        "{option_type} premium ({black_price}) not below its upper bound ({upper})"
    );
    if black_price <= intrinsic {
        return Ok(0.0);
    }

    let objective =
        |sd: Real| black_formula(option_type, strike, forward, sd, discount, displacement)
            .map(|p| p - black_price);
    let mut hi = 1.0;
    while objective(hi)? < 0.0 {
        hi *= 2.0;
        if hi > 1.0e3 {
            return Err(Error::NotConverged(format!(
                "cannot bracket implied std dev for {option_type} premium {black_price}"
            )));
        }
    }
    brent(objective, 0.0, hi, accuracy, max_evaluations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn put_call_parity() {
        let (k, f, sd, df) = (100.0, 105.0, 0.2, 0.95);
        let call = black_formula(OptionType::Call, k, f, sd, df, 0.0).unwrap();
        let put = black_formula(OptionType::Put, k, f, sd, df, 0.0).unwrap();
        assert_abs_diff_eq!(call - put, df * (f - k), epsilon = 1e-12);
    }

    #[test]
    fn known_black_value() {
        // F = K = 100, sd = 0.2, D = 1: 100 * (2 N(0.1) - 1)
        let call = black_formula(OptionType::Call, 100.0, 100.0, 0.2, 1.0, 0.0).unwrap();
        assert_abs_diff_eq!(call, 7.965_567_455_405_804, epsilon = 1e-10);
    }

    #[test]
    fn zero_std_dev_is_intrinsic() {
        let call = black_formula(OptionType::Call, 90.0, 100.0, 0.0, 0.9, 0.0).unwrap();
        assert_abs_diff_eq!(call, 9.0, epsilon = 1e-12);
        assert!(black_formula(OptionType::Call, 90.0, -1.0, 0.2, 0.9, 0.0).is_err());
    }

    #[test]
    fn vega_matches_finite_difference() {
        let h = 1e-6;
        let up = black_formula(OptionType::Call, 0.03, 0.035, 0.2 + h, 0.97, 0.0).unwrap();
        let down = black_formula(OptionType::Call, 0.03, 0.035, 0.2 - h, 0.97, 0.0).unwrap();
        let analytic = black_formula_std_dev_derivative(0.03, 0.035, 0.2, 0.97, 0.0).unwrap();
        assert_abs_diff_eq!(analytic, (up - down) / (2.0 * h), epsilon = 1e-8);
    }

    #[test]
    fn implied_std_dev_round_trip() {
        for (option_type, k) in [(OptionType::Call, 0.025), (OptionType::Put, 0.04)] {
            let price = black_formula(option_type, k, 0.03, 0.35, 0.9, 0.0).unwrap();
            let sd = black_formula_implied_std_dev(option_type, k, 0.03, price, 0.9, 0.0, 1e-12, 100)
                .unwrap();
            assert_abs_diff_eq!(sd, 0.35, epsilon = 1e-8);
        }
    }

    #[test]
    fn implied_std_dev_rejects_arbitrage() {
        let below_intrinsic =
            black_formula_implied_std_dev(OptionType::Call, 90.0, 100.0, 5.0, 1.0, 0.0, 1e-10, 100);
        assert!(matches!(below_intrinsic, Err(Error::Precondition(_))));
    }

    #[test]
    fn bachelier_atm() {
        let atm = bachelier_formula(OptionType::Call, 0.02, 0.02, 0.01, 1.0).unwrap();
        assert_abs_diff_eq!(atm, 0.01 * normal_pdf(0.0), epsilon = 1e-15);
    }
}
