//! Standard normal distribution, backed by `statrs`' error functions.

use ql_core::{ensure, errors::Result, Real};
use statrs::function::erf::{erfc, erfc_inv};
use std::f64::consts::{FRAC_1_SQRT_2, PI, SQRT_2};

/// The standard normal probability density `φ(x) = exp(-x²/2) / √(2π)`.
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// The standard normal cumulative distribution `Φ(x)`.
///
/// Computed as `erfc(-x/√2) / 2`, which keeps full relative accuracy in the
/// left tail.
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}

/// The inverse of [`normal_cdf`].
///
/// # Errors
/// [`Error::Precondition`](ql_core::Error::Precondition) unless `0 < p < 1`.
pub fn normal_cdf_inverse(p: Real) -> Result<Real> {
    ensure!(p > 0.0 && p < 1.0, "probability {p} outside (0, 1)");
    Ok(-SQRT_2 * erfc_inv(2.0 * p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn pdf_and_cdf_at_zero() {
        assert_abs_diff_eq!(normal_pdf(0.0), 1.0 / (2.0 * PI).sqrt(), epsilon = 1e-15);
        assert_abs_diff_eq!(normal_cdf(0.0), 0.5, epsilon = 1e-15);
    }

    // statrs' erfc is good to about 1e-11 absolute.
    const ERFC_TOLERANCE: Real = 1e-10;

    #[test]
    fn known_values() {
        assert_abs_diff_eq!(normal_cdf(1.0), 0.841_344_746_068_543, epsilon = ERFC_TOLERANCE);
        assert_abs_diff_eq!(
            normal_cdf(-1.959_963_984_540_054),
            0.025,
            epsilon = ERFC_TOLERANCE
        );
        assert!(normal_cdf(-10.0) > 0.0 && normal_cdf(-10.0) < 1e-20);
    }

    #[test]
    fn inverse_round_trip() {
        for p in [1e-6, 0.01, 0.25, 0.5, 0.9, 0.999] {
            let x = normal_cdf_inverse(p).unwrap();
            assert_abs_diff_eq!(normal_cdf(x), p, epsilon = ERFC_TOLERANCE);
        }
        assert!(normal_cdf_inverse(1.0).is_err());
    }
}
