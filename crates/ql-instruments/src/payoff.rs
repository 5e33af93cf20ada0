//! Option payoffs.

use ql_core::Real;
use std::fmt;

pub use ql_math::OptionType;

/// Terminal payoff of an option as a function of the underlying price.
pub trait Payoff: fmt::Debug {
    /// Compute the payoff given the underlying price at expiry.
    fn value(&self, price: Real) -> Real;

    /// Human-readable name.
    fn name(&self) -> &str;
}

/// Standard "plain vanilla" payoff.
///
/// `payoff = max(φ(S − K), 0)` where `φ = +1` for Call, `−1` for Put.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlainVanillaPayoff {
    /// Option type.
    pub option_type: OptionType,
    /// Strike price.
    pub strike: Real,
}

impl PlainVanillaPayoff {
    /// Create a new plain vanilla payoff.
    pub fn new(option_type: OptionType, strike: Real) -> Self {
        Self {
            option_type,
            strike,
        }
    }
}

impl Payoff for PlainVanillaPayoff {
    fn value(&self, price: Real) -> Real {
        (self.option_type.sign() * (price - self.strike)).max(0.0)
    }

    fn name(&self) -> &str {
        "Vanilla"
    }
}

impl fmt::Display for PlainVanillaPayoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} @ {}", self.name(), self.option_type, self.strike)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vanilla_payoff() {
        let call = PlainVanillaPayoff::new(OptionType::Call, 100.0);
        let put = PlainVanillaPayoff::new(OptionType::Put, 100.0);
        assert_eq!(call.value(110.0), 10.0);
        assert_eq!(call.value(90.0), 0.0);
        assert_eq!(put.value(90.0), 10.0);
        assert_eq!(put.value(110.0), 0.0);
        assert_eq!(call.to_string(), "Vanilla Call @ 100");
    }

    proptest::proptest! {
        #[test]
        fn call_minus_put_is_forward(s in 0.0f64..500.0, k in 0.0f64..500.0) {
            let call = PlainVanillaPayoff::new(OptionType::Call, k).value(s);
            let put = PlainVanillaPayoff::new(OptionType::Put, k).value(s);
            approx::assert_abs_diff_eq!(call - put, s - k, epsilon = 1e-12);
        }
    }
}
