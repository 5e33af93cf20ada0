//! # ql-termstructures
//!
//! Yield curves and volatility structures wired into the observer graph:
//! immutable base curves, lazily re-evaluated composed structures (spreads,
//! implied and proxy curves) and a bootstrapped piecewise curve driven by
//! rate helpers.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `TermStructure` — base trait, reference-date core and extrapolation flag.
pub mod term_structure;

/// `YieldTermStructure` — discount, zero and forward queries.
pub mod yield_term_structure;

/// `FlatForward` — constant-rate yield curve.
pub mod flat_forward;

/// `InterpolatedZeroCurve` — zero-rate interpolated yield curve.
pub mod interpolated_zero_curve;

/// `ForwardSpreadedTermStructure` — original curve plus a forward spread.
pub mod forward_spreaded_term_structure;

/// `ZeroSpreadedTermStructure` — original curve plus a zero-rate spread.
pub mod zero_spreaded_term_structure;

/// `PiecewiseZeroSpreadedTermStructure` — interpolated zero spreads on pillar dates.
pub mod piecewise_zero_spreaded_term_structure;

/// `ImpliedTermStructure` — a curve seen from a later reference date.
pub mod implied_term_structure;

/// `ProxyYieldTermStructure` — pure delegation to another curve.
pub mod proxy_yield_term_structure;

/// `VolatilityTermStructure` — base trait for volatility structures.
pub mod volatility_term_structure;

/// `BlackVolTermStructure` — Black volatilities and `BlackConstantVol`.
pub mod black_vol_term_structure;

/// `BlackVarianceCurve` — variance interpolated between expiry pillars.
pub mod black_variance_curve;

/// `ImpliedVolTermStructure` — Black volatilities from a later reference date.
pub mod implied_vol_term_structure;

/// `OptionletVolatilityStructure` — caplet/floorlet volatilities.
pub mod optionlet_volatility_structure;

/// `SwaptionVolatilityStructure` — swaption volatilities by expiry and tenor.
pub mod swaption_volatility_structure;

/// `SpreadedOptionletVolatility` — optionlet volatilities plus a spread.
pub mod spreaded_optionlet_volatility;

/// `SpreadedSwaptionVolatility` — swaption volatilities plus a spread.
pub mod spreaded_swaption_volatility;

/// `SmileSection` — volatility smile at a single expiry.
pub mod smile_section;

/// Rate helpers — market instruments a curve is bootstrapped on.
pub mod rate_helpers;

/// `PiecewiseYieldCurve` — zero curve bootstrapped on rate helpers.
pub mod piecewise_yield_curve;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use black_variance_curve::BlackVarianceCurve;
pub use black_vol_term_structure::{BlackConstantVol, BlackVolTermStructure};
pub use flat_forward::FlatForward;
pub use forward_spreaded_term_structure::ForwardSpreadedTermStructure;
pub use implied_term_structure::ImpliedTermStructure;
pub use implied_vol_term_structure::ImpliedVolTermStructure;
pub use interpolated_zero_curve::InterpolatedZeroCurve;
pub use optionlet_volatility_structure::{
    ConstantOptionletVolatility, OptionletVolatilityStructure,
};
pub use piecewise_yield_curve::PiecewiseYieldCurve;
pub use piecewise_zero_spreaded_term_structure::PiecewiseZeroSpreadedTermStructure;
pub use proxy_yield_term_structure::ProxyYieldTermStructure;
pub use rate_helpers::{DepositRateHelper, FraRateHelper, RateHelper, SwapRateHelper};
pub use smile_section::{FlatSmileSection, SmileSection, SpreadedSmileSection, VolatilityType};
pub use spreaded_optionlet_volatility::SpreadedOptionletVolatility;
pub use spreaded_swaption_volatility::SpreadedSwaptionVolatility;
pub use swaption_volatility_structure::{ConstantSwaptionVolatility, SwaptionVolatilityStructure};
pub use term_structure::{Extrapolator, TermStructure, TermStructureCore};
pub use volatility_term_structure::VolatilityTermStructure;
pub use yield_term_structure::YieldTermStructure;
pub use zero_spreaded_term_structure::ZeroSpreadedTermStructure;
