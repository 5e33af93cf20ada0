//! # ql-math
//!
//! Numerical building blocks: interpolation, 1-D root finding, the normal
//! distribution (via `statrs`), Black/Bachelier formulas, and least-squares
//! optimisation over `nalgebra` vectors.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Black and Bachelier option formulas.
pub mod black_formula;

/// Probability distributions.
pub mod distributions;

/// 1D interpolation schemes.
pub mod interpolations;

/// Least-squares optimisation.
pub mod optimization;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use black_formula::{
    bachelier_formula, black_formula, black_formula_implied_std_dev,
    black_formula_std_dev_derivative, OptionType,
};
pub use distributions::{normal_cdf, normal_cdf_inverse, normal_pdf};
pub use interpolations::{Interpolation, Interpolator};
pub use optimization::{
    Array, BoundaryConstraint, Constraint, CostFunction, EndCriteria, EndCriteriaType,
    LevenbergMarquardt, NoConstraint, OptimizationMethod, OptimizationResult,
    PositiveConstraint, Simplex,
};
