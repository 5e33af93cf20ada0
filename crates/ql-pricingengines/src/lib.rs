//! # ql-pricingengines
//!
//! Pricing engines.  Each engine observes the handles and models it reads
//! and forwards their notifications to the instruments it is attached to.
//!
//! ## Engines
//!
//! - [`AnalyticEuropeanEngine`] — Black-Scholes-Merton closed form for European options
//! - [`DiscountingBondEngine`] — discounted redemption for zero-coupon bonds
//! - [`BlackCapletEngine`] — Black/Bachelier caplets off an optionlet surface
//! - [`AnalyticHullWhiteCapletEngine`] — caplets as zero-bond options under a short-rate model

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytic_european_engine;
pub mod analytic_hull_white_caplet_engine;
pub mod black_caplet_engine;
pub mod discounting_bond_engine;

pub use analytic_european_engine::{black_scholes_merton, AnalyticEuropeanEngine, BlackScholesGreeks};
pub use analytic_hull_white_caplet_engine::AnalyticHullWhiteCapletEngine;
pub use black_caplet_engine::BlackCapletEngine;
pub use discounting_bond_engine::DiscountingBondEngine;
