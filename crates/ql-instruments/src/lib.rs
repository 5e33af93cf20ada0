//! # ql-instruments
//!
//! Priced products: the `Instrument` lazy object, the `PricingEngine` seam
//! and the concrete European option, zero-coupon bond and caplet.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod caplet;
pub mod european_option;
pub mod instrument;
pub mod payoff;
pub mod zero_coupon_bond;

pub use caplet::{CapFloorType, Caplet, CapletArguments};
pub use european_option::{EuropeanOption, EuropeanOptionArguments};
pub use instrument::{has_occurred, Instrument, InstrumentCore, PricingEngine, PricingResults};
pub use payoff::{OptionType, Payoff, PlainVanillaPayoff};
pub use zero_coupon_bond::{ZeroCouponBond, ZeroCouponBondArguments};
