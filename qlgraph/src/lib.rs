//! # qlgraph
//!
//! A lazy observer-graph pricing core: quotes, relinkable handles,
//! composable term structures, instruments with pluggable engines and
//! calibration helpers, all wired through one notification mechanism.
//!
//! This crate is a **façade** that re-exports the public items of the
//! workspace crates. Application code should depend on this crate rather
//! than the individual `ql-*` crates.
//!
//! ## Quick start
//!
//! ```rust
//! use std::rc::Rc;
//! use qlgraph::prelude::*;
//!
//! let today = Date::from_ymd(2024, 1, 15).unwrap();
//! let rate = Rc::new(SimpleQuote::new(0.03));
//! let curve: Rc<dyn YieldTermStructure> = FlatForward::new(
//!     today,
//!     quote_handle(&rate),
//!     DayCounter::Actual365Fixed,
//!     Compounding::Continuous,
//!     Frequency::Annual,
//! );
//! let curve = RelinkableHandle::new(curve);
//!
//! let settings = Rc::new(Settings::with_evaluation_date(today));
//! let bond = ZeroCouponBond::new(0, Calendar::NullCalendar, 100.0, today + 365, settings).unwrap();
//! bond.set_pricing_engine(DiscountingBondEngine::new(curve.handle())).unwrap();
//!
//! let before = bond.npv().unwrap();
//! rate.set_value(0.04).unwrap();
//! assert!(!bond.is_calculated());
//! assert!(bond.npv().unwrap() < before);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, errors, the observer graph, lazy objects and handles.
pub use ql_core as core;

/// Dates, calendars, day counters and the evaluation-date context.
pub use ql_time as time;

/// Mathematical utilities: interpolation, solvers, Black formulas, optimisation.
pub use ql_math as math;

/// Market quotes.
pub use ql_quotes as quotes;

/// Term structure implementations.
pub use ql_termstructures as termstructures;

/// Financial instruments.
pub use ql_instruments as instruments;

/// Calibratable models and calibration helpers.
pub use ql_models as models;

/// Pricing engines.
pub use ql_pricingengines as pricingengines;

/// The types most pricing sessions need.
pub mod prelude {
    pub use ql_core::{
        register_with, unregister_with, Error, Freshness, Handle, LazyObject, Observable,
        Observer, RelinkableHandle, Result,
    };
    pub use ql_instruments::{
        CapFloorType, Caplet, EuropeanOption, Instrument, OptionType, PricingEngine,
        ZeroCouponBond,
    };
    pub use ql_math::{EndCriteria, LevenbergMarquardt, Simplex};
    pub use ql_models::{
        calibration_objective, BlackCalibrationHelper, CalibratedModel, CalibrationErrorType,
        CalibrationHelper, CapletHelper, HullWhite, ShortRateModel,
    };
    pub use ql_pricingengines::{
        AnalyticEuropeanEngine, AnalyticHullWhiteCapletEngine, BlackCapletEngine,
        DiscountingBondEngine,
    };
    pub use ql_quotes::{quote_handle, Quote, QuoteHandleExt, SimpleQuote};
    pub use ql_termstructures::{
        BlackConstantVol, BlackVolTermStructure, FlatForward, ForwardSpreadedTermStructure,
        ImpliedTermStructure, OptionletVolatilityStructure, PiecewiseYieldCurve,
        PiecewiseZeroSpreadedTermStructure, ProxyYieldTermStructure, RateHelper, TermStructure,
        YieldTermStructure, ZeroSpreadedTermStructure,
    };
    pub use ql_time::{
        BusinessDayConvention, Calendar, Compounding, Date, DayCounter, Frequency, Period,
        Settings, TimeUnit,
    };
}
