//! # ql-models
//!
//! Calibratable models and the helpers that tie them to market quotes.
//!
//! ## Trait hierarchy
//!
//! ```text
//! CalibratedModel
//! └── ShortRateModel → HullWhite
//!
//! CalibrationHelper
//! └── BlackCalibrationHelper → CapletHelper
//! ```
//!
//! A model is observable: writing its parameters notifies the engines
//! priced off it, which invalidates the instruments held by the helpers.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Infrastructure ───────────────────────────────────────────────────────
pub mod calibrated_model;
pub mod calibration_helper;
pub mod short_rate_model;

// ── Models ───────────────────────────────────────────────────────────────
pub mod hull_white_model;

// ── Helpers ──────────────────────────────────────────────────────────────
pub mod caplet_helper;

// ── Re-exports ───────────────────────────────────────────────────────────
pub use calibrated_model::{CalibratedModel, ModelConstraint, ModelState, Parameter};
pub use calibration_helper::{
    calibration_objective, BlackCalibrationHelper, CalibrationErrorType, CalibrationHelper,
    CALIBRATION_PENALTY, RELATIVE_ERROR_FLOOR,
};
pub use caplet_helper::CapletHelper;
pub use hull_white_model::HullWhite;
pub use ql_math::{BoundaryConstraint, Constraint, NoConstraint, PositiveConstraint};
pub use short_rate_model::ShortRateModel;
