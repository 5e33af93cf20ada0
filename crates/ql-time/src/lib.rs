//! # ql-time
//!
//! Dates, periods, day counters, calendars, interest-rate conventions and
//! the per-session [`Settings`] that carries the evaluation date.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Business-day adjustment conventions.
pub mod business_day_convention;

/// Holiday-free business-day calendars.
pub mod calendar;

/// `Date` type.
pub mod date;

/// Day-count conventions.
pub mod day_counter;

/// Payment / compounding frequency.
pub mod frequency;

/// `InterestRate` and `Compounding`.
pub mod interest_rate;

/// `Period` — a time span in a `TimeUnit`.
pub mod period;

/// Evaluation-date context.
pub mod settings;

/// `TimeUnit` — days, weeks, months, years.
pub mod time_unit;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use business_day_convention::BusinessDayConvention;
pub use calendar::Calendar;
pub use date::Date;
pub use day_counter::DayCounter;
pub use frequency::Frequency;
pub use interest_rate::{Compounding, InterestRate};
pub use period::Period;
pub use settings::{ScopedEvaluationDate, Settings};
pub use time_unit::TimeUnit;
