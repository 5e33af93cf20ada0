//! # ql-core
//!
//! Core types, traits, and error definitions for qlgraph.
//!
//! This crate provides the foundational building blocks shared across all
//! other crates in the workspace – type aliases, the error taxonomy, the
//! Observer/Observable notification graph, the `LazyObject` recalculation
//! state machine, and the `Handle` / `RelinkableHandle` indirection layer.
//!
//! The graph is single-threaded: it is built on `Rc`, `Weak` and `Cell`, so
//! none of its types cross thread boundaries.  Pricing on several threads
//! means building one graph per thread.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Public modules ───────────────────────────────────────────────────────────

/// Error types and the `ensure!` / `fail!` / `ensure_post!` macros.
pub mod errors;

/// Shared relinkable references (`Handle<T>`, `RelinkableHandle<T>`).
pub mod handle;

/// Design patterns: observable, lazy_object.
pub mod patterns;

// ── Primitive type aliases ────────────────────────────────────────────────────

/// Floating-point type used throughout the library.
pub type Real = f64;

/// Integer type used for general-purpose counting.
pub type Integer = i32;

/// Non-negative integer type.
pub type Natural = u32;

/// Alias used for array sizes / indices.
pub type Size = usize;

/// A rate expressed as a decimal (e.g. 0.05 = 5 %).
pub type Rate = Real;

/// A spread over a reference rate.
pub type Spread = Real;

/// A discount factor in [0, 1].
pub type DiscountFactor = Real;

/// A price or value.
pub type Price = Real;

/// A volatility level expressed as a decimal.
pub type Volatility = Real;

/// A time measurement in years.
pub type Time = Real;

// ── Re-exports for convenience ────────────────────────────────────────────────

pub use errors::{Error, Result};
pub use handle::{Handle, RelinkableHandle};
pub use patterns::lazy_object::{Freshness, LazyObject, LazyState};
pub use patterns::observable::{
    register_with, unregister_with, Observable, ObservableImpl, Observer,
};
