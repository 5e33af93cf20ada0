//! # ql-quotes
//!
//! Market quotes: the mutable leaves of the dependency graph and the quotes
//! derived from them.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// `Quote` trait and concrete implementations.
pub mod quote;

pub use quote::{quote_handle, CompositeQuote, DerivedQuote, Quote, QuoteHandleExt, SimpleQuote};
