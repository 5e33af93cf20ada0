//! Error types for qlgraph.
//!
//! Every failure in the library surfaces synchronously to the direct caller
//! as one of the variants below.  The macros `ensure!`, `ensure_post!` and
//! `fail!` cover the common precondition / postcondition / runtime cases.

use thiserror::Error;

/// The top-level error type used throughout qlgraph.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error (raised by `fail!`).
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated: bad input detected at the call boundary.
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated.
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// A required dependency is unset: empty handle, missing pricing engine,
    /// unbound term structure or invalid quote.
    #[error("{0} not set")]
    NotSet(String),

    /// A query fell outside the supported domain and extrapolation was not
    /// enabled.
    #[error("extrapolation not allowed: {0}")]
    Extrapolation(String),

    /// An iterative routine exhausted its evaluation budget.
    #[error("did not converge: {0}")]
    NotConverged(String),

    /// Date-related error.
    #[error("date error: {0}")]
    Date(String),
}

impl Error {
    /// Return `true` for failures a calibration may recover from by skipping
    /// the offending helper.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::NotConverged(_) | Error::Extrapolation(_))
    }

    /// Prefix the message with `context`, keeping the kind.
    ///
    /// `NotSet` names the missing dependency and is returned unchanged.
    pub fn context(self, context: impl std::fmt::Display) -> Self {
        match self {
            Error::Runtime(m) => Error::Runtime(format!("{context}: {m}")),
            Error::Precondition(m) => Error::Precondition(format!("{context}: {m}")),
            Error::Postcondition(m) => Error::Postcondition(format!("{context}: {m}")),
            Error::Extrapolation(m) => Error::Extrapolation(format!("{context}: {m}")),
            Error::NotConverged(m) => Error::NotConverged(format!("{context}: {m}")),
            Error::Date(m) => Error::Date(format!("{context}: {m}")),
            not_set @ Error::NotSet(_) => not_set,
        }
    }
}

/// Shorthand `Result` type used throughout qlgraph.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ql_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(matches!(positive(-1.0), Err(Error::Precondition(_))));
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure_post, errors::Error};
/// fn compute(x: f64) -> ql_core::errors::Result<f64> {
///     let result = x * 2.0;
///     ensure_post!(result > 0.0, "result must be positive, got {result}");
///     Ok(result)
/// }
/// assert!(compute(1.0).is_ok());
/// assert!(compute(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ql_core::{fail, errors::Error};
/// fn always_err() -> ql_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}
