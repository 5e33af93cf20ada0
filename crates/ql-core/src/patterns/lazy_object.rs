//! LazyObject pattern: cached results recomputed on demand.
//!
//! A `LazyObject` is both an [`Observer`](super::observable::Observer) and an
//! [`Observable`].  It caches the outcome of an expensive computation and
//! recalculates only when
//!
//! 1. it has been invalidated by an upstream notification, **and**
//! 2. one of its results is requested again.
//!
//! The caching uses interior mutability (`Cell`) so that the calculation can
//! be triggered through `&self`.
//!
//! ```text
//! NeverCalculated ──calculate()──▶ Fresh ──update()──▶ Stale
//!        ▲                           ▲                   │
//!        └── calculate() failed      └──calculate()──────┘
//! ```

use super::observable::{Observable, ObservableImpl};
use crate::errors::{Error, Result};
use std::cell::{Cell, RefCell};

/// Freshness of a lazy object's cached results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Freshness {
    /// No calculation has succeeded yet.
    NeverCalculated,
    /// A result exists but an upstream input changed since.
    Stale,
    /// The cached result reflects the current upstream state.
    Fresh,
}

/// Bookkeeping shared by every [`LazyObject`].
///
/// Embed one in your struct and return it from
/// [`LazyObject::lazy_state`].  It also owns the object's observer list.
#[derive(Debug)]
pub struct LazyState {
    freshness: Cell<Freshness>,
    frozen: Cell<bool>,
    updating: Cell<bool>,
    always_forward: Cell<bool>,
    cache_errors: Cell<bool>,
    cached_error: RefCell<Option<Error>>,
    observers: ObservableImpl,
}

impl LazyState {
    /// Create a new `LazyState` that has never been calculated.
    pub fn new() -> Self {
        Self {
            freshness: Cell::new(Freshness::NeverCalculated),
            frozen: Cell::new(false),
            updating: Cell::new(false),
            always_forward: Cell::new(false),
            cache_errors: Cell::new(false),
            cached_error: RefCell::new(None),
            observers: ObservableImpl::new(),
        }
    }

    /// Memoise calculation failures: a failed calculation keeps returning
    /// the same error, without recomputing, until an upstream notification
    /// arrives.
    pub fn with_error_caching(self) -> Self {
        self.cache_errors.set(true);
        self
    }

    /// Current freshness.
    pub fn freshness(&self) -> Freshness {
        self.freshness.get()
    }

    /// The observer list of the owning object.
    pub fn observers(&self) -> &ObservableImpl {
        &self.observers
    }

    /// Return `true` if updates are currently suppressed.
    pub fn is_frozen(&self) -> bool {
        self.frozen.get()
    }
}

impl Default for LazyState {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for objects that lazily compute and cache their results.
///
/// Implementors provide [`lazy_state`](Self::lazy_state) and
/// [`perform_calculations`](Self::perform_calculations), return
/// `lazy_state().observers()` from `Observable::observable_impl`, and route
/// `Observer::update` to [`lazy_update`](Self::lazy_update).
///
/// # Example
/// ```
/// use std::cell::Cell;
/// use ql_core::{LazyObject, LazyState, Observable, ObservableImpl};
///
/// struct Doubler {
///     lazy: LazyState,
///     input: Cell<f64>,
///     result: Cell<f64>,
/// }
///
/// impl Observable for Doubler {
///     fn observable_impl(&self) -> &ObservableImpl {
///         self.lazy.observers()
///     }
/// }
///
/// impl LazyObject for Doubler {
///     fn lazy_state(&self) -> &LazyState {
///         &self.lazy
///     }
///     fn perform_calculations(&self) -> ql_core::Result<()> {
///         self.result.set(2.0 * self.input.get());
///         Ok(())
///     }
/// }
///
/// let d = Doubler { lazy: LazyState::new(), input: Cell::new(21.0), result: Cell::new(0.0) };
/// d.calculate().unwrap();
/// assert_eq!(d.result.get(), 42.0);
/// ```
pub trait LazyObject: Observable {
    /// The bookkeeping state embedded in the implementor.
    fn lazy_state(&self) -> &LazyState;

    /// Perform the actual (expensive) calculation.
    ///
    /// Must read upstream values through the object's handles at call time.
    fn perform_calculations(&self) -> Result<()>;

    /// Ensure results are up-to-date.
    ///
    /// A frozen object that has a result keeps it.  On failure the previous
    /// freshness is restored, so the next call tries again.
    fn calculate(&self) -> Result<()> {
        let state = self.lazy_state();
        if let Some(e) = state.cached_error.borrow().as_ref() {
            return Err(e.clone());
        }
        let previous = state.freshness.get();
        if previous == Freshness::Fresh
            || (state.frozen.get() && previous != Freshness::NeverCalculated)
        {
            return Ok(());
        }
        // Marked fresh up front so that re-entrant reads made by
        // `perform_calculations` see the object as calculated.
        state.freshness.set(Freshness::Fresh);
        match self.perform_calculations() {
            Ok(()) => {
                tracing::trace!(?previous, "lazy object recalculated");
                Ok(())
            }
            Err(e) => {
                state.freshness.set(previous);
                if state.cache_errors.get() {
                    *state.cached_error.borrow_mut() = Some(e.clone());
                }
                tracing::debug!(error = %e, "lazy recalculation failed");
                Err(e)
            }
        }
    }

    /// React to an upstream notification.
    ///
    /// A fresh object goes stale and forwards the notification once; further
    /// notifications while stale are absorbed, which bounds cascades through
    /// diamonds and cycles.  Frozen objects do not forward.
    fn lazy_update(&self) -> Result<()> {
        let state = self.lazy_state();
        if state.updating.replace(true) {
            return Ok(());
        }
        state.cached_error.borrow_mut().take();
        let was_fresh = state.freshness.get() == Freshness::Fresh;
        let result = if was_fresh || state.always_forward.get() {
            if was_fresh {
                state.freshness.set(Freshness::Stale);
            }
            if state.frozen.get() {
                Ok(())
            } else {
                self.notify_observers()
            }
        } else {
            Ok(())
        };
        state.updating.set(false);
        result
    }

    /// Force an immediate recalculation and notify observers.
    ///
    /// Works even while frozen; the frozen flag is restored afterwards.
    fn recalculate(&self) -> Result<()> {
        let state = self.lazy_state();
        let was_frozen = state.frozen.replace(false);
        state.cached_error.borrow_mut().take();
        if state.freshness.get() == Freshness::Fresh {
            state.freshness.set(Freshness::Stale);
        }
        let calculated = self.calculate();
        state.frozen.set(was_frozen);
        let notified = self.notify_observers();
        calculated.and(notified)
    }

    /// Suppress recalculation and notification forwarding until
    /// [`unfreeze`](Self::unfreeze) is called.
    fn freeze(&self) {
        self.lazy_state().frozen.set(true);
    }

    /// Resume normal operation; observers are notified once in case a change
    /// arrived while frozen.
    fn unfreeze(&self) -> Result<()> {
        if self.lazy_state().frozen.replace(false) {
            self.notify_observers()
        } else {
            Ok(())
        }
    }

    /// Forward every upstream notification, even while already stale.
    fn always_forward_notifications(&self) {
        self.lazy_state().always_forward.set(true);
    }

    /// Return `true` if the cache is currently valid.
    fn is_calculated(&self) -> bool {
        self.lazy_state().freshness.get() == Freshness::Fresh
    }

    /// Current freshness of the cache.
    fn freshness(&self) -> Freshness {
        self.lazy_state().freshness.get()
    }

    /// Return `true` if recalculation is currently suppressed.
    fn is_frozen(&self) -> bool {
        self.lazy_state().frozen.get()
    }
}
