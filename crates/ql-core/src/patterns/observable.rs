//! Observer / Observable notification graph.
//!
//! * An **Observable** notifies its registered **Observer**s whenever it
//!   changes state.
//! * Observers react in `update()`; an observer that is itself observable
//!   (a lazy object, a handle link, a forwarding quote) invalidates locally
//!   and then notifies its own observers, so a change propagates through any
//!   number of hops without polling.
//!
//! Observables hold `Weak` references only: registering never keeps an
//! observer alive.  All methods take `&self`; the observer list lives behind
//! a `RefCell`.

use crate::errors::{Error, Result};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// An object that reacts to changes in the [`Observable`]s it is registered
/// with.
pub trait Observer {
    /// Called by every observable this observer is registered with when that
    /// observable changes state.
    ///
    /// An error does not stop the broadcast; it is reported to whoever
    /// triggered the notification once every observer has been called.
    fn update(&self) -> Result<()>;
}

/// An object that can notify interested parties when it changes.
///
/// Implementors only expose their [`ObservableImpl`]; registration and
/// notification are provided.
pub trait Observable {
    /// The observer list backing this observable.
    fn observable_impl(&self) -> &ObservableImpl;

    /// Register an observer to receive future change notifications.
    ///
    /// Idempotent: returns `false` if the observer was already registered.
    fn register_observer(&self, observer: Weak<dyn Observer>) -> bool {
        self.observable_impl().register(observer)
    }

    /// Remove a previously registered observer.  No-op if absent.
    fn unregister_observer(&self, observer: &Weak<dyn Observer>) -> bool {
        self.observable_impl().unregister(observer)
    }

    /// Notify all currently registered observers that this object has changed.
    fn notify_observers(&self) -> Result<()> {
        self.observable_impl().notify()
    }
}

/// Register `observer` with `observable` (QuantLib's `registerWith`).
pub fn register_with<O, S>(observer: &Rc<O>, observable: &S) -> bool
where
    O: Observer + 'static,
    S: Observable + ?Sized,
{
    let weak = Rc::downgrade(observer);
    let weak: Weak<dyn Observer> = weak;
    observable.register_observer(weak)
}

/// Unregister `observer` from `observable` (QuantLib's `unregisterWith`).
pub fn unregister_with<O, S>(observer: &Rc<O>, observable: &S) -> bool
where
    O: Observer + 'static,
    S: Observable + ?Sized,
{
    let weak = Rc::downgrade(observer);
    let weak: Weak<dyn Observer> = weak;
    observable.unregister_observer(&weak)
}

fn same_observer(a: &Weak<dyn Observer>, b: &Weak<dyn Observer>) -> bool {
    // Compare allocation addresses only; vtable pointers may differ.
    a.as_ptr() as *const () == b.as_ptr() as *const ()
}

/// The standard observer-list management, embedded by every observable type.
#[derive(Default)]
pub struct ObservableImpl {
    observers: RefCell<Vec<Weak<dyn Observer>>>,
}

impl std::fmt::Debug for ObservableImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableImpl")
            .field("observers", &self.len())
            .finish()
    }
}

impl ObservableImpl {
    /// Create a new, empty observable implementation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer.  Returns `false` if it was already present.
    pub fn register(&self, observer: Weak<dyn Observer>) -> bool {
        let mut list = self.observers.borrow_mut();
        list.retain(|o| o.strong_count() > 0);
        if list.iter().any(|o| same_observer(o, &observer)) {
            return false;
        }
        list.push(observer);
        true
    }

    /// Remove an observer by identity.  Returns `false` if it was absent.
    pub fn unregister(&self, observer: &Weak<dyn Observer>) -> bool {
        let mut list = self.observers.borrow_mut();
        let before = list.len();
        list.retain(|o| !same_observer(o, observer));
        list.len() != before
    }

    /// Number of live registered observers.
    pub fn len(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|o| o.strong_count() > 0)
            .count()
    }

    /// Return `true` if no live observer is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notify every live observer once.
    ///
    /// The list is snapshotted before any `update()` runs, so observers may
    /// register, unregister or notify re-entrantly.  Every observer is called
    /// even if an earlier one fails; the first failure is returned afterwards.
    pub fn notify(&self) -> Result<()> {
        let observers: Vec<Rc<dyn Observer>> = {
            let mut list = self.observers.borrow_mut();
            list.retain(|o| o.strong_count() > 0);
            list.iter().filter_map(Weak::upgrade).collect()
        };
        let mut first_error: Option<Error> = None;
        for observer in observers {
            if let Err(e) = observer.update() {
                tracing::warn!(error = %e, "observer update failed during notification");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
