//! `Handle<T>` — a shared, relinkable, observable reference.
//!
//! Two concerns are kept apart:
//!
//! * **shared lifetime** is plain `Rc<T>`: the target lives as long as any
//!   handle (or anyone else) holds it;
//! * **relinkable indirection** is a [`Link`], an intermediate node that
//!   observes the current target and forwards its notifications.  Every clone
//!   of a handle shares the same link, so relinking through a
//!   [`RelinkableHandle`] is seen by all of them.
//!
//! | QuantLib | Rust |
//! |-----|------|
//! | `Handle<T>` | `Handle<T>` (shared `Rc<Link<T>>`, read-only) |
//! | `RelinkableHandle<T>` | `RelinkableHandle<T>` (same link, plus `link_to`) |

use crate::errors::{Error, Result};
use crate::patterns::observable::{Observable, ObservableImpl, Observer};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

fn same_target<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}

/// The indirection node shared by all clones of a handle.
pub struct Link<T: ?Sized> {
    current: RefCell<Option<Rc<T>>>,
    is_observer: Cell<bool>,
    observers: ObservableImpl,
    this: Weak<Link<T>>,
}

impl<T: ?Sized + Observable + 'static> Link<T> {
    fn new(target: Option<Rc<T>>, register_as_observer: bool) -> Rc<Self> {
        let link = Rc::new_cyclic(|this| Link {
            current: RefCell::new(None),
            is_observer: Cell::new(false),
            observers: ObservableImpl::new(),
            this: this.clone(),
        });
        link.attach(target, register_as_observer);
        link
    }

    fn as_observer(&self) -> Weak<dyn Observer> {
        let weak: Weak<dyn Observer> = self.this.clone();
        weak
    }

    /// Swap the target without notifying; returns `false` if nothing changed.
    fn attach(&self, target: Option<Rc<T>>, register_as_observer: bool) -> bool {
        let unchanged = match (self.current.borrow().as_ref(), target.as_ref()) {
            (Some(old), Some(new)) => same_target(old, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged && self.is_observer.get() == register_as_observer {
            return false;
        }
        let me = self.as_observer();
        let old = self.current.replace(target.clone());
        if let Some(old) = old {
            if self.is_observer.get() {
                old.unregister_observer(&me);
            }
        }
        self.is_observer.set(register_as_observer);
        if let Some(new) = target {
            if register_as_observer {
                new.register_observer(me);
            }
        }
        true
    }

    fn link_to(&self, target: Option<Rc<T>>, register_as_observer: bool) -> Result<()> {
        if !self.attach(target, register_as_observer) {
            return Ok(());
        }
        tracing::debug!(
            empty = self.current.borrow().is_none(),
            observers = self.observers.len(),
            "handle relinked"
        );
        self.observers.notify()
    }

    fn current(&self) -> Option<Rc<T>> {
        self.current.borrow().clone()
    }
}

impl<T: ?Sized + Observable + 'static> Observer for Link<T> {
    fn update(&self) -> Result<()> {
        self.observers.notify()
    }
}

impl<T: ?Sized> Observable for Link<T> {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observers
    }
}

/// A shared, optionally empty, observable reference to a `T`.
///
/// Observers registered with the handle are notified when the target
/// changes *and* when the handle is relinked to a different target.
/// Dereferencing an empty handle fails with [`Error::NotSet`].
pub struct Handle<T: ?Sized> {
    link: Rc<Link<T>>,
}

impl<T: ?Sized> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            link: Rc::clone(&self.link),
        }
    }
}

impl<T: ?Sized + Observable + 'static> Handle<T> {
    /// Create a handle observing `target`.
    pub fn new(target: Rc<T>) -> Self {
        Self::with_observation(target, true)
    }

    /// Create a handle; if `register_as_observer` is `false` the handle does
    /// not forward the target's notifications.
    pub fn with_observation(target: Rc<T>, register_as_observer: bool) -> Self {
        Self {
            link: Link::new(Some(target), register_as_observer),
        }
    }

    /// Create an empty handle.
    pub fn empty() -> Self {
        Self {
            link: Link::new(None, true),
        }
    }

    /// Return `true` if no target is linked.
    pub fn is_empty(&self) -> bool {
        self.link.current.borrow().is_none()
    }

    /// Return `true` if the handle forwards its target's notifications.
    pub fn is_observer(&self) -> bool {
        self.link.is_observer.get()
    }

    /// The current target.
    ///
    /// # Errors
    /// [`Error::NotSet`] if the handle is empty.
    pub fn current(&self) -> Result<Rc<T>> {
        self.link
            .current()
            .ok_or_else(|| Error::NotSet("empty handle: target".into()))
    }

    /// The current target, or `None` if the handle is empty.
    pub fn get(&self) -> Option<Rc<T>> {
        self.link.current()
    }
}

impl<T: ?Sized + Observable + 'static> Default for Handle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> Observable for Handle<T> {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.link.observers
    }
}

/// Handles are equal iff they point at the same target (or are both empty).
impl<T: ?Sized> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        match (
            self.link.current.borrow().as_ref(),
            other.link.current.borrow().as_ref(),
        ) {
            (Some(a), Some(b)) => same_target(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T: ?Sized> Eq for Handle<T> {}

impl<T: ?Sized> std::fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.link.current.borrow().as_ref() {
            Some(target) => write!(f, "Handle({:p})", Rc::as_ptr(target) as *const ()),
            None => write!(f, "Handle(empty)"),
        }
    }
}

/// A [`Handle`] whose target can be replaced at runtime.
///
/// Every `Handle` obtained from it (via `handle()` or deref + clone) sees
/// the relinked target.
pub struct RelinkableHandle<T: ?Sized> {
    handle: Handle<T>,
}

impl<T: ?Sized> Clone for RelinkableHandle<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
        }
    }
}

impl<T: ?Sized + Observable + 'static> RelinkableHandle<T> {
    /// Create a relinkable handle observing `target`.
    pub fn new(target: Rc<T>) -> Self {
        Self {
            handle: Handle::new(target),
        }
    }

    /// Create an empty relinkable handle.
    pub fn empty() -> Self {
        Self {
            handle: Handle::empty(),
        }
    }

    /// Point every sharing handle at `target` and notify their observers once.
    pub fn link_to(&self, target: Rc<T>) -> Result<()> {
        self.link_to_with(target, true)
    }

    /// Like [`link_to`](Self::link_to), choosing whether the target's own
    /// notifications are forwarded afterwards.
    pub fn link_to_with(&self, target: Rc<T>, register_as_observer: bool) -> Result<()> {
        self.handle.link.link_to(Some(target), register_as_observer)
    }

    /// Detach from the current target (the handle becomes empty).
    pub fn unlink(&self) -> Result<()> {
        self.handle.link.link_to(None, true)
    }

    /// A read-only handle sharing this handle's link.
    pub fn handle(&self) -> Handle<T> {
        self.handle.clone()
    }
}

impl<T: ?Sized + Observable + 'static> Default for RelinkableHandle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized> std::ops::Deref for RelinkableHandle<T> {
    type Target = Handle<T>;

    fn deref(&self) -> &Handle<T> {
        &self.handle
    }
}

impl<T: ?Sized> std::fmt::Debug for RelinkableHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Relinkable{:?}", self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::observable::register_with;
    use proptest::prelude::*;

    #[derive(Debug, Default)]
    struct Target {
        observable: ObservableImpl,
    }

    impl Observable for Target {
        fn observable_impl(&self) -> &ObservableImpl {
            &self.observable
        }
    }

    #[derive(Default)]
    struct Counter {
        count: Cell<u32>,
    }

    impl Observer for Counter {
        fn update(&self) -> Result<()> {
            self.count.set(self.count.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn empty_handle_is_not_set() {
        let h: Handle<Target> = Handle::empty();
        assert!(h.is_empty());
        assert!(matches!(h.current(), Err(Error::NotSet(_))));
    }

    #[test]
    fn forwards_target_notifications() {
        let target = Rc::new(Target::default());
        let h = Handle::new(Rc::clone(&target));
        let counter = Rc::new(Counter::default());
        register_with(&counter, &h);
        target.notify_observers().unwrap();
        assert_eq!(counter.count.get(), 1);
    }

    #[test]
    fn unobserved_handle_does_not_forward() {
        let target = Rc::new(Target::default());
        let h = Handle::with_observation(Rc::clone(&target), false);
        let counter = Rc::new(Counter::default());
        register_with(&counter, &h);
        target.notify_observers().unwrap();
        assert_eq!(counter.count.get(), 0);
        assert!(!h.is_observer());
    }

    #[test]
    fn relink_notifies_once_and_drops_old_target() {
        let x = Rc::new(Target::default());
        let y = Rc::new(Target::default());
        let rh = RelinkableHandle::new(Rc::clone(&x));
        let shared = rh.handle();
        let counter = Rc::new(Counter::default());
        register_with(&counter, &shared);

        rh.link_to(Rc::clone(&y)).unwrap();
        assert_eq!(counter.count.get(), 1);
        assert!(Rc::ptr_eq(&shared.current().unwrap(), &y));

        // the old target no longer reaches the handle's observers
        x.notify_observers().unwrap();
        assert_eq!(counter.count.get(), 1);
        y.notify_observers().unwrap();
        assert_eq!(counter.count.get(), 2);

        // relinking to the same target is a no-op
        rh.link_to(Rc::clone(&y)).unwrap();
        assert_eq!(counter.count.get(), 2);
    }

    #[test]
    fn unlink_empties_all_clones() {
        let rh = RelinkableHandle::new(Rc::new(Target::default()));
        let shared = rh.handle();
        rh.unlink().unwrap();
        assert!(shared.is_empty());
    }

    #[test]
    fn shared_ownership_keeps_target_alive() {
        let target = Rc::new(Target::default());
        let weak = Rc::downgrade(&target);
        let h1 = Handle::new(target);
        let h2 = h1.clone();
        drop(h1);
        assert!(weak.upgrade().is_some());
        drop(h2);
        assert!(weak.upgrade().is_none());
    }

    proptest! {
        #[test]
        fn equality_is_target_identity(n in 1usize..6, i in 0usize..6, j in 0usize..6) {
            let targets: Vec<Rc<Target>> = (0..n).map(|_| Rc::new(Target::default())).collect();
            let (i, j) = (i % n, j % n);
            let a = Handle::new(Rc::clone(&targets[i]));
            let b = Handle::new(Rc::clone(&targets[j]));
            prop_assert_eq!(a == b, i == j);
        }
    }
}
