//! `Quote` trait, the mutable `SimpleQuote` leaf, and quotes derived from
//! other quotes.
//!
//! Quotes are the leaves of the dependency graph: setting a `SimpleQuote`
//! notifies everything built on top of it.  Derived quotes observe their
//! inputs through handles and forward each notification.

use ql_core::{
    errors::{Error, Result},
    register_with, Handle, Observable, ObservableImpl, Observer, Real,
};
use std::cell::Cell;
use std::rc::Rc;

/// A market-observable value.
pub trait Quote: Observable + std::fmt::Debug {
    /// The current value.
    ///
    /// # Errors
    /// [`Error::NotSet`] if the quote holds no valid value.
    fn value(&self) -> Result<Real>;

    /// Return `true` if [`value`](Self::value) would succeed.
    fn is_valid(&self) -> bool;
}

// ── SimpleQuote ───────────────────────────────────────────────────────────────

/// A mutable market quote.
#[derive(Debug, Default)]
pub struct SimpleQuote {
    value: Cell<Option<Real>>,
    observable: ObservableImpl,
}

impl SimpleQuote {
    /// A quote holding `value`.
    pub fn new(value: Real) -> Self {
        Self {
            value: Cell::new(Some(value)),
            observable: ObservableImpl::new(),
        }
    }

    /// An invalid quote.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a new value, notifying observers if it differs from the current
    /// one.  Returns the change in value (zero if previously unset).
    pub fn set_value(&self, value: Real) -> Result<Real> {
        let previous = self.value.replace(Some(value));
        if previous == Some(value) {
            return Ok(0.0);
        }
        self.observable.notify()?;
        Ok(previous.map_or(0.0, |p| value - p))
    }

    /// Invalidate the quote, notifying observers if it was valid.
    pub fn reset(&self) -> Result<()> {
        if self.value.take().is_some() {
            self.observable.notify()?;
        }
        Ok(())
    }
}

impl Observable for SimpleQuote {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl Quote for SimpleQuote {
    fn value(&self) -> Result<Real> {
        self.value
            .get()
            .ok_or_else(|| Error::NotSet("invalid SimpleQuote: value".into()))
    }

    fn is_valid(&self) -> bool {
        self.value.get().is_some()
    }
}

// ── Handle helpers ────────────────────────────────────────────────────────────

/// Quote access through a `Handle<dyn Quote>`.
pub trait QuoteHandleExt {
    /// Value of the linked quote; [`Error::NotSet`] if the handle is empty or
    /// the quote is invalid.
    fn value(&self) -> Result<Real>;

    /// Return `true` if the handle is linked to a valid quote.
    fn is_valid(&self) -> bool;
}

impl QuoteHandleExt for Handle<dyn Quote> {
    fn value(&self) -> Result<Real> {
        self.current()?.value()
    }

    fn is_valid(&self) -> bool {
        self.get().is_some_and(|q| q.is_valid())
    }
}

/// A handle observing `quote`.
pub fn quote_handle<Q: Quote + 'static>(quote: &Rc<Q>) -> Handle<dyn Quote> {
    let target: Rc<dyn Quote> = quote.clone();
    Handle::new(target)
}

// ── DerivedQuote ──────────────────────────────────────────────────────────────

/// `f(q)` for an underlying quote `q`.
pub struct DerivedQuote {
    element: Handle<dyn Quote>,
    f: Box<dyn Fn(Real) -> Real>,
    observable: ObservableImpl,
}

impl DerivedQuote {
    /// Create a quote applying `f` to `element`.
    pub fn new(element: Handle<dyn Quote>, f: impl Fn(Real) -> Real + 'static) -> Rc<Self> {
        let quote = Rc::new(Self {
            element,
            f: Box::new(f),
            observable: ObservableImpl::new(),
        });
        register_with(&quote, &quote.element);
        quote
    }
}

impl std::fmt::Debug for DerivedQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedQuote")
            .field("element", &self.element)
            .finish_non_exhaustive()
    }
}

impl Observer for DerivedQuote {
    fn update(&self) -> Result<()> {
        self.observable.notify()
    }
}

impl Observable for DerivedQuote {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl Quote for DerivedQuote {
    fn value(&self) -> Result<Real> {
        Ok((self.f)(self.element.value()?))
    }

    fn is_valid(&self) -> bool {
        self.element.is_valid()
    }
}

// ── CompositeQuote ────────────────────────────────────────────────────────────

/// `f(q1, q2)` for two underlying quotes.
pub struct CompositeQuote {
    element1: Handle<dyn Quote>,
    element2: Handle<dyn Quote>,
    f: Box<dyn Fn(Real, Real) -> Real>,
    observable: ObservableImpl,
}

impl CompositeQuote {
    /// Create a quote combining `element1` and `element2` with `f`.
    pub fn new(
        element1: Handle<dyn Quote>,
        element2: Handle<dyn Quote>,
        f: impl Fn(Real, Real) -> Real + 'static,
    ) -> Rc<Self> {
        let quote = Rc::new(Self {
            element1,
            element2,
            f: Box::new(f),
            observable: ObservableImpl::new(),
        });
        register_with(&quote, &quote.element1);
        register_with(&quote, &quote.element2);
        quote
    }
}

impl std::fmt::Debug for CompositeQuote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeQuote")
            .field("element1", &self.element1)
            .field("element2", &self.element2)
            .finish_non_exhaustive()
    }
}

impl Observer for CompositeQuote {
    fn update(&self) -> Result<()> {
        self.observable.notify()
    }
}

impl Observable for CompositeQuote {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl Quote for CompositeQuote {
    fn value(&self) -> Result<Real> {
        Ok((self.f)(self.element1.value()?, self.element2.value()?))
    }

    fn is_valid(&self) -> bool {
        self.element1.is_valid() && self.element2.is_valid()
    }
}
