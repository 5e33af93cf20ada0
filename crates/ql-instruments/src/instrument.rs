//! `Instrument` — a priced product in the observer graph.
//!
//! An instrument is a [`LazyObject`]: it caches the results its pricing
//! engine produced and goes stale whenever the engine (or anything the
//! engine observes) notifies.  Engines are plugged in at run time through
//! [`Instrument::set_pricing_engine`]; each engine implements
//! [`PricingEngine`] for exactly the argument types it can price, so an
//! engine/instrument mismatch is a compile error rather than a failed cast.

use ql_core::{
    errors::{Error, Result},
    LazyObject, LazyState, Observable, Observer, Real,
};
use ql_time::{Date, Settings};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Results of pricing an instrument.
///
/// Contains the NPV and optionally additional named results
/// (e.g. "delta", "gamma", "vega").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingResults {
    /// Net present value.
    pub npv: Real,
    /// Error estimate (e.g. from MC simulation).
    pub error_estimate: Option<Real>,
    /// Additional named results.
    pub additional_results: HashMap<String, Real>,
}

impl PricingResults {
    /// Create pricing results with just an NPV.
    pub fn from_npv(npv: Real) -> Self {
        Self {
            npv,
            error_estimate: None,
            additional_results: HashMap::new(),
        }
    }

    /// Add a named result.
    pub fn with_result(mut self, key: impl Into<String>, value: Real) -> Self {
        self.additional_results.insert(key.into(), value);
        self
    }

    /// Attach an error estimate.
    pub fn with_error_estimate(mut self, error: Real) -> Self {
        self.error_estimate = Some(error);
        self
    }
}

/// A pricing engine for instruments described by `A`.
///
/// Engines observe their market inputs and forward notifications, so an
/// instrument only has to observe its engine.
pub trait PricingEngine<A>: Observable + std::fmt::Debug {
    /// Price the instrument described by `args`.
    fn calculate(&self, args: &A) -> Result<PricingResults>;
}

/// Whether an event on `date` lies in the past for `settings`.
///
/// An event on the evaluation date itself counts as past unless the session
/// includes reference-date events.
pub fn has_occurred(date: Date, settings: &Settings) -> bool {
    let today = settings.evaluation_date();
    if settings.include_reference_date_events() {
        date < today
    } else {
        date <= today
    }
}

/// State shared by every instrument: lazy bookkeeping, the engine slot and
/// the last results.
pub struct InstrumentCore<A> {
    lazy: LazyState,
    me: Weak<dyn Observer>,
    engine: RefCell<Option<Rc<dyn PricingEngine<A>>>>,
    results: RefCell<PricingResults>,
}

impl<A> InstrumentCore<A> {
    /// Create the core of an instrument whose observer identity is `me`.
    ///
    /// Build the instrument with `Rc::new_cyclic` and pass the weak
    /// self-reference here.
    pub fn new(me: Weak<dyn Observer>) -> Self {
        Self {
            lazy: LazyState::new(),
            me,
            engine: RefCell::new(None),
            results: RefCell::new(PricingResults::default()),
        }
    }

    /// The lazy-object state.
    pub fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    /// The engine currently set, if any.
    pub fn engine(&self) -> Option<Rc<dyn PricingEngine<A>>> {
        self.engine.borrow().clone()
    }

    fn swap_engine(&self, engine: Rc<dyn PricingEngine<A>>) {
        let previous = self.engine.borrow_mut().replace(Rc::clone(&engine));
        if let Some(previous) = previous {
            previous.unregister_observer(&self.me);
        }
        engine.register_observer(self.me.clone());
    }
}

impl<A> std::fmt::Debug for InstrumentCore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentCore")
            .field("lazy", &self.lazy)
            .field("has_engine", &self.engine.borrow().is_some())
            .field("results", &self.results.borrow())
            .finish()
    }
}

/// A financial instrument priced by a pluggable engine.
///
/// Implementors route `LazyObject::perform_calculations` to
/// [`perform_pricing`](Self::perform_pricing).
pub trait Instrument: LazyObject {
    /// Plain description of the instrument handed to its engine.
    type Arguments;

    /// The shared instrument state.
    fn core(&self) -> &InstrumentCore<Self::Arguments>;

    /// Build the engine arguments from the instrument's current state.
    fn arguments(&self) -> Result<Self::Arguments>;

    /// Whether the instrument has expired as of the evaluation date.
    fn is_expired(&self) -> Result<bool>;

    /// Replace the pricing engine.
    ///
    /// The instrument stops observing the previous engine, observes the new
    /// one and is invalidated.
    fn set_pricing_engine(&self, engine: Rc<dyn PricingEngine<Self::Arguments>>) -> Result<()> {
        self.core().swap_engine(engine);
        self.lazy_update()
    }

    /// Compute results through the engine, or zero them if expired.
    fn perform_pricing(&self) -> Result<()> {
        let core = self.core();
        if self.is_expired()? {
            *core.results.borrow_mut() = PricingResults::from_npv(0.0);
            return Ok(());
        }
        let engine = core
            .engine()
            .ok_or_else(|| Error::NotSet("pricing engine".into()))?;
        let results = engine.calculate(&self.arguments()?)?;
        *core.results.borrow_mut() = results;
        Ok(())
    }

    /// Net present value.
    fn npv(&self) -> Result<Real> {
        self.calculate()?;
        Ok(self.core().results.borrow().npv)
    }

    /// Error estimate on the NPV, if the engine provides one.
    fn error_estimate(&self) -> Result<Option<Real>> {
        self.calculate()?;
        Ok(self.core().results.borrow().error_estimate)
    }

    /// A named additional result.
    fn result(&self, name: &str) -> Result<Real> {
        self.calculate()?;
        self.core()
            .results
            .borrow()
            .additional_results
            .get(name)
            .copied()
            .ok_or_else(|| Error::Precondition(format!("{name} not provided")))
    }

    /// A copy of every result of the last calculation.
    fn results(&self) -> Result<PricingResults> {
        self.calculate()?;
        Ok(self.core().results.borrow().clone())
    }
}

/// Implements `Observable`, `Observer` and `LazyObject` for a struct with a
/// `core: InstrumentCore<_>` field.
#[macro_export]
macro_rules! instrument_plumbing {
    ($ty:ty) => {
        impl ql_core::Observable for $ty {
            fn observable_impl(&self) -> &ql_core::ObservableImpl {
                self.core.lazy_state().observers()
            }
        }

        impl ql_core::Observer for $ty {
            fn update(&self) -> ql_core::Result<()> {
                ql_core::LazyObject::lazy_update(self)
            }
        }

        impl ql_core::LazyObject for $ty {
            fn lazy_state(&self) -> &ql_core::LazyState {
                self.core.lazy_state()
            }

            fn perform_calculations(&self) -> ql_core::Result<()> {
                $crate::instrument::Instrument::perform_pricing(self)
            }
        }
    };
}
