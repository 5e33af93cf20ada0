//! `PiecewiseZeroSpreadedTermStructure` — another curve with a
//! time-dependent zero spread.
//!
//! The spread is given by quotes on a sorted list of dates.  It is
//! interpolated linearly between dates and held flat before the first and
//! after the last.  Pillar times and spread values are rebuilt lazily from
//! the original's reference date and the current quote values.

use crate::term_structure::{Extrapolator, TermStructure};
use crate::yield_term_structure::YieldTermStructure;
use crate::zero_spreaded_term_structure::spreaded_zero_yield;
use ql_core::{
    ensure,
    errors::{Error, Result},
    register_with, Handle, LazyObject, LazyState, Observable, ObservableImpl, Observer, Rate,
    Spread, Time,
};
use ql_math::{Interpolation, Interpolator};
use ql_quotes::{Quote, QuoteHandleExt};
use ql_time::{Compounding, Date, Frequency};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct SpreadCurve {
    times: Vec<Time>,
    values: Vec<Spread>,
    interpolation: Option<Box<dyn Interpolation>>,
}

/// Yield curve spreaded by an interpolated set of zero spreads.
#[derive(Debug)]
pub struct PiecewiseZeroSpreadedTermStructure {
    lazy: LazyState,
    extrapolator: Extrapolator,
    original: Handle<dyn YieldTermStructure>,
    spreads: Vec<Handle<dyn Quote>>,
    dates: Vec<Date>,
    compounding: Compounding,
    frequency: Frequency,
    curve: RefCell<SpreadCurve>,
}

impl PiecewiseZeroSpreadedTermStructure {
    /// Spread `original` by `spreads` observed on `dates`, adding to the
    /// continuously compounded zero yield.
    ///
    /// # Errors
    /// [`Error::Precondition`] if no spread is given, the counts differ, or
    /// the dates are not sorted and unique.
    pub fn new(
        original: Handle<dyn YieldTermStructure>,
        spreads: Vec<Handle<dyn Quote>>,
        dates: Vec<Date>,
    ) -> Result<Rc<Self>> {
        Self::with_compounding(
            original,
            spreads,
            dates,
            Compounding::Continuous,
            Frequency::NoFrequency,
        )
    }

    /// As [`new`](Self::new), adding the spread under `compounding`.
    pub fn with_compounding(
        original: Handle<dyn YieldTermStructure>,
        spreads: Vec<Handle<dyn Quote>>,
        dates: Vec<Date>,
        compounding: Compounding,
        frequency: Frequency,
    ) -> Result<Rc<Self>> {
        ensure!(!spreads.is_empty(), "no spreads given");
        ensure!(
            spreads.len() == dates.len(),
            "mismatch between {} spreads and {} dates",
            spreads.len(),
            dates.len()
        );
        ensure!(
            dates.windows(2).all(|w| w[0] < w[1]),
            "spread dates must be sorted and unique"
        );
        let curve = Rc::new(Self {
            lazy: LazyState::new(),
            extrapolator: Extrapolator::new(),
            original,
            spreads,
            dates,
            compounding,
            frequency,
            curve: RefCell::new(SpreadCurve::default()),
        });
        register_with(&curve, &curve.original);
        for spread in &curve.spreads {
            register_with(&curve, spread);
        }
        Ok(curve)
    }

    /// Spread dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// The zero spread applied at `t`.
    pub fn spread(&self, t: Time) -> Result<Spread> {
        self.calculate()?;
        let curve = self.curve.borrow();
        let n = curve.values.len();
        if n == 0 {
            return Err(Error::NotSet("spread curve".into()));
        }
        if t <= curve.times[0] {
            return Ok(curve.values[0]);
        }
        if t >= curve.times[n - 1] {
            return Ok(curve.values[n - 1]);
        }
        match &curve.interpolation {
            Some(interpolation) => interpolation.value(t, true),
            None => Ok(curve.values[0]),
        }
    }
}

impl Observable for PiecewiseZeroSpreadedTermStructure {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for PiecewiseZeroSpreadedTermStructure {
    fn update(&self) -> Result<()> {
        if self.original.is_empty() {
            // no reference date to rebuild pillar times against
            return self.notify_observers();
        }
        self.lazy_update()
    }
}

impl LazyObject for PiecewiseZeroSpreadedTermStructure {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        let reference = self.reference_date()?;
        let day_counter = self.day_counter()?;
        let times: Vec<Time> = self
            .dates
            .iter()
            .map(|&d| day_counter.year_fraction(reference, d))
            .collect();
        let values = self
            .spreads
            .iter()
            .map(|s| s.value())
            .collect::<Result<Vec<Spread>>>()?;
        let interpolation = if times.len() >= 2 {
            Some(Interpolator::Linear.interpolate(&times, &values)?)
        } else {
            None
        };
        *self.curve.borrow_mut() = SpreadCurve {
            times,
            values,
            interpolation,
        };
        Ok(())
    }
}

impl TermStructure for PiecewiseZeroSpreadedTermStructure {
    crate::delegate_to_handle!(original);

    fn max_date(&self) -> Result<Date> {
        self.original.current()?.max_date()
    }

    fn extrapolator(&self) -> &Extrapolator {
        &self.extrapolator
    }
}

impl YieldTermStructure for PiecewiseZeroSpreadedTermStructure {
    fn zero_yield_impl(&self, t: Time) -> Result<Rate> {
        let spread = self.spread(t)?;
        spreaded_zero_yield(
            self.original.current()?.as_ref(),
            t,
            spread,
            self.compounding,
            self.frequency,
        )
    }
}
