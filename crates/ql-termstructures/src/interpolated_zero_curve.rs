//! `InterpolatedZeroCurve` — a yield curve interpolating continuously
//! compounded zero yields between pillar dates.
//!
//! The first pillar is the reference date.  Past the last pillar the
//! interpolation is extended (when extrapolation is allowed).

use crate::term_structure::{TermStructure, TermStructureCore};
use crate::yield_term_structure::YieldTermStructure;
use ql_core::{ensure, errors::Result, Observable, ObservableImpl, Rate, Real, Time};
use ql_math::{Interpolation, Interpolator};
use ql_time::{Calendar, Date, DayCounter};
use std::rc::Rc;

/// Zero-yield curve over fixed pillars.
#[derive(Debug)]
pub struct InterpolatedZeroCurve {
    core: TermStructureCore,
    dates: Vec<Date>,
    times: Vec<Time>,
    yields: Vec<Rate>,
    interpolation: Box<dyn Interpolation>,
    observable: ObservableImpl,
}

impl InterpolatedZeroCurve {
    /// Build from pillar dates (the first being the reference date) and
    /// their zero yields.
    ///
    /// # Errors
    /// [`Error::Precondition`](ql_core::Error::Precondition) if the inputs
    /// differ in length, hold too few points for `interpolator`, or the
    /// dates are not strictly increasing.
    pub fn new(
        dates: &[Date],
        yields: &[Rate],
        day_counter: DayCounter,
        calendar: Calendar,
        interpolator: Interpolator,
    ) -> Result<Rc<Self>> {
        ensure!(
            dates.len() == yields.len(),
            "mismatch between {} dates and {} yields",
            dates.len(),
            yields.len()
        );
        ensure!(
            dates.len() >= interpolator.required_points(),
            "not enough pillars: {} given",
            dates.len()
        );
        ensure!(
            dates.windows(2).all(|w| w[0] < w[1]),
            "pillar dates must be strictly increasing"
        );
        let reference = dates[0];
        let times: Vec<Time> = dates
            .iter()
            .map(|&d| day_counter.year_fraction(reference, d))
            .collect();
        let interpolation = interpolator.interpolate(&times, yields)?;
        Ok(Rc::new(Self {
            core: TermStructureCore::fixed(reference, calendar, day_counter),
            dates: dates.to_vec(),
            times,
            yields: yields.to_vec(),
            interpolation,
            observable: ObservableImpl::new(),
        }))
    }

    /// Pillar dates.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Pillar times.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Zero yields at the pillars.
    pub fn zero_rates(&self) -> &[Real] {
        &self.yields
    }
}

impl Observable for InterpolatedZeroCurve {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl TermStructure for InterpolatedZeroCurve {
    crate::delegate_to_core!(core);

    fn max_date(&self) -> Result<Date> {
        Ok(self.dates[self.dates.len() - 1])
    }
}

impl YieldTermStructure for InterpolatedZeroCurve {
    fn zero_yield_impl(&self, t: Time) -> Result<Rate> {
        self.interpolation.value(t, true)
    }
}
