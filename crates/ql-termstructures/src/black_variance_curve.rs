//! `BlackVarianceCurve` — strike-independent Black volatility interpolated
//! in total variance between expiry pillars.
//!
//! Total variance is linear between pillars; past the last pillar the last
//! volatility is held flat.

use crate::black_vol_term_structure::BlackVolTermStructure;
use crate::term_structure::{TermStructure, TermStructureCore};
use crate::volatility_term_structure::VolatilityTermStructure;
use ql_core::{
    ensure, errors::Result, Observable, ObservableImpl, Real, Time, Volatility,
};
use ql_math::{Interpolation, Interpolator};
use ql_time::{BusinessDayConvention, Calendar, Date, DayCounter};
use std::rc::Rc;

/// Black volatility term structure over expiry pillars.
#[derive(Debug)]
pub struct BlackVarianceCurve {
    core: TermStructureCore,
    dates: Vec<Date>,
    times: Vec<Time>,
    variances: Box<dyn Interpolation>,
    observable: ObservableImpl,
}

impl BlackVarianceCurve {
    /// Build from expiry dates and their Black volatilities.
    ///
    /// # Errors
    /// [`Error::Precondition`](ql_core::Error::Precondition) if the inputs
    /// differ in length, the dates are not strictly increasing after the
    /// reference date, or the implied total variance decreases.
    pub fn new(
        reference_date: Date,
        dates: &[Date],
        volatilities: &[Volatility],
        day_counter: DayCounter,
    ) -> Result<Rc<Self>> {
        ensure!(
            dates.len() == volatilities.len(),
            "mismatch between {} dates and {} volatilities",
            dates.len(),
            volatilities.len()
        );
        ensure!(!dates.is_empty(), "at least one expiry required");
        ensure!(
            dates[0] > reference_date,
            "cannot have dates[0] ({}) <= reference date ({reference_date})",
            dates[0]
        );
        let mut times = vec![0.0];
        let mut variances = vec![0.0];
        for (i, (&date, &vol)) in dates.iter().zip(volatilities).enumerate() {
            let t = day_counter.year_fraction(reference_date, date);
            ensure!(
                t > times[i],
                "expiry dates must be sorted unique: {date} is out of order"
            );
            let variance = vol * vol * t;
            ensure!(
                variance >= variances[i],
                "variance must be non-decreasing: {variance} at {date}"
            );
            times.push(t);
            variances.push(variance);
        }
        let interpolation = Interpolator::Linear.interpolate(&times, &variances)?;
        Ok(Rc::new(Self {
            core: TermStructureCore::fixed(reference_date, Calendar::NullCalendar, day_counter),
            dates: dates.to_vec(),
            times,
            variances: interpolation,
            observable: ObservableImpl::new(),
        }))
    }

    /// The expiry pillars.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }
}

impl Observable for BlackVarianceCurve {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl TermStructure for BlackVarianceCurve {
    crate::delegate_to_core!(core);

    fn max_date(&self) -> Result<Date> {
        Ok(self.dates[self.dates.len() - 1])
    }
}

impl VolatilityTermStructure for BlackVarianceCurve {
    fn business_day_convention(&self) -> Result<BusinessDayConvention> {
        Ok(BusinessDayConvention::Following)
    }

    fn min_strike(&self) -> Result<Real> {
        Ok(Real::MIN)
    }

    fn max_strike(&self) -> Result<Real> {
        Ok(Real::MAX)
    }
}

impl BlackVolTermStructure for BlackVarianceCurve {
    fn black_variance_impl(&self, t: Time, _strike: Real) -> Result<Real> {
        let last = self.times[self.times.len() - 1];
        if t <= last {
            self.variances.value(t, true)
        } else {
            Ok(self.variances.value_unchecked(last) * t / last)
        }
    }
}
