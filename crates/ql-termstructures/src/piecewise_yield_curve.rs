//! `PiecewiseYieldCurve` — a zero curve bootstrapped from rate helpers.
//!
//! The curve interpolates continuously compounded zero yields linearly
//! between the helpers' pillar dates.  Bootstrapping is lazy: any change to
//! a helper quote (or to the evaluation date of a floating curve) marks the
//! curve stale, and the next query solves again for every pillar with
//! Brent's method so that each helper reprices its market quote.
//!
//! While solving, helpers read discount factors from the curve itself; the
//! curve is already marked fresh at that point, so those reads see the
//! partially built nodes instead of triggering another bootstrap.

use crate::rate_helpers::RateHelper;
use crate::term_structure::{TermStructure, TermStructureCore};
use crate::yield_term_structure::YieldTermStructure;
use ql_core::{
    ensure,
    errors::{Error, Result},
    register_with, LazyObject, LazyState, Natural, Observable, ObservableImpl, Observer, Rate,
    Real, Time,
};
use ql_math::{solvers1d::brent, Interpolation, Interpolator};
use ql_quotes::QuoteHandleExt;
use ql_time::{Calendar, Date, DayCounter, Settings};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Default accuracy of the per-pillar solve.
const BOOTSTRAP_ACCURACY: Real = 1.0e-12;

/// Initial zero-rate search bracket.
const MIN_RATE: Rate = -0.10;
const MAX_RATE: Rate = 0.30;

/// Bounds the bracket may be widened to.
const MIN_RATE_LIMIT: Rate = -1.0;
const MAX_RATE_LIMIT: Rate = 3.0;

const MAX_EVALUATIONS: usize = 100;

#[derive(Debug, Default)]
struct Nodes {
    dates: Vec<Date>,
    times: Vec<Time>,
    rates: Vec<Rate>,
    interpolation: Option<Box<dyn Interpolation>>,
}

impl Nodes {
    /// Refit the interpolation over nodes `0..=last`.
    fn refit(&mut self, last: usize) -> Result<()> {
        self.interpolation = Some(
            Interpolator::Linear.interpolate(&self.times[..=last], &self.rates[..=last])?,
        );
        Ok(())
    }
}

/// Yield curve bootstrapped from deposits, FRAs and swaps.
#[derive(Debug)]
pub struct PiecewiseYieldCurve {
    core: TermStructureCore,
    lazy: LazyState,
    helpers: Vec<Rc<dyn RateHelper>>,
    accuracy: Real,
    nodes: RefCell<Nodes>,
}

impl PiecewiseYieldCurve {
    /// Curve with a fixed reference date.
    ///
    /// # Errors
    /// [`Error::Precondition`] if `helpers` is empty.
    pub fn new(
        reference_date: Date,
        helpers: Vec<Rc<dyn RateHelper>>,
        day_counter: DayCounter,
    ) -> Result<Rc<Self>> {
        Self::build(
            TermStructureCore::fixed(reference_date, Calendar::NullCalendar, day_counter),
            helpers,
            BOOTSTRAP_ACCURACY,
        )
    }

    /// Curve whose reference date is `settlement_days` after the evaluation
    /// date.
    pub fn floating(
        settings: Rc<Settings>,
        settlement_days: Natural,
        calendar: Calendar,
        helpers: Vec<Rc<dyn RateHelper>>,
        day_counter: DayCounter,
    ) -> Result<Rc<Self>> {
        Self::build(
            TermStructureCore::floating(settings, settlement_days, calendar, day_counter),
            helpers,
            BOOTSTRAP_ACCURACY,
        )
    }

    fn build(
        core: TermStructureCore,
        helpers: Vec<Rc<dyn RateHelper>>,
        accuracy: Real,
    ) -> Result<Rc<Self>> {
        ensure!(!helpers.is_empty(), "at least one rate helper is required");
        let curve = Rc::new(Self {
            core,
            lazy: LazyState::new(),
            helpers,
            accuracy,
            nodes: RefCell::new(Nodes::default()),
        });
        let this = Rc::downgrade(&curve);
        let this: Weak<dyn YieldTermStructure> = this;
        for helper in &curve.helpers {
            register_with(&curve, helper.as_ref());
            helper.set_term_structure(this.clone());
        }
        curve.core.observe_settings(&curve);
        Ok(curve)
    }

    /// The rate helpers, in construction order.
    pub fn helpers(&self) -> &[Rc<dyn RateHelper>] {
        &self.helpers
    }

    /// Pillar dates, the reference date first.
    pub fn dates(&self) -> Result<Vec<Date>> {
        self.calculate()?;
        Ok(self.nodes.borrow().dates.clone())
    }

    /// Pillar times.
    pub fn times(&self) -> Result<Vec<Time>> {
        self.calculate()?;
        Ok(self.nodes.borrow().times.clone())
    }

    /// Bootstrapped zero rates at the pillars.
    pub fn zero_rates(&self) -> Result<Vec<Rate>> {
        self.calculate()?;
        Ok(self.nodes.borrow().rates.clone())
    }

    fn sorted_helpers(&self, reference: Date) -> Result<Vec<(Date, Rc<dyn RateHelper>)>> {
        let mut sorted = self
            .helpers
            .iter()
            .map(|h| Ok((h.pillar_date()?, Rc::clone(h))))
            .collect::<Result<Vec<_>>>()?;
        sorted.sort_by_key(|(pillar, _)| *pillar);
        for pair in sorted.windows(2) {
            ensure!(
                pair[0].0 != pair[1].0,
                "more than one instrument with pillar {}",
                pair[0].0
            );
        }
        ensure!(
            sorted[0].0 > reference,
            "first pillar ({}) must be after reference date ({reference})",
            sorted[0].0
        );
        Ok(sorted)
    }
}

impl Observable for PiecewiseYieldCurve {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for PiecewiseYieldCurve {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for PiecewiseYieldCurve {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        let reference = self.reference_date()?;
        let day_counter = self.core.day_counter();
        let sorted = self.sorted_helpers(reference)?;

        // seed every node with the first quote
        let guess = sorted[0].1.quote().value()?;
        let dates: Vec<Date> = std::iter::once(reference)
            .chain(sorted.iter().map(|(pillar, _)| *pillar))
            .collect();
        let times = dates
            .iter()
            .map(|&d| day_counter.year_fraction(reference, d))
            .collect();
        {
            let mut nodes = self.nodes.borrow_mut();
            *nodes = Nodes {
                dates,
                times,
                rates: vec![guess; sorted.len() + 1],
                interpolation: None,
            };
            nodes.refit(1)?;
        }

        for (i, (pillar, helper)) in sorted.iter().enumerate() {
            let node = i + 1;
            let objective = |r: Rate| -> Result<Real> {
                {
                    let mut nodes = self.nodes.borrow_mut();
                    nodes.rates[node] = r;
                    if node == 1 {
                        nodes.rates[0] = r;
                    }
                    nodes.refit(node)?;
                }
                helper.quote_error()
            };
            let context = format!("bootstrap failed at pillar {node} ({pillar})");
            let (lo, hi) = bracket_zero_rate(&objective)
                .map_err(|e| e.context(&context))?
                .ok_or_else(|| {
                    Error::NotConverged(format!(
                        "{context}: no zero rate in [{MIN_RATE_LIMIT}, {MAX_RATE_LIMIT}] \
                         reprices the quote"
                    ))
                })?;
            let solved = brent(&objective, lo, hi, self.accuracy, MAX_EVALUATIONS)
                .map_err(|e| e.context(&context))?;
            let mut nodes = self.nodes.borrow_mut();
            nodes.rates[node] = solved;
            if node == 1 {
                nodes.rates[0] = solved;
            }
            nodes.refit(node)?;
        }
        tracing::debug!(pillars = sorted.len(), %reference, "yield curve bootstrapped");
        Ok(())
    }
}

/// Widen `[MIN_RATE, MAX_RATE]` towards the limits until `f` changes sign.
///
/// Each step grows the side with the smaller residual by the current width.
/// `None` when the limits are reached without a sign change.
fn bracket_zero_rate<F>(f: F) -> Result<Option<(Rate, Rate)>>
where
    F: Fn(Rate) -> Result<Real>,
{
    let (mut lo, mut hi) = (MIN_RATE, MAX_RATE);
    let (mut f_lo, mut f_hi) = (f(lo)?, f(hi)?);
    loop {
        if f_lo * f_hi <= 0.0 {
            return Ok(Some((lo, hi)));
        }
        let width = hi - lo;
        let grow_low = lo > MIN_RATE_LIMIT && (f_lo.abs() < f_hi.abs() || hi >= MAX_RATE_LIMIT);
        if grow_low {
            lo = (lo - width).max(MIN_RATE_LIMIT);
            f_lo = f(lo)?;
        } else if hi < MAX_RATE_LIMIT {
            hi = (hi + width).min(MAX_RATE_LIMIT);
            f_hi = f(hi)?;
        } else {
            return Ok(None);
        }
    }
}

impl TermStructure for PiecewiseYieldCurve {
    crate::delegate_to_core!(core);

    fn max_date(&self) -> Result<Date> {
        self.calculate()?;
        self.nodes
            .borrow()
            .dates
            .last()
            .copied()
            .ok_or_else(|| Error::NotSet("bootstrapped curve".into()))
    }
}

impl YieldTermStructure for PiecewiseYieldCurve {
    fn zero_yield_impl(&self, t: Time) -> Result<Rate> {
        self.calculate()?;
        let nodes = self.nodes.borrow();
        let interpolation = nodes
            .interpolation
            .as_ref()
            .ok_or_else(|| Error::NotSet("bootstrapped curve".into()))?;
        // flat past the last fitted node
        let t = t.min(interpolation.x_max());
        interpolation.value(t, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_helpers::{DepositRateHelper, FraRateHelper, SwapRateHelper};
    use approx::assert_abs_diff_eq;
    use ql_core::Freshness;
    use ql_quotes::{quote_handle, SimpleQuote};
    use ql_time::{BusinessDayConvention, Frequency, Period, TimeUnit};

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    struct Market {
        settings: Rc<Settings>,
        quotes: Vec<Rc<SimpleQuote>>,
        helpers: Vec<Rc<dyn RateHelper>>,
    }

    fn market() -> Market {
        let settings = Rc::new(Settings::with_evaluation_date(date(2024, 1, 15)));
        let quotes: Vec<Rc<SimpleQuote>> = [0.030, 0.032, 0.034, 0.036, 0.038]
            .iter()
            .map(|&r| Rc::new(SimpleQuote::new(r)))
            .collect();
        let deposit = |q: &Rc<SimpleQuote>, months| -> Rc<dyn RateHelper> {
            DepositRateHelper::new(
                quote_handle(q),
                Period::new(months, TimeUnit::Months),
                0,
                Calendar::NullCalendar,
                BusinessDayConvention::Following,
                false,
                DayCounter::Actual360,
                Rc::clone(&settings),
            )
        };
        let swap = |q: &Rc<SimpleQuote>, years| -> Rc<dyn RateHelper> {
            SwapRateHelper::new(
                quote_handle(q),
                Period::new(years, TimeUnit::Years),
                0,
                Calendar::NullCalendar,
                Frequency::Annual,
                BusinessDayConvention::Following,
                DayCounter::Thirty360,
                Rc::clone(&settings),
            )
            .unwrap()
        };
        let fra: Rc<dyn RateHelper> = FraRateHelper::new(
            quote_handle(&quotes[2]),
            6,
            12,
            0,
            Calendar::NullCalendar,
            BusinessDayConvention::Following,
            DayCounter::Actual360,
            Rc::clone(&settings),
        )
        .unwrap();
        // listed out of pillar order on purpose
        let helpers = vec![
            swap(&quotes[4], 5),
            deposit(&quotes[0], 3),
            fra,
            deposit(&quotes[1], 6),
            swap(&quotes[3], 2),
        ];
        Market {
            settings,
            quotes,
            helpers,
        }
    }

    fn assert_reprices(curve: &PiecewiseYieldCurve) {
        for helper in curve.helpers() {
            assert_abs_diff_eq!(helper.quote_error().unwrap(), 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn bootstrap_reprices_helpers() {
        let m = market();
        let curve = PiecewiseYieldCurve::new(date(2024, 1, 15), m.helpers.clone(), DayCounter::Actual365Fixed)
            .unwrap();
        assert_reprices(&curve);
        let dates = curve.dates().unwrap();
        assert_eq!(dates.len(), 6);
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(curve.max_date().unwrap(), date(2029, 1, 15));
        let d1 = curve.discount(1.0, false).unwrap();
        let d2 = curve.discount(4.0, false).unwrap();
        assert!(d1 < 1.0 && d2 < d1);
    }

    #[test]
    fn quote_move_triggers_rebootstrap() {
        let m = market();
        let curve = PiecewiseYieldCurve::new(date(2024, 1, 15), m.helpers.clone(), DayCounter::Actual365Fixed)
            .unwrap();
        let before = curve.discount(5.0, false).unwrap();
        m.quotes[4].set_value(0.045).unwrap();
        assert_eq!(curve.freshness(), Freshness::Stale);
        let after = curve.discount(5.0, false).unwrap();
        assert!(after < before);
        assert_reprices(&curve);
    }

    #[test]
    fn invalid_quote_fails_then_recovers() {
        let m = market();
        let curve = PiecewiseYieldCurve::new(date(2024, 1, 15), m.helpers.clone(), DayCounter::Actual365Fixed)
            .unwrap();
        m.quotes[1].reset().unwrap();
        assert!(matches!(curve.discount(1.0, false), Err(Error::NotSet(_))));
        assert_eq!(curve.freshness(), Freshness::NeverCalculated);
        m.quotes[1].set_value(0.032).unwrap();
        assert!(curve.discount(1.0, false).is_ok());
        assert_reprices(&curve);
    }

    #[test]
    fn bracket_widens_for_high_rates() {
        let m = market();
        let curve = PiecewiseYieldCurve::new(date(2024, 1, 15), m.helpers.clone(), DayCounter::Actual365Fixed)
            .unwrap();
        for (quote, rate) in m.quotes.iter().zip([0.40, 0.42, 0.45, 0.48, 0.50]) {
            quote.set_value(rate).unwrap();
        }
        let rates = curve.zero_rates().unwrap();
        assert!(rates.iter().any(|&r| r > MAX_RATE));
        assert_reprices(&curve);
    }

    #[test]
    fn unreachable_quote_does_not_converge() {
        let m = market();
        let curve = PiecewiseYieldCurve::new(date(2024, 1, 15), m.helpers.clone(), DayCounter::Actual365Fixed)
            .unwrap();
        // a 3m deposit cannot quote below -1/τ
        m.quotes[0].set_value(-10.0).unwrap();
        let err = curve.discount(1.0, false).unwrap_err();
        assert!(matches!(err, Error::NotConverged(_)));
        assert!(err.is_recoverable());
        m.quotes[0].set_value(0.030).unwrap();
        assert_reprices(&curve);
    }

    #[test]
    fn floating_curve_follows_evaluation_date() {
        let m = market();
        let curve = PiecewiseYieldCurve::floating(
            Rc::clone(&m.settings),
            0,
            Calendar::NullCalendar,
            m.helpers.clone(),
            DayCounter::Actual365Fixed,
        )
        .unwrap();
        assert_eq!(curve.max_date().unwrap(), date(2029, 1, 15));
        m.settings.set_evaluation_date(date(2024, 2, 15)).unwrap();
        assert!(!curve.is_calculated());
        assert_eq!(curve.reference_date().unwrap(), date(2024, 2, 15));
        assert_eq!(curve.max_date().unwrap(), date(2029, 2, 15));
        assert_reprices(&curve);
    }

    #[test]
    fn duplicate_pillars_are_rejected() {
        let settings = Rc::new(Settings::with_evaluation_date(date(2024, 1, 15)));
        let quote = Rc::new(SimpleQuote::new(0.03));
        let deposit = || -> Rc<dyn RateHelper> {
            DepositRateHelper::new(
                quote_handle(&quote),
                Period::new(3, TimeUnit::Months),
                0,
                Calendar::NullCalendar,
                BusinessDayConvention::Following,
                false,
                DayCounter::Actual360,
                Rc::clone(&settings),
            )
        };
        let curve = PiecewiseYieldCurve::new(
            date(2024, 1, 15),
            vec![deposit(), deposit()],
            DayCounter::Actual365Fixed,
        )
        .unwrap();
        assert!(matches!(curve.discount(0.1, true), Err(Error::Precondition(_))));
        assert!(PiecewiseYieldCurve::new(date(2024, 1, 15), Vec::new(), DayCounter::Actual365Fixed).is_err());
    }
}
