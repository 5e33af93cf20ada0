//! Rate helpers for yield-curve bootstrapping.
//!
//! A *rate helper* pairs a market quote (deposit rate, FRA rate, par swap
//! rate) with the conventions needed to reprice it off a yield curve.  The
//! curve being bootstrapped binds itself to its helpers through
//! [`RateHelper::set_term_structure`] with a non-owning `Weak` reference,
//! since the curve also owns the helper list.
//!
//! Helper dates are derived from the evaluation date of a shared
//! [`Settings`] context each time they are asked for, and helpers forward
//! the notifications of their quote and of the settings to the curve.

use crate::yield_term_structure::YieldTermStructure;
use ql_core::{
    ensure,
    errors::{Error, Result},
    register_with, Handle, Natural, Observable, ObservableImpl, Observer, Rate, Real,
};
use ql_quotes::{Quote, QuoteHandleExt};
use ql_time::{
    BusinessDayConvention, Calendar, Date, DayCounter, Frequency, Period, Settings, TimeUnit,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

// ── RateHelper trait ──────────────────────────────────────────────────────────

/// A market quote constraining a yield curve at a pillar date.
pub trait RateHelper: Observable + std::fmt::Debug {
    /// The quoted rate.
    fn quote(&self) -> &Handle<dyn Quote>;

    /// First date at which the curve is read.
    fn earliest_date(&self) -> Result<Date>;

    /// Last date at which the curve is read.
    fn maturity_date(&self) -> Result<Date>;

    /// The date up to which the helper constrains the curve.
    fn pillar_date(&self) -> Result<Date> {
        self.maturity_date()
    }

    /// Bind the curve used by [`implied_quote`](Self::implied_quote).
    fn set_term_structure(&self, term_structure: Weak<dyn YieldTermStructure>);

    /// The quote implied by the bound curve.
    ///
    /// # Errors
    /// [`Error::NotSet`] if no curve is bound, or the bound curve is gone.
    fn implied_quote(&self) -> Result<Real>;

    /// Market quote minus implied quote.
    fn quote_error(&self) -> Result<Real> {
        Ok(self.quote().value()? - self.implied_quote()?)
    }
}

/// State shared by the helpers below.
#[derive(Debug)]
struct HelperCore {
    quote: Handle<dyn Quote>,
    settings: Rc<Settings>,
    term_structure: RefCell<Option<Weak<dyn YieldTermStructure>>>,
    observable: ObservableImpl,
}

impl HelperCore {
    fn new(quote: Handle<dyn Quote>, settings: Rc<Settings>) -> Self {
        Self {
            quote,
            settings,
            term_structure: RefCell::new(None),
            observable: ObservableImpl::new(),
        }
    }

    fn observe_inputs<H: Observer + 'static>(&self, owner: &Rc<H>) {
        register_with(owner, &self.quote);
        register_with(owner, self.settings.as_ref());
    }

    fn bind(&self, term_structure: Weak<dyn YieldTermStructure>) {
        *self.term_structure.borrow_mut() = Some(term_structure);
    }

    fn term_structure(&self) -> Result<Rc<dyn YieldTermStructure>> {
        self.term_structure
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or_else(|| Error::NotSet("term structure".into()))
    }

    fn spot_date(&self, calendar: Calendar, fixing_days: Natural) -> Result<Date> {
        calendar.advance(
            self.settings.evaluation_date(),
            Period::new(fixing_days as i32, TimeUnit::Days),
            BusinessDayConvention::Following,
            false,
        )
    }
}

/// Simple rate over `[start, end]` implied by `curve`.
fn simple_forward(
    curve: &dyn YieldTermStructure,
    start: Date,
    end: Date,
    day_counter: DayCounter,
) -> Result<Rate> {
    let tau = day_counter.year_fraction(start, end);
    ensure!(tau > 0.0, "empty accrual period from {start} to {end}");
    let growth = curve.discount_date(start, true)? / curve.discount_date(end, true)?;
    Ok((growth - 1.0) / tau)
}

macro_rules! helper_plumbing {
    ($helper:ty) => {
        impl Observable for $helper {
            fn observable_impl(&self) -> &ObservableImpl {
                &self.core.observable
            }
        }

        impl Observer for $helper {
            fn update(&self) -> Result<()> {
                self.core.observable.notify()
            }
        }
    };
}

// ── DepositRateHelper ─────────────────────────────────────────────────────────

/// Money-market deposit starting `fixing_days` after the evaluation date.
#[derive(Debug)]
pub struct DepositRateHelper {
    core: HelperCore,
    tenor: Period,
    fixing_days: Natural,
    calendar: Calendar,
    convention: BusinessDayConvention,
    end_of_month: bool,
    day_counter: DayCounter,
}

impl DepositRateHelper {
    /// Deposit of length `tenor`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rate: Handle<dyn Quote>,
        tenor: Period,
        fixing_days: Natural,
        calendar: Calendar,
        convention: BusinessDayConvention,
        end_of_month: bool,
        day_counter: DayCounter,
        settings: Rc<Settings>,
    ) -> Rc<Self> {
        let helper = Rc::new(Self {
            core: HelperCore::new(rate, settings),
            tenor,
            fixing_days,
            calendar,
            convention,
            end_of_month,
            day_counter,
        });
        helper.core.observe_inputs(&helper);
        helper
    }
}

helper_plumbing!(DepositRateHelper);

impl RateHelper for DepositRateHelper {
    fn quote(&self) -> &Handle<dyn Quote> {
        &self.core.quote
    }

    fn earliest_date(&self) -> Result<Date> {
        self.core.spot_date(self.calendar, self.fixing_days)
    }

    fn maturity_date(&self) -> Result<Date> {
        self.calendar.advance(
            self.earliest_date()?,
            self.tenor,
            self.convention,
            self.end_of_month,
        )
    }

    fn set_term_structure(&self, term_structure: Weak<dyn YieldTermStructure>) {
        self.core.bind(term_structure);
    }

    fn implied_quote(&self) -> Result<Real> {
        let curve = self.core.term_structure()?;
        simple_forward(
            curve.as_ref(),
            self.earliest_date()?,
            self.maturity_date()?,
            self.day_counter,
        )
    }
}

// ── FraRateHelper ─────────────────────────────────────────────────────────────

/// Forward-rate agreement from `months_to_start` to `months_to_end` after
/// the spot date.
#[derive(Debug)]
pub struct FraRateHelper {
    core: HelperCore,
    months_to_start: Natural,
    months_to_end: Natural,
    fixing_days: Natural,
    calendar: Calendar,
    convention: BusinessDayConvention,
    day_counter: DayCounter,
}

impl FraRateHelper {
    /// A `months_to_start` x `months_to_end` FRA.
    ///
    /// # Errors
    /// [`Error::Precondition`] unless `months_to_end > months_to_start`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rate: Handle<dyn Quote>,
        months_to_start: Natural,
        months_to_end: Natural,
        fixing_days: Natural,
        calendar: Calendar,
        convention: BusinessDayConvention,
        day_counter: DayCounter,
        settings: Rc<Settings>,
    ) -> Result<Rc<Self>> {
        ensure!(
            months_to_end > months_to_start,
            "months to end ({months_to_end}) must be greater than months to start ({months_to_start})"
        );
        let helper = Rc::new(Self {
            core: HelperCore::new(rate, settings),
            months_to_start,
            months_to_end,
            fixing_days,
            calendar,
            convention,
            day_counter,
        });
        helper.core.observe_inputs(&helper);
        Ok(helper)
    }

    fn from_spot(&self, months: Natural) -> Result<Date> {
        let spot = self.core.spot_date(self.calendar, self.fixing_days)?;
        self.calendar.advance(
            spot,
            Period::new(months as i32, TimeUnit::Months),
            self.convention,
            false,
        )
    }
}

helper_plumbing!(FraRateHelper);

impl RateHelper for FraRateHelper {
    fn quote(&self) -> &Handle<dyn Quote> {
        &self.core.quote
    }

    fn earliest_date(&self) -> Result<Date> {
        self.from_spot(self.months_to_start)
    }

    fn maturity_date(&self) -> Result<Date> {
        self.from_spot(self.months_to_end)
    }

    fn set_term_structure(&self, term_structure: Weak<dyn YieldTermStructure>) {
        self.core.bind(term_structure);
    }

    fn implied_quote(&self) -> Result<Real> {
        let curve = self.core.term_structure()?;
        simple_forward(
            curve.as_ref(),
            self.earliest_date()?,
            self.maturity_date()?,
            self.day_counter,
        )
    }
}

// ── SwapRateHelper ────────────────────────────────────────────────────────────

/// Par rate of a fixed-vs-floating swap starting on the spot date.
///
/// The floating leg is assumed to be priced off the same curve, so its value
/// is `P(start) - P(end)` and only the fixed schedule is generated.
#[derive(Debug)]
pub struct SwapRateHelper {
    core: HelperCore,
    tenor: Period,
    fixing_days: Natural,
    calendar: Calendar,
    fixed_period: Period,
    fixed_convention: BusinessDayConvention,
    fixed_day_counter: DayCounter,
}

impl SwapRateHelper {
    /// Swap of length `tenor` paying fixed at `fixed_frequency`.
    ///
    /// # Errors
    /// [`Error::Precondition`] if `fixed_frequency` has no period.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rate: Handle<dyn Quote>,
        tenor: Period,
        fixing_days: Natural,
        calendar: Calendar,
        fixed_frequency: Frequency,
        fixed_convention: BusinessDayConvention,
        fixed_day_counter: DayCounter,
        settings: Rc<Settings>,
    ) -> Result<Rc<Self>> {
        let fixed_period = Period::from_frequency(fixed_frequency)?;
        ensure!(
            fixed_period.length > 0,
            "fixed leg frequency {fixed_frequency:?} has no period"
        );
        let helper = Rc::new(Self {
            core: HelperCore::new(rate, settings),
            tenor,
            fixing_days,
            calendar,
            fixed_period,
            fixed_convention,
            fixed_day_counter,
        });
        helper.core.observe_inputs(&helper);
        Ok(helper)
    }

    /// Fixed-leg dates, start date first.
    pub fn fixed_schedule(&self) -> Result<Vec<Date>> {
        let start = self.earliest_date()?;
        let end = self.maturity_date()?;
        let mut dates = vec![start];
        for k in 1.. {
            let next = self.calendar.advance(
                start,
                self.fixed_period * k,
                self.fixed_convention,
                false,
            )?;
            if next >= end {
                dates.push(end);
                break;
            }
            dates.push(next);
        }
        Ok(dates)
    }
}

helper_plumbing!(SwapRateHelper);

impl RateHelper for SwapRateHelper {
    fn quote(&self) -> &Handle<dyn Quote> {
        &self.core.quote
    }

    fn earliest_date(&self) -> Result<Date> {
        self.core.spot_date(self.calendar, self.fixing_days)
    }

    fn maturity_date(&self) -> Result<Date> {
        self.calendar.advance(
            self.earliest_date()?,
            self.tenor,
            self.fixed_convention,
            false,
        )
    }

    fn set_term_structure(&self, term_structure: Weak<dyn YieldTermStructure>) {
        self.core.bind(term_structure);
    }

    fn implied_quote(&self) -> Result<Real> {
        let curve = self.core.term_structure()?;
        let dates = self.fixed_schedule()?;
        let mut annuity = 0.0;
        for pair in dates.windows(2) {
            let accrual = self.fixed_day_counter.year_fraction(pair[0], pair[1]);
            annuity += accrual * curve.discount_date(pair[1], true)?;
        }
        ensure!(annuity > 0.0, "non-positive annuity ({annuity})");
        let start = curve.discount_date(dates[0], true)?;
        let end = curve.discount_date(dates[dates.len() - 1], true)?;
        Ok((start - end) / annuity)
    }
}
