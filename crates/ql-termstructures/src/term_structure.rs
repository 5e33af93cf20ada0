//! `TermStructure` — the capability shared by every curve and surface.
//!
//! Every term structure has a **reference date** (where time zero sits), a
//! **day counter** turning dates into times, a **calendar**, and a
//! **maximum date** beyond which queries fail unless extrapolation is
//! enabled.
//!
//! Accessors return `Result` because composed structures delegate them to a
//! wrapped handle, which may be empty.
//!
//! [`TermStructureCore`] carries the reference-date machinery for concrete
//! structures: either a date fixed at construction, or a *floating* date a
//! number of business days after the evaluation date of a shared
//! [`Settings`] context.

use ql_core::{
    ensure,
    errors::{Error, Result},
    register_with, Natural, Observable, Observer, Time,
};
use ql_time::{BusinessDayConvention, Calendar, Date, DayCounter, Period, Settings, TimeUnit};
use std::cell::Cell;
use std::rc::Rc;

/// Whether queries outside the domain are served.
#[derive(Debug, Default)]
pub struct Extrapolator {
    allowed: Cell<bool>,
}

impl Extrapolator {
    /// Extrapolation disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `true` if extrapolation is enabled.
    pub fn allows(&self) -> bool {
        self.allowed.get()
    }

    /// Enable or disable extrapolation.
    pub fn set(&self, allowed: bool) {
        self.allowed.set(allowed);
    }
}

/// Base capability of all term structures.
pub trait TermStructure: Observable + std::fmt::Debug {
    /// The date at which time is zero.
    fn reference_date(&self) -> Result<Date>;

    /// Day counter used for date to time conversion.
    fn day_counter(&self) -> Result<DayCounter>;

    /// Calendar used for date adjustment.
    fn calendar(&self) -> Result<Calendar>;

    /// Business days between the evaluation date and the reference date.
    fn settlement_days(&self) -> Result<Natural>;

    /// The latest date for which the structure returns values.
    fn max_date(&self) -> Result<Date>;

    /// Extrapolation flag of this structure.
    fn extrapolator(&self) -> &Extrapolator;

    /// The latest time for which the structure returns values.
    fn max_time(&self) -> Result<Time> {
        self.time_from_reference(self.max_date()?)
    }

    /// Year fraction between the reference date and `date`.
    fn time_from_reference(&self, date: Date) -> Result<Time> {
        Ok(self
            .day_counter()?
            .year_fraction(self.reference_date()?, date))
    }

    /// Return `true` if queries past the maximum date are served.
    fn allows_extrapolation(&self) -> bool {
        self.extrapolator().allows()
    }

    /// Enable extrapolation past the maximum date.
    fn enable_extrapolation(&self) {
        self.extrapolator().set(true);
    }

    /// Disable extrapolation past the maximum date.
    fn disable_extrapolation(&self) {
        self.extrapolator().set(false);
    }

    /// Check that `t` lies in the domain.
    ///
    /// # Errors
    /// * [`Error::Precondition`] for negative times;
    /// * [`Error::Extrapolation`] past the maximum time, unless `extrapolate`
    ///   is set or extrapolation is enabled.
    fn check_range(&self, t: Time, extrapolate: bool) -> Result<()> {
        ensure!(t >= 0.0, "negative time ({t}) given");
        if extrapolate || self.allows_extrapolation() {
            return Ok(());
        }
        let max = self.max_time()?;
        if t > max + 1e-12 * max.abs().max(1.0) {
            return Err(Error::Extrapolation(format!(
                "time ({t}) is past max curve time ({max})"
            )));
        }
        Ok(())
    }

    /// Check that `date` lies in the domain.
    fn check_range_date(&self, date: Date, extrapolate: bool) -> Result<()> {
        let reference = self.reference_date()?;
        ensure!(
            date >= reference,
            "date ({date}) before reference date ({reference})"
        );
        if extrapolate || self.allows_extrapolation() {
            return Ok(());
        }
        let max = self.max_date()?;
        if date > max {
            return Err(Error::Extrapolation(format!(
                "date ({date}) is past max curve date ({max})"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum ReferenceDate {
    Fixed(Date),
    Floating {
        settings: Rc<Settings>,
        settlement_days: Natural,
    },
}

/// Reference date, calendar, day counter and extrapolation flag of a
/// concrete term structure.
#[derive(Debug)]
pub struct TermStructureCore {
    reference: ReferenceDate,
    calendar: Calendar,
    day_counter: DayCounter,
    extrapolator: Extrapolator,
}

impl TermStructureCore {
    /// A structure whose reference date never moves.
    pub fn fixed(reference_date: Date, calendar: Calendar, day_counter: DayCounter) -> Self {
        Self {
            reference: ReferenceDate::Fixed(reference_date),
            calendar,
            day_counter,
            extrapolator: Extrapolator::new(),
        }
    }

    /// A structure whose reference date is `settlement_days` business days
    /// after the evaluation date of `settings`.
    ///
    /// The owner must call [`observe_settings`](Self::observe_settings) once
    /// it is wrapped in an `Rc`.
    pub fn floating(
        settings: Rc<Settings>,
        settlement_days: Natural,
        calendar: Calendar,
        day_counter: DayCounter,
    ) -> Self {
        Self {
            reference: ReferenceDate::Floating {
                settings,
                settlement_days,
            },
            calendar,
            day_counter,
            extrapolator: Extrapolator::new(),
        }
    }

    /// Register `owner` with the settings context if the reference date
    /// floats.
    pub fn observe_settings<O: Observer + 'static>(&self, owner: &Rc<O>) {
        if let ReferenceDate::Floating { settings, .. } = &self.reference {
            register_with(owner, settings.as_ref());
        }
    }

    /// Return `true` if the reference date follows the evaluation date.
    pub fn is_floating(&self) -> bool {
        matches!(self.reference, ReferenceDate::Floating { .. })
    }

    /// The settings context of a floating structure.
    pub fn settings(&self) -> Option<&Rc<Settings>> {
        match &self.reference {
            ReferenceDate::Floating { settings, .. } => Some(settings),
            ReferenceDate::Fixed(_) => None,
        }
    }

    /// The current reference date.
    pub fn reference_date(&self) -> Result<Date> {
        match &self.reference {
            ReferenceDate::Fixed(date) => Ok(*date),
            ReferenceDate::Floating {
                settings,
                settlement_days,
            } => self.calendar.advance(
                settings.evaluation_date(),
                Period::new(*settlement_days as i32, TimeUnit::Days),
                BusinessDayConvention::Following,
                false,
            ),
        }
    }

    /// Settlement days of a floating structure; zero for a fixed one.
    pub fn settlement_days(&self) -> Natural {
        match &self.reference {
            ReferenceDate::Fixed(_) => 0,
            ReferenceDate::Floating {
                settlement_days, ..
            } => *settlement_days,
        }
    }

    /// The calendar.
    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// The day counter.
    pub fn day_counter(&self) -> DayCounter {
        self.day_counter
    }

    /// The extrapolation flag.
    pub fn extrapolator(&self) -> &Extrapolator {
        &self.extrapolator
    }
}

/// Implements the [`TermStructure`] accessors other than `max_date` by
/// reading a `TermStructureCore` field.
#[macro_export]
macro_rules! delegate_to_core {
    ($core:ident) => {
        fn reference_date(&self) -> ql_core::Result<ql_time::Date> {
            self.$core.reference_date()
        }
        fn day_counter(&self) -> ql_core::Result<ql_time::DayCounter> {
            Ok(self.$core.day_counter())
        }
        fn calendar(&self) -> ql_core::Result<ql_time::Calendar> {
            Ok(self.$core.calendar())
        }
        fn settlement_days(&self) -> ql_core::Result<ql_core::Natural> {
            Ok(self.$core.settlement_days())
        }
        fn extrapolator(&self) -> &$crate::term_structure::Extrapolator {
            self.$core.extrapolator()
        }
    };
}

/// Implements the [`TermStructure`] accessors other than `max_date` by
/// forwarding to the structure behind a handle field.
#[macro_export]
macro_rules! delegate_to_handle {
    ($original:ident) => {
        fn reference_date(&self) -> ql_core::Result<ql_time::Date> {
            self.$original.current()?.reference_date()
        }
        fn day_counter(&self) -> ql_core::Result<ql_time::DayCounter> {
            self.$original.current()?.day_counter()
        }
        fn calendar(&self) -> ql_core::Result<ql_time::Calendar> {
            self.$original.current()?.calendar()
        }
        fn settlement_days(&self) -> ql_core::Result<ql_core::Natural> {
            self.$original.current()?.settlement_days()
        }
    };
}
