//! Per-session evaluation settings.
//!
//! [`Settings`] holds the **evaluation date**: the "today" against which
//! floating reference dates are computed.  It is an ordinary value rather
//! than a process-wide singleton; a pricing session creates one, shares it
//! via `Rc`, and every term structure with a floating reference date
//! observes it.  Changing the date notifies those observers synchronously,
//! before `set_evaluation_date` returns.

use crate::date::Date;
use ql_core::{Observable, ObservableImpl, Result};
use std::cell::Cell;

/// Evaluation settings for one pricing session.
#[derive(Debug, Default)]
pub struct Settings {
    evaluation_date: Cell<Option<Date>>,
    include_reference_date_events: Cell<bool>,
    observable: ObservableImpl,
}

impl Settings {
    /// Settings whose evaluation date follows the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings with a fixed evaluation date.
    pub fn with_evaluation_date(date: Date) -> Self {
        let settings = Self::default();
        settings.evaluation_date.set(Some(date));
        settings
    }

    /// The current evaluation date; today's date unless one was set.
    pub fn evaluation_date(&self) -> Date {
        self.evaluation_date.get().unwrap_or_else(Date::today)
    }

    /// Return `true` if the evaluation date was set explicitly.
    pub fn is_evaluation_date_fixed(&self) -> bool {
        self.evaluation_date.get().is_some()
    }

    /// Move the evaluation date and notify observers if it changed.
    ///
    /// Every dependent floating-reference structure has been invalidated
    /// by the time this returns.
    pub fn set_evaluation_date(&self, date: Date) -> Result<()> {
        let previous = self.evaluation_date();
        self.evaluation_date.set(Some(date));
        if previous == date {
            return Ok(());
        }
        tracing::debug!(%previous, %date, "evaluation date changed");
        self.observable.notify()
    }

    /// Go back to following the system clock.
    pub fn reset_evaluation_date(&self) -> Result<()> {
        let previous = self.evaluation_date();
        self.evaluation_date.set(None);
        if previous == self.evaluation_date() {
            return Ok(());
        }
        self.observable.notify()
    }

    /// Whether cash flows falling on the reference date count as future.
    pub fn include_reference_date_events(&self) -> bool {
        self.include_reference_date_events.get()
    }

    /// Set whether cash flows on the reference date count as future.
    pub fn set_include_reference_date_events(&self, include: bool) {
        self.include_reference_date_events.set(include);
    }
}

impl Observable for Settings {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

/// Sets an evaluation date for the lifetime of the guard and restores the
/// previous setting (notifying observers) on drop.
#[derive(Debug)]
pub struct ScopedEvaluationDate<'a> {
    settings: &'a Settings,
    saved: Option<Date>,
}

impl<'a> ScopedEvaluationDate<'a> {
    /// Set `date` on `settings` until the guard is dropped.
    pub fn new(settings: &'a Settings, date: Date) -> Result<Self> {
        let saved = settings.evaluation_date.get();
        settings.set_evaluation_date(date)?;
        Ok(Self { settings, saved })
    }
}

impl Drop for ScopedEvaluationDate<'_> {
    fn drop(&mut self) {
        let restored = match self.saved {
            Some(date) => self.settings.set_evaluation_date(date),
            None => self.settings.reset_evaluation_date(),
        };
        if let Err(e) = restored {
            tracing::warn!(error = %e, "observer failed while restoring evaluation date");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_core::{register_with, Observer};
    use std::rc::Rc;

    #[derive(Default)]
    struct Counter(Cell<u32>);

    impl Observer for Counter {
        fn update(&self) -> Result<()> {
            self.0.set(self.0.get() + 1);
            Ok(())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn defaults_to_today() {
        let settings = Settings::new();
        assert!(!settings.is_evaluation_date_fixed());
        assert_eq!(settings.evaluation_date(), Date::today());
    }

    #[test]
    fn change_notifies_once() {
        let settings = Settings::with_evaluation_date(date(2024, 1, 15));
        let counter = Rc::new(Counter::default());
        register_with(&counter, &settings);
        settings.set_evaluation_date(date(2024, 1, 16)).unwrap();
        assert_eq!(counter.0.get(), 1);
        // same date again: nothing to invalidate
        settings.set_evaluation_date(date(2024, 1, 16)).unwrap();
        assert_eq!(counter.0.get(), 1);
    }

    #[test]
    fn scoped_date_is_restored() {
        let settings = Settings::with_evaluation_date(date(2024, 1, 15));
        let counter = Rc::new(Counter::default());
        register_with(&counter, &settings);
        {
            let _guard = ScopedEvaluationDate::new(&settings, date(2025, 3, 1)).unwrap();
            assert_eq!(settings.evaluation_date(), date(2025, 3, 1));
        }
        assert_eq!(settings.evaluation_date(), date(2024, 1, 15));
        assert_eq!(counter.0.get(), 2);
    }
}
