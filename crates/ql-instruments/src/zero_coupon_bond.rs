//! Zero-coupon bond: a single redemption at maturity.

use crate::instrument::{has_occurred, Instrument, InstrumentCore};
use ql_core::{ensure, errors::Result, register_with, Natural, Real};
use ql_time::{BusinessDayConvention, Calendar, Date, Period, Settings, TimeUnit};
use std::rc::{Rc, Weak};

/// Arguments handed to engines pricing a [`ZeroCouponBond`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZeroCouponBondArguments {
    /// Redemption amount.
    pub face_amount: Real,
    /// Redemption date.
    pub maturity_date: Date,
    /// Settlement date as of the current evaluation date.
    pub settlement_date: Date,
}

/// A bond paying its face amount at maturity.
#[derive(Debug)]
pub struct ZeroCouponBond {
    core: InstrumentCore<ZeroCouponBondArguments>,
    settlement_days: Natural,
    calendar: Calendar,
    face_amount: Real,
    maturity_date: Date,
    settings: Rc<Settings>,
}

impl ZeroCouponBond {
    /// Create a bond settling `settlement_days` business days after the
    /// evaluation date.
    pub fn new(
        settlement_days: Natural,
        calendar: Calendar,
        face_amount: Real,
        maturity_date: Date,
        settings: Rc<Settings>,
    ) -> Result<Rc<Self>> {
        ensure!(face_amount > 0.0, "face amount ({face_amount}) must be positive");
        let bond = Rc::new_cyclic(|me: &Weak<Self>| Self {
            core: InstrumentCore::new(me.clone()),
            settlement_days,
            calendar,
            face_amount,
            maturity_date,
            settings,
        });
        register_with(&bond, bond.settings.as_ref());
        Ok(bond)
    }

    /// Redemption amount.
    pub fn face_amount(&self) -> Real {
        self.face_amount
    }

    /// Redemption date.
    pub fn maturity_date(&self) -> Date {
        self.maturity_date
    }

    /// Settlement date for the current evaluation date.
    pub fn settlement_date(&self) -> Result<Date> {
        self.calendar.advance(
            self.settings.evaluation_date(),
            Period::new(self.settlement_days as i32, TimeUnit::Days),
            BusinessDayConvention::Following,
            false,
        )
    }

    /// Value at settlement.
    pub fn settlement_value(&self) -> Result<Real> {
        self.result("settlement_value")
    }

    /// Settlement value per 100 of face.
    pub fn clean_price(&self) -> Result<Real> {
        Ok(self.settlement_value()? / self.face_amount * 100.0)
    }
}

crate::instrument_plumbing!(ZeroCouponBond);

impl Instrument for ZeroCouponBond {
    type Arguments = ZeroCouponBondArguments;

    fn core(&self) -> &InstrumentCore<ZeroCouponBondArguments> {
        &self.core
    }

    fn arguments(&self) -> Result<ZeroCouponBondArguments> {
        Ok(ZeroCouponBondArguments {
            face_amount: self.face_amount,
            maturity_date: self.maturity_date,
            settlement_date: self.settlement_date()?,
        })
    }

    fn is_expired(&self) -> Result<bool> {
        Ok(has_occurred(self.maturity_date, &self.settings))
    }
}
