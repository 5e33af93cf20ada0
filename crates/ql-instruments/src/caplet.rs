//! `Caplet` — a single cap or floor period on a simple forward rate.

use crate::instrument::{has_occurred, Instrument, InstrumentCore};
use crate::payoff::OptionType;
use ql_core::{ensure, errors::Result, register_with, Rate, Real, Time};
use ql_time::{Date, DayCounter, Settings};
use std::rc::{Rc, Weak};

/// Cap or floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapFloorType {
    /// Pays `max(F − K, 0)`.
    Cap,
    /// Pays `max(K − F, 0)`.
    Floor,
}

impl CapFloorType {
    /// The equivalent option on the forward rate.
    pub fn option_type(self) -> OptionType {
        match self {
            CapFloorType::Cap => OptionType::Call,
            CapFloorType::Floor => OptionType::Put,
        }
    }
}

/// Arguments handed to engines pricing a [`Caplet`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapletArguments {
    /// Cap or floor.
    pub cap_floor_type: CapFloorType,
    /// Notional amount.
    pub notional: Real,
    /// Strike rate.
    pub strike: Rate,
    /// Fixing and accrual start date.
    pub start_date: Date,
    /// Accrual end and payment date.
    pub end_date: Date,
    /// Accrual period in years.
    pub accrual_time: Time,
}

/// One optionlet on the simple forward rate between two dates, fixed at the
/// start and paid at the end.
#[derive(Debug)]
pub struct Caplet {
    core: InstrumentCore<CapletArguments>,
    cap_floor_type: CapFloorType,
    notional: Real,
    strike: Rate,
    start_date: Date,
    end_date: Date,
    day_counter: DayCounter,
    settings: Rc<Settings>,
}

impl Caplet {
    /// Create a caplet or floorlet.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cap_floor_type: CapFloorType,
        notional: Real,
        strike: Rate,
        start_date: Date,
        end_date: Date,
        day_counter: DayCounter,
        settings: Rc<Settings>,
    ) -> Result<Rc<Self>> {
        ensure!(notional > 0.0, "notional ({notional}) must be positive");
        ensure!(
            end_date > start_date,
            "end date ({end_date}) must be after start date ({start_date})"
        );
        let caplet = Rc::new_cyclic(|me: &Weak<Self>| Self {
            core: InstrumentCore::new(me.clone()),
            cap_floor_type,
            notional,
            strike,
            start_date,
            end_date,
            day_counter,
            settings,
        });
        register_with(&caplet, caplet.settings.as_ref());
        Ok(caplet)
    }

    /// Cap or floor.
    pub fn cap_floor_type(&self) -> CapFloorType {
        self.cap_floor_type
    }

    /// Strike rate.
    pub fn strike(&self) -> Rate {
        self.strike
    }

    /// Notional amount.
    pub fn notional(&self) -> Real {
        self.notional
    }

    /// Fixing and accrual start date.
    pub fn start_date(&self) -> Date {
        self.start_date
    }

    /// Payment date.
    pub fn end_date(&self) -> Date {
        self.end_date
    }

    /// Forward rate the engine used.
    pub fn forward_rate(&self) -> Result<Rate> {
        self.result("forward")
    }
}

crate::instrument_plumbing!(Caplet);

impl Instrument for Caplet {
    type Arguments = CapletArguments;

    fn core(&self) -> &InstrumentCore<CapletArguments> {
        &self.core
    }

    fn arguments(&self) -> Result<CapletArguments> {
        Ok(CapletArguments {
            cap_floor_type: self.cap_floor_type,
            notional: self.notional,
            strike: self.strike,
            start_date: self.start_date,
            end_date: self.end_date,
            accrual_time: self.day_counter.year_fraction(self.start_date, self.end_date),
        })
    }

    fn is_expired(&self) -> Result<bool> {
        Ok(has_occurred(self.end_date, &self.settings))
    }
}
