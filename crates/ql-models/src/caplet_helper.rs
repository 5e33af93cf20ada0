//! `CapletHelper` — a caplet quoted as a flat volatility, used to calibrate
//! short-rate models.
//!
//! The helper observes its volatility quote and its discount curve.  On
//! recalculation it rebuilds the caplet from the curve currently linked to
//! the handle and reprices the market value from the quoted volatility; the
//! model value is whatever the assigned engine says the caplet is worth.

use crate::calibration_helper::{
    BlackCalibrationHelper, CalibrationErrorType, CalibrationHelper,
};
use ql_core::{
    ensure,
    errors::{Error, Result},
    register_with, Handle, LazyObject, LazyState, Observable, ObservableImpl, Observer, Rate,
    Real, Volatility,
};
use ql_instruments::{CapFloorType, Caplet, CapletArguments, Instrument, PricingEngine};
use ql_math::{bachelier_formula, black_formula};
use ql_quotes::{Quote, QuoteHandleExt};
use ql_termstructures::{TermStructure, VolatilityType, YieldTermStructure};
use ql_time::{Date, DayCounter, Settings};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Calibration helper for a single caplet (or floorlet).
#[derive(Debug)]
pub struct CapletHelper {
    lazy: LazyState,
    volatility: Handle<dyn Quote>,
    term_structure: Handle<dyn YieldTermStructure>,
    cap_floor_type: CapFloorType,
    start_date: Date,
    end_date: Date,
    strike: Option<Rate>,
    day_counter: DayCounter,
    error_type: CalibrationErrorType,
    volatility_type: Cell<VolatilityType>,
    shift: Cell<Real>,
    settings: Rc<Settings>,
    engine: RefCell<Option<Rc<dyn PricingEngine<CapletArguments>>>>,
    caplet: RefCell<Option<Rc<Caplet>>>,
    market_value: Cell<Real>,
}

impl CapletHelper {
    /// A shifted-lognormal caplet helper fixing at `start_date` and paying
    /// at `end_date`.  Without a `strike` the caplet is struck at the money,
    /// on the forward read from the current curve.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        volatility: Handle<dyn Quote>,
        term_structure: Handle<dyn YieldTermStructure>,
        start_date: Date,
        end_date: Date,
        strike: Option<Rate>,
        day_counter: DayCounter,
        error_type: CalibrationErrorType,
        settings: Rc<Settings>,
    ) -> Result<Rc<Self>> {
        ensure!(
            end_date > start_date,
            "end date ({end_date}) must be after start date ({start_date})"
        );
        let helper = Rc::new(Self {
            lazy: LazyState::new(),
            volatility,
            term_structure,
            cap_floor_type: CapFloorType::Cap,
            start_date,
            end_date,
            strike,
            day_counter,
            error_type,
            volatility_type: Cell::new(VolatilityType::ShiftedLognormal),
            shift: Cell::new(0.0),
            settings,
            engine: RefCell::new(None),
            caplet: RefCell::new(None),
            market_value: Cell::new(0.0),
        });
        register_with(&helper, &helper.volatility);
        register_with(&helper, &helper.term_structure);
        Ok(helper)
    }

    /// Change the quoting convention of the volatility; `shift` is the
    /// displacement used for shifted-lognormal quotes.
    pub fn with_volatility_type(
        self: Rc<Self>,
        volatility_type: VolatilityType,
        shift: Real,
    ) -> Result<Rc<Self>> {
        self.volatility_type.set(volatility_type);
        self.shift.set(shift);
        self.lazy_update()?;
        Ok(self)
    }

    /// The term-structure handle the caplet is built from.
    pub fn term_structure(&self) -> &Handle<dyn YieldTermStructure> {
        &self.term_structure
    }

    /// Engine used for [`model_value`](BlackCalibrationHelper::model_value).
    pub fn set_pricing_engine(&self, engine: Rc<dyn PricingEngine<CapletArguments>>) -> Result<()> {
        if let Some(caplet) = self.caplet.borrow().as_ref() {
            caplet.set_pricing_engine(engine.clone())?;
        }
        *self.engine.borrow_mut() = Some(engine);
        Ok(())
    }

    /// The caplet as of the last recalculation.
    pub fn caplet(&self) -> Result<Rc<Caplet>> {
        self.calculate()?;
        self.caplet
            .borrow()
            .clone()
            .ok_or_else(|| Error::NotSet("caplet".into()))
    }

    fn strike_on(&self, curve: &dyn YieldTermStructure) -> Result<Rate> {
        match self.strike {
            Some(strike) => Ok(strike),
            None => {
                let tau = self.day_counter.year_fraction(self.start_date, self.end_date);
                let start = curve.discount_date(self.start_date, false)?;
                let end = curve.discount_date(self.end_date, false)?;
                Ok((start / end - 1.0) / tau)
            }
        }
    }
}

impl Observable for CapletHelper {
    fn observable_impl(&self) -> &ObservableImpl {
        self.lazy.observers()
    }
}

impl Observer for CapletHelper {
    fn update(&self) -> Result<()> {
        self.lazy_update()
    }
}

impl LazyObject for CapletHelper {
    fn lazy_state(&self) -> &LazyState {
        &self.lazy
    }

    fn perform_calculations(&self) -> Result<()> {
        let curve = self.term_structure.current()?;
        let caplet = Caplet::new(
            self.cap_floor_type,
            1.0,
            self.strike_on(curve.as_ref())?,
            self.start_date,
            self.end_date,
            self.day_counter,
            self.settings.clone(),
        )?;
        if let Some(engine) = self.engine.borrow().clone() {
            caplet.set_pricing_engine(engine)?;
        }
        *self.caplet.borrow_mut() = Some(caplet);
        self.market_value
            .set(self.black_price(self.volatility.value()?)?);
        Ok(())
    }
}

impl CalibrationHelper for CapletHelper {
    fn calibration_error(&self) -> Result<Real> {
        self.black_calibration_error()
    }

    fn quote_is_valid(&self) -> bool {
        self.volatility.is_valid()
    }
}

impl BlackCalibrationHelper for CapletHelper {
    fn volatility(&self) -> &Handle<dyn Quote> {
        &self.volatility
    }

    fn volatility_type(&self) -> VolatilityType {
        self.volatility_type.get()
    }

    fn error_type(&self) -> CalibrationErrorType {
        self.error_type
    }

    fn market_value(&self) -> Result<Real> {
        self.calculate()?;
        Ok(self.market_value.get())
    }

    fn model_value(&self) -> Result<Real> {
        self.caplet()?.npv()
    }

    fn black_price(&self, volatility: Volatility) -> Result<Real> {
        let curve = self.term_structure.current()?;
        let strike = self.strike_on(curve.as_ref())?;
        let tau = self.day_counter.year_fraction(self.start_date, self.end_date);
        let start = curve.discount_date(self.start_date, false)?;
        let discount = curve.discount_date(self.end_date, false)?;
        let forward = (start / discount - 1.0) / tau;
        let fixing_time = curve.time_from_reference(self.start_date)?;
        let std_dev = volatility * fixing_time.max(0.0).sqrt();
        let option_type = self.cap_floor_type.option_type();
        let unit = match self.volatility_type.get() {
            VolatilityType::ShiftedLognormal => {
                black_formula(option_type, strike, forward, std_dev, discount, self.shift.get())?
            }
            VolatilityType::Normal => {
                bachelier_formula(option_type, strike, forward, std_dev, discount)?
            }
        };
        Ok(tau * unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_core::RelinkableHandle;
    use ql_instruments::PricingResults;
    use ql_quotes::{quote_handle, SimpleQuote};
    use crate::calibration_helper::{helper_residuals, CALIBRATION_PENALTY};
    use ql_termstructures::{DepositRateHelper, FlatForward, PiecewiseYieldCurve, RateHelper};
    use ql_time::{BusinessDayConvention, Calendar, Period, TimeUnit};

    fn today() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn flat(rate: Rate) -> Rc<dyn YieldTermStructure> {
        FlatForward::with_rate(today(), rate, DayCounter::Actual365Fixed)
    }

    fn helper(
        vol: &Rc<SimpleQuote>,
        curve: Handle<dyn YieldTermStructure>,
        strike: Option<Rate>,
    ) -> Rc<CapletHelper> {
        CapletHelper::new(
            quote_handle(vol),
            curve,
            today() + 365,
            today() + 547,
            strike,
            DayCounter::Actual365Fixed,
            CalibrationErrorType::PriceError,
            Rc::new(Settings::with_evaluation_date(today())),
        )
        .unwrap()
    }

    #[derive(Debug, Default)]
    struct Fixed {
        npv: Cell<Real>,
        observable: ObservableImpl,
    }

    impl Observable for Fixed {
        fn observable_impl(&self) -> &ObservableImpl {
            &self.observable
        }
    }

    impl PricingEngine<CapletArguments> for Fixed {
        fn calculate(&self, _: &CapletArguments) -> Result<PricingResults> {
            Ok(PricingResults::from_npv(self.npv.get()))
        }
    }

    #[test]
    fn at_the_money_strike_follows_curve() {
        let vol = Rc::new(SimpleQuote::new(0.2));
        let curve = RelinkableHandle::<dyn YieldTermStructure>::new(flat(0.03));
        let h = helper(&vol, curve.handle(), None);
        let tau = 182.0 / 365.0;
        assert_abs_diff_eq!(
            h.caplet().unwrap().strike(),
            ((0.03f64 * tau).exp() - 1.0) / tau,
            epsilon = 1e-14
        );
        curve.link_to(flat(0.05)).unwrap();
        assert!(!h.is_calculated());
        assert_abs_diff_eq!(
            h.caplet().unwrap().strike(),
            ((0.05f64 * tau).exp() - 1.0) / tau,
            epsilon = 1e-14
        );
    }

    #[test]
    fn market_value_tracks_volatility_quote() {
        let vol = Rc::new(SimpleQuote::new(0.2));
        let h = helper(&vol, Handle::new(flat(0.03)), Some(0.03));
        let low = h.market_value().unwrap();
        vol.set_value(0.25).unwrap();
        let high = h.market_value().unwrap();
        assert!(high > low);
        assert_eq!(high, h.black_price(0.25).unwrap());
    }

    #[test]
    fn implied_volatility_inverts_market_value() {
        let vol = Rc::new(SimpleQuote::new(0.2));
        let h = helper(&vol, Handle::new(flat(0.03)), None);
        let target = h.market_value().unwrap();
        let implied = h.implied_volatility(target, 1e-12, 200, 0.001, 4.0).unwrap();
        assert_abs_diff_eq!(implied, 0.2, epsilon = 1e-9);
    }

    #[test]
    fn model_value_comes_from_the_engine() {
        let vol = Rc::new(SimpleQuote::new(0.2));
        let h = helper(&vol, Handle::new(flat(0.03)), Some(0.03));
        assert!(matches!(h.model_value(), Err(Error::NotSet(_))));
        let engine = Rc::new(Fixed::default());
        engine.npv.set(0.004);
        h.set_pricing_engine(engine.clone()).unwrap();
        assert_eq!(h.model_value().unwrap(), 0.004);
        let market = h.market_value().unwrap();
        assert_abs_diff_eq!(h.calibration_error().unwrap(), 0.004 - market, epsilon = 1e-15);

        engine.npv.set(0.005);
        engine.notify_observers().unwrap();
        assert_eq!(h.model_value().unwrap(), 0.005);
    }

    #[test]
    fn unset_curve_is_structural() {
        let vol = Rc::new(SimpleQuote::new(0.2));
        let curve = RelinkableHandle::<dyn YieldTermStructure>::empty();
        let h = helper(&vol, curve.handle(), None);
        assert!(h.quote_is_valid());
        assert!(matches!(h.model_value(), Err(Error::NotSet(_))));
        assert!(matches!(h.calibration_error(), Err(Error::NotSet(_))));
    }

    #[test]
    fn empty_quote_is_invalid() {
        let vol = Rc::new(SimpleQuote::empty());
        let h = helper(&vol, Handle::new(flat(0.03)), None);
        assert!(!h.quote_is_valid());
        vol.set_value(0.2).unwrap();
        assert!(h.quote_is_valid());
    }

    #[test]
    fn normal_quotes_price_with_bachelier() {
        let vol = Rc::new(SimpleQuote::new(0.01));
        let h = helper(&vol, Handle::new(flat(0.03)), Some(0.03))
            .with_volatility_type(VolatilityType::Normal, 0.0)
            .unwrap();
        assert_eq!(h.volatility_type(), VolatilityType::Normal);
        assert!(h.market_value().unwrap() > 0.0);
    }

    #[test]
    fn failed_bootstrap_is_penalised_not_fatal() {
        let rate = Rc::new(SimpleQuote::new(0.03));
        let deposit: Rc<dyn RateHelper> = DepositRateHelper::new(
            quote_handle(&rate),
            Period::new(2, TimeUnit::Years),
            0,
            Calendar::NullCalendar,
            BusinessDayConvention::Following,
            false,
            DayCounter::Actual360,
            Rc::new(Settings::with_evaluation_date(today())),
        );
        let curve: Rc<dyn YieldTermStructure> =
            PiecewiseYieldCurve::new(today(), vec![deposit], DayCounter::Actual365Fixed).unwrap();
        let vol = Rc::new(SimpleQuote::new(0.2));
        let h = helper(&vol, Handle::new(curve), None);
        let engine = Rc::new(Fixed::default());
        engine.npv.set(0.001);
        h.set_pricing_engine(engine).unwrap();
        let helpers: Vec<Rc<dyn CalibrationHelper>> = vec![h.clone()];
        let healthy = helper_residuals(&helpers, &[]).unwrap();
        assert_ne!(healthy[0], CALIBRATION_PENALTY);

        // no zero rate prices a deposit below -1/τ
        rate.set_value(-10.0).unwrap();
        assert!(matches!(h.market_value(), Err(Error::NotConverged(_))));
        assert_eq!(helper_residuals(&helpers, &[]).unwrap(), vec![CALIBRATION_PENALTY]);

        rate.set_value(0.03).unwrap();
        assert_eq!(helper_residuals(&helpers, &[]).unwrap(), healthy);
    }
}
