//! Black/Bachelier caplet engine.
//!
//! Prices a single caplet or floorlet from a discount curve and an optionlet
//! volatility structure.  Shifted-lognormal volatilities go through the
//! Black formula, normal volatilities through Bachelier.

use ql_core::{
    errors::Result, register_with, Handle, Observable, ObservableImpl, Observer, Rate, Real,
};
use ql_instruments::{CapletArguments, PricingEngine, PricingResults};
use ql_math::{bachelier_formula, black_formula};
use ql_termstructures::{
    OptionletVolatilityStructure, TermStructure, VolatilityType, YieldTermStructure,
};
use std::rc::Rc;

/// Simple forward rate between the caplet's accrual dates.
pub(crate) fn caplet_forward(curve: &dyn YieldTermStructure, args: &CapletArguments) -> Result<Rate> {
    let start = curve.discount_date(args.start_date, false)?;
    let end = curve.discount_date(args.end_date, false)?;
    Ok((start / end - 1.0) / args.accrual_time)
}

/// Market-model engine for caplets and floorlets.
#[derive(Debug)]
pub struct BlackCapletEngine {
    discount_curve: Handle<dyn YieldTermStructure>,
    volatility: Handle<dyn OptionletVolatilityStructure>,
    observable: ObservableImpl,
}

impl BlackCapletEngine {
    /// Create an engine observing both of its inputs.
    pub fn new(
        discount_curve: Handle<dyn YieldTermStructure>,
        volatility: Handle<dyn OptionletVolatilityStructure>,
    ) -> Rc<Self> {
        let engine = Rc::new(Self {
            discount_curve,
            volatility,
            observable: ObservableImpl::new(),
        });
        register_with(&engine, &engine.discount_curve);
        register_with(&engine, &engine.volatility);
        engine
    }
}

impl Observable for BlackCapletEngine {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl Observer for BlackCapletEngine {
    fn update(&self) -> Result<()> {
        self.notify_observers()
    }
}

impl PricingEngine<CapletArguments> for BlackCapletEngine {
    fn calculate(&self, args: &CapletArguments) -> Result<PricingResults> {
        let curve = self.discount_curve.current()?;
        let volatility = self.volatility.current()?;

        let forward = caplet_forward(curve.as_ref(), args)?;
        let discount = curve.discount_date(args.end_date, false)?;
        let fixing_time = volatility.time_from_reference(args.start_date)?;
        let std_dev: Real = if fixing_time > 0.0 {
            volatility.black_variance(fixing_time, args.strike, false)?.sqrt()
        } else {
            0.0
        };

        let option_type = args.cap_floor_type.option_type();
        let unit_value = match volatility.volatility_type() {
            VolatilityType::ShiftedLognormal => black_formula(
                option_type,
                args.strike,
                forward,
                std_dev,
                discount,
                volatility.displacement(),
            )?,
            VolatilityType::Normal => {
                bachelier_formula(option_type, args.strike, forward, std_dev, discount)?
            }
        };
        let npv = args.notional * args.accrual_time * unit_value;
        Ok(PricingResults::from_npv(npv)
            .with_result("forward", forward)
            .with_result("std_dev", std_dev))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_core::LazyObject;
    use ql_instruments::{CapFloorType, Caplet, Instrument};
    use ql_quotes::{quote_handle, SimpleQuote};
    use ql_termstructures::{ConstantOptionletVolatility, FlatForward};
    use ql_time::{BusinessDayConvention, Calendar, Date, DayCounter, Settings};

    fn today() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn setup(vol: &Rc<SimpleQuote>, vol_type: VolatilityType) -> Rc<BlackCapletEngine> {
        let settings = Rc::new(Settings::with_evaluation_date(today()));
        let curve: Rc<dyn YieldTermStructure> =
            FlatForward::with_rate(today(), 0.04, DayCounter::Actual365Fixed);
        let surface: Rc<dyn OptionletVolatilityStructure> = ConstantOptionletVolatility::floating(
            settings,
            0,
            Calendar::NullCalendar,
            BusinessDayConvention::Following,
            quote_handle(vol),
            DayCounter::Actual365Fixed,
            vol_type,
            0.0,
        );
        BlackCapletEngine::new(Handle::new(curve), Handle::new(surface))
    }

    fn caplet(kind: CapFloorType, strike: Rate) -> Rc<Caplet> {
        let settings = Rc::new(Settings::with_evaluation_date(today()));
        Caplet::new(
            kind,
            10_000.0,
            strike,
            today() + 365,
            today() + 547,
            DayCounter::Actual365Fixed,
            settings,
        )
        .unwrap()
    }

    #[test]
    fn cap_floor_parity() {
        let vol = Rc::new(SimpleQuote::new(0.2));
        let engine = setup(&vol, VolatilityType::ShiftedLognormal);
        let cap = caplet(CapFloorType::Cap, 0.04);
        let floor = caplet(CapFloorType::Floor, 0.04);
        cap.set_pricing_engine(engine.clone()).unwrap();
        floor.set_pricing_engine(engine).unwrap();

        let forward = cap.forward_rate().unwrap();
        let tau = 182.0 / 365.0;
        let discount = (-0.04f64 * 547.0 / 365.0).exp();
        assert_abs_diff_eq!(forward, ((0.04f64 * tau).exp() - 1.0) / tau, epsilon = 1e-14);
        assert_abs_diff_eq!(
            cap.npv().unwrap() - floor.npv().unwrap(),
            10_000.0 * tau * discount * (forward - 0.04),
            epsilon = 1e-10
        );
    }

    #[test]
    fn vol_quote_move_reprices() {
        let vol = Rc::new(SimpleQuote::new(0.2));
        let engine = setup(&vol, VolatilityType::ShiftedLognormal);
        let cap = caplet(CapFloorType::Cap, 0.045);
        cap.set_pricing_engine(engine).unwrap();
        let before = cap.npv().unwrap();
        vol.set_value(0.3).unwrap();
        assert!(!cap.is_calculated());
        assert!(cap.npv().unwrap() > before);
        assert_abs_diff_eq!(cap.result("std_dev").unwrap(), 0.3, epsilon = 1e-14);
    }

    #[test]
    fn normal_volatilities_use_bachelier() {
        let vol = Rc::new(SimpleQuote::new(0.01));
        let engine = setup(&vol, VolatilityType::Normal);
        let cap = caplet(CapFloorType::Cap, 0.0);
        cap.set_pricing_engine(engine).unwrap();
        let forward = cap.forward_rate().unwrap();
        let tau = 182.0 / 365.0;
        let discount = (-0.04f64 * 547.0 / 365.0).exp();
        let expected = 10_000.0
            * tau
            * bachelier_formula(ql_math::OptionType::Call, 0.0, forward, 0.01, discount).unwrap();
        assert_abs_diff_eq!(cap.npv().unwrap(), expected, epsilon = 1e-10);
    }
}
