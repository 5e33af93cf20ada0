//! Analytic caplet engine under a one-factor short-rate model.
//!
//! A caplet paying `τ·max(F − K, 0)` at `T₂` is a put on the zero bond
//! `P(T₁, T₂)` struck at `1/(1 + Kτ)`:
//!
//! ```text
//! Caplet   = (1 + Kτ) · ZBP(T₁, T₂, 1/(1 + Kτ))
//! Floorlet = (1 + Kτ) · ZBC(T₁, T₂, 1/(1 + Kτ))
//! ```

use crate::black_caplet_engine::caplet_forward;
use ql_core::{errors::Result, register_with, Observable, ObservableImpl, Observer};
use ql_instruments::{CapFloorType, CapletArguments, PricingEngine, PricingResults};
use ql_math::OptionType;
use ql_models::ShortRateModel;
use ql_termstructures::TermStructure;
use std::rc::Rc;

/// Prices caplets and floorlets off a short-rate model.
#[derive(Debug)]
pub struct AnalyticHullWhiteCapletEngine {
    model: Rc<dyn ShortRateModel>,
    observable: ObservableImpl,
}

impl AnalyticHullWhiteCapletEngine {
    /// Create an engine observing `model`.
    pub fn new(model: Rc<dyn ShortRateModel>) -> Rc<Self> {
        let engine = Rc::new(Self {
            model,
            observable: ObservableImpl::new(),
        });
        register_with(&engine, engine.model.as_ref());
        engine
    }

    /// The model prices are taken from.
    pub fn model(&self) -> &Rc<dyn ShortRateModel> {
        &self.model
    }
}

impl Observable for AnalyticHullWhiteCapletEngine {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl Observer for AnalyticHullWhiteCapletEngine {
    fn update(&self) -> Result<()> {
        self.notify_observers()
    }
}

impl PricingEngine<CapletArguments> for AnalyticHullWhiteCapletEngine {
    fn calculate(&self, args: &CapletArguments) -> Result<PricingResults> {
        let curve = self.model.term_structure().current()?;
        let fixing_time = curve.time_from_reference(args.start_date)?;
        let payment_time = curve.time_from_reference(args.end_date)?;
        let strike_factor = 1.0 + args.strike * args.accrual_time;
        let bond_option = match args.cap_floor_type {
            CapFloorType::Cap => OptionType::Put,
            CapFloorType::Floor => OptionType::Call,
        };
        let value = self.model.discount_bond_option(
            bond_option,
            1.0 / strike_factor,
            fixing_time,
            payment_time,
        )?;
        Ok(
            PricingResults::from_npv(args.notional * strike_factor * value)
                .with_result("forward", caplet_forward(curve.as_ref(), args)?),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use ql_core::{Handle, LazyObject};
    use ql_instruments::{Caplet, Instrument};
    use ql_math::Array;
    use ql_models::{CalibratedModel, HullWhite};
    use ql_termstructures::{FlatForward, YieldTermStructure};
    use ql_time::{Date, DayCounter, Settings};

    fn today() -> Date {
        Date::from_ymd(2024, 1, 15).unwrap()
    }

    fn model(sigma: f64) -> Rc<HullWhite> {
        let curve: Rc<dyn YieldTermStructure> =
            FlatForward::with_rate(today(), 0.04, DayCounter::Actual365Fixed);
        HullWhite::new(Handle::new(curve), 0.05, sigma)
    }

    fn caplet(kind: CapFloorType, strike: f64) -> Rc<Caplet> {
        Caplet::new(
            kind,
            1_000_000.0,
            strike,
            today() + 730,
            today() + 912,
            DayCounter::Actual365Fixed,
            Rc::new(Settings::with_evaluation_date(today())),
        )
        .unwrap()
    }

    #[test]
    fn vanishing_volatility_gives_intrinsic_value() {
        let engine = AnalyticHullWhiteCapletEngine::new(model(1e-12));
        let cap = caplet(CapFloorType::Cap, 0.03);
        cap.set_pricing_engine(engine).unwrap();
        let forward = cap.forward_rate().unwrap();
        let tau = 182.0 / 365.0;
        let discount = (-0.04f64 * 912.0 / 365.0).exp();
        assert_abs_diff_eq!(
            cap.npv().unwrap(),
            1_000_000.0 * tau * discount * (forward - 0.03),
            epsilon = 1e-6
        );
    }

    #[test]
    fn cap_floor_parity() {
        let engine = AnalyticHullWhiteCapletEngine::new(model(0.01));
        let cap = caplet(CapFloorType::Cap, 0.04);
        let floor = caplet(CapFloorType::Floor, 0.04);
        cap.set_pricing_engine(engine.clone()).unwrap();
        floor.set_pricing_engine(engine).unwrap();
        let forward = cap.forward_rate().unwrap();
        let tau = 182.0 / 365.0;
        let discount = (-0.04f64 * 912.0 / 365.0).exp();
        assert_abs_diff_eq!(
            cap.npv().unwrap() - floor.npv().unwrap(),
            1_000_000.0 * tau * discount * (forward - 0.04),
            epsilon = 1e-6
        );
    }

    #[test]
    fn parameter_change_reprices() {
        let hw = model(0.01);
        let engine = AnalyticHullWhiteCapletEngine::new(hw.clone());
        let cap = caplet(CapFloorType::Cap, 0.04);
        cap.set_pricing_engine(engine).unwrap();
        let before = cap.npv().unwrap();
        hw.set_params(&Array::from_vec(vec![0.05, 0.015])).unwrap();
        assert!(!cap.is_calculated());
        assert!(cap.npv().unwrap() > before);
    }

    proptest! {
        #[test]
        fn parity_holds_across_strikes_and_volatilities(
            strike in 0.005f64..0.09,
            sigma in 0.001f64..0.03,
        ) {
            let engine = AnalyticHullWhiteCapletEngine::new(model(sigma));
            let cap = caplet(CapFloorType::Cap, strike);
            let floor = caplet(CapFloorType::Floor, strike);
            cap.set_pricing_engine(engine.clone()).unwrap();
            floor.set_pricing_engine(engine).unwrap();
            let forward = cap.forward_rate().unwrap();
            let tau = 182.0 / 365.0;
            let discount = (-0.04f64 * 912.0 / 365.0).exp();
            let parity = 1_000_000.0 * tau * discount * (forward - strike);
            prop_assert!((cap.npv().unwrap() - floor.npv().unwrap() - parity).abs() < 1e-6);
        }
    }
}
