//! Caplet helpers and Hull-White calibration end to end.

use approx::assert_abs_diff_eq;
use qlgraph::math::EndCriteriaType;
use qlgraph::prelude::*;
use std::rc::Rc;

fn today() -> Date {
    Date::from_ymd(2024, 1, 15).unwrap()
}

fn settings() -> Rc<Settings> {
    Rc::new(Settings::with_evaluation_date(today()))
}

fn flat(rate: f64) -> Rc<dyn YieldTermStructure> {
    FlatForward::with_rate(today(), rate, DayCounter::Actual365Fixed)
}

fn caplet_helper(
    vol: &Rc<SimpleQuote>,
    curve: Handle<dyn YieldTermStructure>,
    years: i32,
    error_type: CalibrationErrorType,
) -> Rc<CapletHelper> {
    let start = today() + 365 * years;
    CapletHelper::new(
        quote_handle(vol),
        curve,
        start,
        start + 182,
        None,
        DayCounter::Actual365Fixed,
        error_type,
        settings(),
    )
    .unwrap()
}

#[test]
fn invalid_quotes_are_excluded_unset_curves_are_not() {
    let curve = Handle::new(flat(0.03));
    let model = HullWhite::new(curve.clone(), 0.05, 0.01);
    let engine = AnalyticHullWhiteCapletEngine::new(model);

    let quoted = Rc::new(SimpleQuote::new(0.25));
    let valid = caplet_helper(&quoted, curve.clone(), 2, CalibrationErrorType::PriceError);
    valid.set_pricing_engine(engine.clone()).unwrap();
    let missing = Rc::new(SimpleQuote::empty());
    let invalid = caplet_helper(&missing, curve, 3, CalibrationErrorType::PriceError);
    invalid.set_pricing_engine(engine.clone()).unwrap();
    assert!(!invalid.quote_is_valid());

    let both: Vec<Rc<dyn CalibrationHelper>> = vec![valid.clone(), invalid];
    let only_valid: Vec<Rc<dyn CalibrationHelper>> = vec![valid.clone()];
    let expected = valid.calibration_error().unwrap().powi(2);
    assert!(expected > 0.0);
    assert_abs_diff_eq!(calibration_objective(&both, &[]).unwrap(), expected, epsilon = 1e-18);
    assert_abs_diff_eq!(
        calibration_objective(&only_valid, &[]).unwrap(),
        expected,
        epsilon = 1e-18
    );

    let unlinked = RelinkableHandle::<dyn YieldTermStructure>::empty();
    let unbound = caplet_helper(&quoted, unlinked.handle(), 2, CalibrationErrorType::PriceError);
    unbound.set_pricing_engine(engine).unwrap();
    assert!(unbound.quote_is_valid());
    assert!(matches!(unbound.model_value(), Err(Error::NotSet(_))));
    let with_unbound: Vec<Rc<dyn CalibrationHelper>> = vec![valid, unbound.clone()];
    assert!(matches!(
        calibration_objective(&with_unbound, &[]),
        Err(Error::NotSet(_))
    ));

    unlinked.link_to(flat(0.03)).unwrap();
    assert!(unbound.model_value().unwrap() > 0.0);
}

#[test]
fn helper_follows_the_linked_curve() {
    let curve = RelinkableHandle::new(flat(0.03));
    let model = HullWhite::new(curve.handle(), 0.05, 0.01);
    let engine = AnalyticHullWhiteCapletEngine::new(model);
    let vol = Rc::new(SimpleQuote::new(0.2));
    let helper = caplet_helper(&vol, curve.handle(), 2, CalibrationErrorType::PriceError);
    helper.set_pricing_engine(engine).unwrap();

    let market = helper.market_value().unwrap();
    let model_value = helper.model_value().unwrap();
    curve.link_to(flat(0.05)).unwrap();
    assert!(!helper.is_calculated());
    assert!(helper.market_value().unwrap() > market);
    // at the money the bond option is worth P(0, T_start)·(2N(v/2) − 1)
    assert!(helper.model_value().unwrap() < model_value);
}

#[test]
fn hull_white_sigma_is_recovered_from_its_own_prices() {
    let curve = Handle::new(flat(0.04));
    let truth = HullWhite::new(curve.clone(), 0.05, 0.01);
    let truth_engine = AnalyticHullWhiteCapletEngine::new(truth);

    let mut helpers = Vec::new();
    for years in 1..=5 {
        let vol = Rc::new(SimpleQuote::new(0.2));
        let helper = caplet_helper(&vol, curve.clone(), years, CalibrationErrorType::RelativePriceError);
        helper.set_pricing_engine(truth_engine.clone()).unwrap();
        let price = helper.model_value().unwrap();
        let implied = helper.implied_volatility(price, 1e-14, 500, 0.001, 4.0).unwrap();
        vol.set_value(implied).unwrap();
        assert_abs_diff_eq!(helper.calibration_error().unwrap(), 0.0, epsilon = 1e-10);
        helpers.push(helper);
    }

    let model = HullWhite::new(curve, 0.05, 0.02);
    let engine = AnalyticHullWhiteCapletEngine::new(model.clone());
    for helper in &helpers {
        helper.set_pricing_engine(engine.clone()).unwrap();
    }
    let helpers: Vec<Rc<dyn CalibrationHelper>> = helpers
        .into_iter()
        .map(|h| h as Rc<dyn CalibrationHelper>)
        .collect();
    assert!(calibration_objective(&helpers, &[]).unwrap() > 1e-4);

    let result = model
        .calibrate(
            &helpers,
            &LevenbergMarquardt::default(),
            &EndCriteria::new(200, 20, 1e-20, 1e-20, 1e-14),
            &[],
            &[true, false],
        )
        .unwrap();
    assert_eq!(model.a(), 0.05);
    assert_abs_diff_eq!(model.sigma(), 0.01, epsilon = 1e-7);
    assert_eq!(result.x[1], model.sigma());
    assert!(calibration_objective(&helpers, &[]).unwrap() < 1e-12);
    assert!(model.end_criteria().is_some());
    assert_ne!(result.end_type, EndCriteriaType::MaxIterations);
}

#[test]
fn simplex_calibration_respects_weights() {
    let curve = Handle::new(flat(0.03));
    let truth = HullWhite::new(curve.clone(), 0.05, 0.012);
    let truth_engine = AnalyticHullWhiteCapletEngine::new(truth);

    let mut helpers: Vec<Rc<dyn CalibrationHelper>> = Vec::new();
    let mut caplet_helpers = Vec::new();
    for years in [1, 3] {
        let vol = Rc::new(SimpleQuote::new(0.2));
        let helper = caplet_helper(&vol, curve.clone(), years, CalibrationErrorType::PriceError);
        helper.set_pricing_engine(truth_engine.clone()).unwrap();
        let price = helper.model_value().unwrap();
        let implied = helper.implied_volatility(price, 1e-14, 500, 0.001, 4.0).unwrap();
        vol.set_value(implied).unwrap();
        caplet_helpers.push(helper.clone());
        helpers.push(helper);
    }

    let model = HullWhite::new(curve, 0.05, 0.03);
    let engine = AnalyticHullWhiteCapletEngine::new(model.clone());
    for helper in &caplet_helpers {
        helper.set_pricing_engine(engine.clone()).unwrap();
    }
    model
        .calibrate(
            &helpers,
            &Simplex::new(0.01),
            &EndCriteria::new(2000, 200, 1e-16, 1e-18, 1e-12),
            &[1.0, 2.0],
            &[true, false],
        )
        .unwrap();
    assert_abs_diff_eq!(model.sigma(), 0.012, epsilon = 1e-5);

    assert!(matches!(
        model.calibrate(
            &helpers,
            &Simplex::new(0.01),
            &EndCriteria::default(),
            &[1.0],
            &[],
        ),
        Err(Error::Precondition(_))
    ));
}
