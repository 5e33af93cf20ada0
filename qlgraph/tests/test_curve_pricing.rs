//! Bonds and caplets priced off bootstrapped and composed curves.

use approx::assert_abs_diff_eq;
use qlgraph::prelude::*;
use qlgraph::termstructures::{
    ConstantOptionletVolatility, DepositRateHelper, SwapRateHelper, VolatilityType,
};
use std::rc::Rc;

fn today() -> Date {
    Date::from_ymd(2024, 1, 15).unwrap()
}

struct Market {
    settings: Rc<Settings>,
    quotes: Vec<Rc<SimpleQuote>>,
    curve: Rc<PiecewiseYieldCurve>,
}

fn market() -> Market {
    let settings = Rc::new(Settings::with_evaluation_date(today()));
    let quotes: Vec<Rc<SimpleQuote>> = [0.031, 0.033, 0.035, 0.037]
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
            settings.clone(),
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
            settings.clone(),
        )
        .unwrap()
    };
    let helpers = vec![
        deposit(&quotes[0], 6),
        swap(&quotes[1], 2),
        swap(&quotes[2], 5),
        swap(&quotes[3], 10),
    ];
    let curve = PiecewiseYieldCurve::floating(
        settings.clone(),
        0,
        Calendar::NullCalendar,
        helpers,
        DayCounter::Actual365Fixed,
    )
    .unwrap();
    Market {
        settings,
        quotes,
        curve,
    }
}

fn bond(settings: &Rc<Settings>, years: i32) -> Rc<ZeroCouponBond> {
    ZeroCouponBond::new(
        0,
        Calendar::NullCalendar,
        100.0,
        today() + 365 * years,
        settings.clone(),
    )
    .unwrap()
}

#[test]
fn bond_on_bootstrapped_curve_follows_swap_quotes() {
    let m = market();
    let curve: Rc<dyn YieldTermStructure> = m.curve.clone();
    let b = bond(&m.settings, 7);
    b.set_pricing_engine(DiscountingBondEngine::new(Handle::new(curve.clone())))
        .unwrap();

    let before = b.npv().unwrap();
    let maturity = today() + 365 * 7;
    assert_abs_diff_eq!(
        before,
        100.0 * curve.discount_date(maturity, false).unwrap(),
        epsilon = 1e-12
    );
    for helper in m.curve.helpers() {
        assert_abs_diff_eq!(helper.quote_error().unwrap(), 0.0, epsilon = 1e-10);
    }

    m.quotes[3].set_value(0.042).unwrap();
    assert!(!b.is_calculated());
    let after = b.npv().unwrap();
    assert!(after < before);
    for helper in m.curve.helpers() {
        assert_abs_diff_eq!(helper.quote_error().unwrap(), 0.0, epsilon = 1e-10);
    }
}

#[test]
fn spread_over_bootstrapped_curve_tracks_both_inputs() {
    let m = market();
    let base: Rc<dyn YieldTermStructure> = m.curve.clone();
    let spread = Rc::new(SimpleQuote::new(0.0));
    let spreaded: Rc<dyn YieldTermStructure> =
        ZeroSpreadedTermStructure::new(Handle::new(base.clone()), quote_handle(&spread));
    let b = bond(&m.settings, 3);
    b.set_pricing_engine(DiscountingBondEngine::new(Handle::new(spreaded)))
        .unwrap();

    let unspread = b.npv().unwrap();
    let t = base.time_from_reference(today() + 365 * 3).unwrap();
    spread.set_value(0.01).unwrap();
    assert!(!b.is_calculated());
    assert_abs_diff_eq!(b.npv().unwrap(), unspread * (-0.01 * t).exp(), epsilon = 1e-10);

    let spread_only = b.npv().unwrap();
    m.quotes[1].set_value(0.036).unwrap();
    assert!(!b.is_calculated());
    assert!((b.npv().unwrap() - spread_only).abs() > 1e-6);
}

#[test]
fn implied_curve_rolls_forward_with_evaluation_date() {
    let m = market();
    let base: Rc<dyn YieldTermStructure> = m.curve.clone();
    let implied = ImpliedTermStructure::new(Handle::new(base.clone()), today() + 365);
    let at = today() + 365 * 4;
    assert_abs_diff_eq!(
        implied.discount_date(at, false).unwrap(),
        base.discount_date(at, false).unwrap() / base.discount_date(today() + 365, false).unwrap(),
        epsilon = 1e-14
    );

    m.settings.set_evaluation_date(today() + 30).unwrap();
    assert_eq!(base.reference_date().unwrap(), today() + 30);
    assert_eq!(implied.reference_date().unwrap(), today() + 365);
    assert_abs_diff_eq!(
        implied.discount_date(at, false).unwrap(),
        base.discount_date(at, false).unwrap() / base.discount_date(today() + 365, false).unwrap(),
        epsilon = 1e-14
    );
}

#[test]
fn proxy_swaps_the_curve_behind_an_engine() {
    let m = market();
    let bootstrapped: Rc<dyn YieldTermStructure> = m.curve.clone();
    let target = RelinkableHandle::new(bootstrapped.clone());
    let proxy: Rc<dyn YieldTermStructure> = ProxyYieldTermStructure::new(target.handle());
    let b = bond(&m.settings, 5);
    b.set_pricing_engine(DiscountingBondEngine::new(Handle::new(proxy)))
        .unwrap();
    let on_bootstrap = b.npv().unwrap();

    let flat: Rc<dyn YieldTermStructure> =
        FlatForward::with_rate(today(), 0.05, DayCounter::Actual365Fixed);
    target.link_to(flat).unwrap();
    assert!(!b.is_calculated());
    assert_abs_diff_eq!(b.npv().unwrap(), 100.0 * (-0.25f64).exp(), epsilon = 1e-12);

    target.link_to(bootstrapped).unwrap();
    assert_abs_diff_eq!(b.npv().unwrap(), on_bootstrap, epsilon = 1e-14);
}

#[test]
fn caplet_on_bootstrapped_curve_reprices_on_vol_move() {
    let m = market();
    let curve: Rc<dyn YieldTermStructure> = m.curve.clone();
    let vol = Rc::new(SimpleQuote::new(0.2));
    let surface: Rc<dyn OptionletVolatilityStructure> = ConstantOptionletVolatility::floating(
        m.settings.clone(),
        0,
        Calendar::NullCalendar,
        BusinessDayConvention::Following,
        quote_handle(&vol),
        DayCounter::Actual365Fixed,
        VolatilityType::ShiftedLognormal,
        0.0,
    );
    let caplet = Caplet::new(
        CapFloorType::Cap,
        1_000_000.0,
        0.035,
        today() + 730,
        today() + 912,
        DayCounter::Actual365Fixed,
        m.settings.clone(),
    )
    .unwrap();
    caplet
        .set_pricing_engine(BlackCapletEngine::new(Handle::new(curve), Handle::new(surface)))
        .unwrap();

    let before = caplet.npv().unwrap();
    assert!(before > 0.0);
    vol.set_value(0.25).unwrap();
    assert!(caplet.npv().unwrap() > before);
    m.quotes[2].set_value(0.045).unwrap();
    assert!(!caplet.is_calculated());
    assert!(caplet.forward_rate().unwrap() > 0.035);
}
