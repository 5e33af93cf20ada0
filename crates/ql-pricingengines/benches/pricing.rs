use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use ql_core::{Handle, RelinkableHandle};
use ql_instruments::{EuropeanOption, Instrument, OptionType};
use ql_pricingengines::AnalyticEuropeanEngine;
use ql_quotes::{quote_handle, SimpleQuote};
use ql_termstructures::{BlackConstantVol, BlackVolTermStructure, FlatForward, YieldTermStructure};
use ql_time::{Calendar, Date, DayCounter, Settings};
use std::hint::black_box;
use std::rc::Rc;

struct Market {
    spot: Rc<SimpleQuote>,
    curve: RelinkableHandle<dyn YieldTermStructure>,
    engine: Rc<AnalyticEuropeanEngine>,
    settings: Rc<Settings>,
    today: Date,
}

fn market() -> Market {
    let today = Date::from_ymd(2024, 1, 15).expect("valid date");
    let settings = Rc::new(Settings::with_evaluation_date(today));
    let spot = Rc::new(SimpleQuote::new(100.0));
    let risk_free: Rc<dyn YieldTermStructure> =
        FlatForward::with_rate(today, 0.03, DayCounter::Actual365Fixed);
    let dividend: Rc<dyn YieldTermStructure> =
        FlatForward::with_rate(today, 0.01, DayCounter::Actual365Fixed);
    let vol: Rc<dyn BlackVolTermStructure> = BlackConstantVol::with_volatility(
        today,
        Calendar::NullCalendar,
        0.2,
        DayCounter::Actual365Fixed,
    );
    let curve = RelinkableHandle::new(risk_free);
    let engine = AnalyticEuropeanEngine::new(
        quote_handle(&spot),
        Handle::new(dividend),
        curve.handle(),
        Handle::new(vol),
    );
    Market {
        spot,
        curve,
        engine,
        settings,
        today,
    }
}

fn book(market: &Market, size: usize) -> Vec<Rc<EuropeanOption>> {
    (0..size)
        .map(|i| {
            let option = EuropeanOption::vanilla(
                OptionType::Call,
                80.0 + (i % 40) as f64,
                market.today + 365,
                market.settings.clone(),
            );
            option
                .set_pricing_engine(market.engine.clone())
                .expect("engine attaches");
            option
        })
        .collect()
}

fn bench_cached_npv(c: &mut Criterion) {
    let market = market();
    let option = book(&market, 1).remove(0);
    option.npv().expect("pricing should succeed");

    c.bench_function("cached_npv", |b| {
        b.iter(|| black_box(option.npv().expect("pricing should succeed")))
    });
}

fn bench_quote_fan_out(c: &mut Criterion) {
    let market = market();
    let mut group = c.benchmark_group("spot_bump_reprice");

    for size in [1_usize, 100, 1000] {
        let options = book(&market, size);
        let mut bump = 0.0;
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                bump = if bump == 0.0 { 0.01 } else { 0.0 };
                market.spot.set_value(100.0 + bump).expect("quote accepts value");
                let total: f64 = options
                    .iter()
                    .map(|o| o.npv().expect("pricing should succeed"))
                    .sum();
                black_box(total)
            })
        });
    }
    group.finish();
}

fn bench_relink(c: &mut Criterion) {
    let market = market();
    let options = book(&market, 100);
    let low: Rc<dyn YieldTermStructure> =
        FlatForward::with_rate(market.today, 0.02, DayCounter::Actual365Fixed);
    let high: Rc<dyn YieldTermStructure> =
        FlatForward::with_rate(market.today, 0.04, DayCounter::Actual365Fixed);
    let mut flip = false;

    c.bench_function("relink_and_reprice_100", |b| {
        b.iter(|| {
            flip = !flip;
            let target = if flip { low.clone() } else { high.clone() };
            market.curve.link_to(target).expect("relink succeeds");
            let total: f64 = options
                .iter()
                .map(|o| o.npv().expect("pricing should succeed"))
                .sum();
            black_box(total)
        })
    });
}

criterion_group!(benches, bench_cached_npv, bench_quote_fan_out, bench_relink);
criterion_main!(benches);
