//! Analytic European option engine (Black-Scholes-Merton).
//!
//! Prices European vanilla options in closed form from a spot quote, a
//! dividend curve, a risk-free curve and a Black volatility structure, all
//! held through handles and read at calculation time.

use ql_core::{
    errors::Result, register_with, Handle, Observable, ObservableImpl, Observer, Real, Time,
};
use ql_instruments::{EuropeanOptionArguments, OptionType, PricingEngine, PricingResults};
use ql_math::{black_formula, normal_cdf, normal_pdf};
use ql_quotes::{Quote, QuoteHandleExt};
use ql_termstructures::{BlackVolTermStructure, TermStructure, YieldTermStructure};
use std::rc::Rc;

/// Price and first/second-order sensitivities of a European option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlackScholesGreeks {
    /// Present value.
    pub value: Real,
    /// ∂V/∂S.
    pub delta: Real,
    /// ∂²V/∂S².
    pub gamma: Real,
    /// ∂V/∂σ, per unit of volatility.
    pub vega: Real,
    /// ∂V/∂r, per unit of rate.
    pub rho: Real,
}

/// Black-Scholes-Merton value and Greeks from discount factors and total
/// standard deviation.
///
/// `vol_time` scales vega and `rate_time` scales rho; they differ when the
/// volatility and the risk-free curve use different day counters.
#[allow(clippy::too_many_arguments)]
pub fn black_scholes_merton(
    option_type: OptionType,
    spot: Real,
    strike: Real,
    risk_free_discount: Real,
    dividend_discount: Real,
    std_dev: Real,
    vol_time: Time,
    rate_time: Time,
) -> Result<BlackScholesGreeks> {
    let phi = option_type.sign();
    let forward = spot * dividend_discount / risk_free_discount;
    let value = black_formula(option_type, strike, forward, std_dev, risk_free_discount, 0.0)?;

    if std_dev <= 1e-15 || strike <= 0.0 {
        let in_the_money = phi * (forward - strike) > 0.0;
        let (delta, rho) = if in_the_money {
            (
                phi * dividend_discount,
                phi * strike * rate_time * risk_free_discount,
            )
        } else {
            (0.0, 0.0)
        };
        return Ok(BlackScholesGreeks {
            value,
            delta,
            gamma: 0.0,
            vega: 0.0,
            rho,
        });
    }

    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    let npd1 = normal_pdf(d1);
    Ok(BlackScholesGreeks {
        value,
        delta: phi * dividend_discount * normal_cdf(phi * d1),
        gamma: dividend_discount * npd1 / (spot * std_dev),
        vega: spot * dividend_discount * npd1 * vol_time.sqrt(),
        rho: phi * strike * rate_time * risk_free_discount * normal_cdf(phi * d2),
    })
}

/// Analytic pricing engine for European vanilla options.
///
/// $$C = S e^{-qT} N(d_1) - K e^{-rT} N(d_2)$$
/// $$P = K e^{-rT} N(-d_2) - S e^{-qT} N(-d_1)$$
#[derive(Debug)]
pub struct AnalyticEuropeanEngine {
    spot: Handle<dyn Quote>,
    dividend_yield: Handle<dyn YieldTermStructure>,
    risk_free_rate: Handle<dyn YieldTermStructure>,
    volatility: Handle<dyn BlackVolTermStructure>,
    observable: ObservableImpl,
}

impl AnalyticEuropeanEngine {
    /// Create an engine observing all of its market inputs.
    pub fn new(
        spot: Handle<dyn Quote>,
        dividend_yield: Handle<dyn YieldTermStructure>,
        risk_free_rate: Handle<dyn YieldTermStructure>,
        volatility: Handle<dyn BlackVolTermStructure>,
    ) -> Rc<Self> {
        let engine = Rc::new(Self {
            spot,
            dividend_yield,
            risk_free_rate,
            volatility,
            observable: ObservableImpl::new(),
        });
        register_with(&engine, &engine.spot);
        register_with(&engine, &engine.dividend_yield);
        register_with(&engine, &engine.risk_free_rate);
        register_with(&engine, &engine.volatility);
        engine
    }
}

impl Observable for AnalyticEuropeanEngine {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl Observer for AnalyticEuropeanEngine {
    fn update(&self) -> Result<()> {
        self.notify_observers()
    }
}

impl PricingEngine<EuropeanOptionArguments> for AnalyticEuropeanEngine {
    fn calculate(&self, args: &EuropeanOptionArguments) -> Result<PricingResults> {
        let spot = self.spot.value()?;
        ql_core::ensure!(spot > 0.0, "negative or null underlying given");
        let strike = args.payoff.strike;
        let expiry = args.expiry;

        let risk_free = self.risk_free_rate.current()?;
        let dividend = self.dividend_yield.current()?;
        let volatility = self.volatility.current()?;

        let variance = volatility.black_variance_date(expiry, strike, false)?;
        let greeks = black_scholes_merton(
            args.payoff.option_type,
            spot,
            strike,
            risk_free.discount_date(expiry, false)?,
            dividend.discount_date(expiry, false)?,
            variance.sqrt(),
            volatility.time_from_reference(expiry)?,
            risk_free.time_from_reference(expiry)?,
        )?;

        Ok(PricingResults::from_npv(greeks.value)
            .with_result("delta", greeks.delta)
            .with_result("gamma", greeks.gamma)
            .with_result("vega", greeks.vega)
            .with_result("rho", greeks.rho))
    }
}
