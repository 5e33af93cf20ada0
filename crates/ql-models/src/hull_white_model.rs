//! Hull-White (extended Vasicek) model.
//!
//! ```text
//! dr = (θ(t) − a·r) dt + σ dW
//! ```
//!
//! The function `θ(t)` is chosen to exactly fit the initial yield curve,
//! which the model reads through a handle at every query.
//!
//! Discount bond price:
//! `P(t,T) = A(t,T) exp(−B(t,T) r(t))`
//!
//! where `B` is the same as Vasicek and `A` is adjusted to fit the
//! initial curve.

use crate::calibrated_model::{CalibratedModel, ModelState, Parameter};
use crate::short_rate_model::ShortRateModel;
use ql_core::{
    errors::Result, register_with, DiscountFactor, Handle, Observable, ObservableImpl, Observer,
    Rate, Real, Time,
};
use ql_math::{black_formula, OptionType, PositiveConstraint};
use ql_termstructures::YieldTermStructure;
use std::rc::Rc;

/// Hull-White one-factor model.
#[derive(Debug)]
pub struct HullWhite {
    state: ModelState,
    term_structure: Handle<dyn YieldTermStructure>,
}

impl HullWhite {
    /// Create a model with mean reversion `a` and volatility `sigma`, fitted
    /// to `term_structure`.
    pub fn new(term_structure: Handle<dyn YieldTermStructure>, a: Real, sigma: Real) -> Rc<Self> {
        let model = Rc::new(Self {
            state: ModelState::new(vec![
                Parameter::new(vec![a], PositiveConstraint),
                Parameter::new(vec![sigma], PositiveConstraint),
            ]),
            term_structure,
        });
        register_with(&model, &model.term_structure);
        model
    }

    /// Mean-reversion speed.
    pub fn a(&self) -> Real {
        self.state.value(0)
    }

    /// Short-rate volatility.
    pub fn sigma(&self) -> Real {
        self.state.value(1)
    }

    /// `B(t,T) = (1 - exp(-a(T-t)))/a`
    pub fn b_function(&self, t: Time, big_t: Time) -> Real {
        let a = self.a();
        let tau = big_t - t;
        if a < f64::EPSILON.sqrt() {
            tau
        } else {
            (1.0 - (-a * tau).exp()) / a
        }
    }

    /// `A(t,T)`, fitted to the current curve:
    ///
    /// `A(t,T) = P(0,T)/P(0,t) · exp(B(t,T)·f(0,t) − σ²/4 · B(t,T)² · B(0,2t))`
    pub fn a_function(&self, t: Time, big_t: Time) -> Result<Real> {
        let curve = self.term_structure.current()?;
        let discount_t = curve.discount(t, true)?;
        let discount_big_t = curve.discount(big_t, true)?;
        let forward = curve.instantaneous_forward(t, true)?;
        let b = self.b_function(t, big_t);
        let temp = self.sigma() * b;
        let value = b * forward - 0.25 * temp * temp * self.b_function(0.0, 2.0 * t);
        Ok(value.exp() * discount_big_t / discount_t)
    }
}

impl Observable for HullWhite {
    fn observable_impl(&self) -> &ObservableImpl {
        self.state.observers()
    }
}

impl Observer for HullWhite {
    fn update(&self) -> Result<()> {
        self.generate_arguments()?;
        self.notify_observers()
    }
}

impl CalibratedModel for HullWhite {
    fn model_state(&self) -> &ModelState {
        &self.state
    }
}

impl ShortRateModel for HullWhite {
    fn term_structure(&self) -> &Handle<dyn YieldTermStructure> {
        &self.term_structure
    }

    fn discount_bond(&self, now: Time, maturity: Time, rate: Rate) -> Result<DiscountFactor> {
        Ok(self.a_function(now, maturity)? * (-self.b_function(now, maturity) * rate).exp())
    }

    fn discount_bond_option(
        &self,
        option_type: OptionType,
        strike: Real,
        maturity: Time,
        bond_maturity: Time,
    ) -> Result<Real> {
        let a = self.a();
        let b = self.b_function(maturity, bond_maturity);
        let v = if a < f64::EPSILON.sqrt() {
            self.sigma() * b * maturity.sqrt()
        } else {
            self.sigma() * b * (0.5 * (1.0 - (-2.0 * a * maturity).exp()) / a).sqrt()
        };
        let curve = self.term_structure.current()?;
        let f = curve.discount(bond_maturity, true)?;
        let k = curve.discount(maturity, true)? * strike;
        black_formula(option_type, k, f, v, 1.0, 0.0)
    }
}
