//! Discounting bond pricing engine.
//!
//! Prices a zero-coupon bond by discounting its redemption on a yield curve
//! held through a handle.

use ql_core::{errors::Result, register_with, Handle, Observable, ObservableImpl, Observer};
use ql_instruments::{PricingEngine, PricingResults, ZeroCouponBondArguments};
use ql_termstructures::YieldTermStructure;
use std::rc::Rc;

/// Discounting bond pricing engine.
///
/// $$\text{NPV} = F \cdot d(T)$$
///
/// valued at the curve's reference date; the settlement value divides by
/// the settlement discount factor.
#[derive(Debug)]
pub struct DiscountingBondEngine {
    discount_curve: Handle<dyn YieldTermStructure>,
    observable: ObservableImpl,
}

impl DiscountingBondEngine {
    /// Create an engine discounting on `discount_curve`.
    pub fn new(discount_curve: Handle<dyn YieldTermStructure>) -> Rc<Self> {
        let engine = Rc::new(Self {
            discount_curve,
            observable: ObservableImpl::new(),
        });
        register_with(&engine, &engine.discount_curve);
        engine
    }

    /// The discount curve handle.
    pub fn discount_curve(&self) -> &Handle<dyn YieldTermStructure> {
        &self.discount_curve
    }
}

impl Observable for DiscountingBondEngine {
    fn observable_impl(&self) -> &ObservableImpl {
        &self.observable
    }
}

impl Observer for DiscountingBondEngine {
    fn update(&self) -> Result<()> {
        self.notify_observers()
    }
}

impl PricingEngine<ZeroCouponBondArguments> for DiscountingBondEngine {
    fn calculate(&self, args: &ZeroCouponBondArguments) -> Result<PricingResults> {
        let curve = self.discount_curve.current()?;
        let npv = args.face_amount * curve.discount_date(args.maturity_date, false)?;
        let settlement_df = curve.discount_date(args.settlement_date, false)?;
        Ok(PricingResults::from_npv(npv).with_result("settlement_value", npv / settlement_df))
    }
}
