//! Calibrated-model infrastructure: `Parameter`, `ModelState` and the
//! `CalibratedModel` trait with its calibration loop.
//!
//! A model is an observable: changing its parameters notifies every engine
//! priced off it, which in turn invalidates the instruments and calibration
//! helpers above them.  The calibration loop therefore only has to write
//! parameters and read helper errors.

use crate::calibration_helper::{calibration_objective, helper_residuals, CalibrationHelper};
use ql_core::{
    ensure,
    errors::{Error, Result},
    Observable, ObservableImpl, Real,
};
use ql_math::{
    Array, Constraint, CostFunction, EndCriteria, EndCriteriaType, NoConstraint,
    OptimizationMethod, OptimizationResult,
};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

// ────────────────────────────────────────────────────────────────────────────
// Parameter
// ────────────────────────────────────────────────────────────────────────────

/// A model parameter that can be calibrated.
#[derive(Clone)]
pub struct Parameter {
    values: Vec<Real>,
    constraint: Rc<dyn Constraint>,
}

impl Parameter {
    /// Create a new parameter with initial values and a constraint.
    pub fn new(values: Vec<Real>, constraint: impl Constraint + 'static) -> Self {
        Self {
            values,
            constraint: Rc::new(constraint),
        }
    }

    /// A scalar parameter without constraint.
    pub fn constant(value: Real) -> Self {
        Self::new(vec![value], NoConstraint)
    }

    /// Current value (for scalar parameters).
    pub fn value(&self) -> Real {
        self.values.first().copied().unwrap_or(Real::NAN)
    }

    /// All parameter values.
    pub fn values(&self) -> &[Real] {
        &self.values
    }

    /// Number of values.
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Set parameter values.
    pub fn set_values(&mut self, values: &[Real]) -> Result<()> {
        ensure!(
            values.len() == self.values.len(),
            "parameter expects {} values, got {}",
            self.values.len(),
            values.len()
        );
        self.values.copy_from_slice(values);
        Ok(())
    }

    /// Check candidate values against the constraint.
    pub fn test_values(&self, values: &[Real]) -> bool {
        self.constraint.test(&Array::from_column_slice(values))
    }

    /// Check if current values satisfy the constraint.
    pub fn is_valid(&self) -> bool {
        self.test_values(&self.values)
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter").field("values", &self.values).finish()
    }
}

/// The model's parameters seen as one flat vector, each slice checked
/// against its own parameter's constraint.
#[derive(Debug, Clone)]
pub struct ModelConstraint {
    params: Vec<Parameter>,
}

impl Constraint for ModelConstraint {
    fn test(&self, x: &Array) -> bool {
        let mut offset = 0;
        for p in &self.params {
            let end = offset + p.size();
            if end > x.len() || !p.test_values(&x.as_slice()[offset..end]) {
                return false;
            }
            offset = end;
        }
        offset == x.len()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ModelState
// ────────────────────────────────────────────────────────────────────────────

/// Parameters, observer list and last calibration outcome of a model.
#[derive(Debug)]
pub struct ModelState {
    params: RefCell<Vec<Parameter>>,
    end_type: Cell<Option<EndCriteriaType>>,
    observable: ObservableImpl,
}

impl ModelState {
    /// State holding `params` in calibration order.
    pub fn new(params: Vec<Parameter>) -> Self {
        Self {
            params: RefCell::new(params),
            end_type: Cell::new(None),
            observable: ObservableImpl::new(),
        }
    }

    /// The model's observer list.
    pub fn observers(&self) -> &ObservableImpl {
        &self.observable
    }

    /// Scalar value of parameter `i`.
    pub fn value(&self, i: usize) -> Real {
        self.params.borrow().get(i).map_or(Real::NAN, Parameter::value)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// CalibratedModel trait
// ────────────────────────────────────────────────────────────────────────────

/// A model that can be calibrated to market data.
pub trait CalibratedModel: Observable + fmt::Debug {
    /// The parameter bookkeeping embedded in the implementor.
    fn model_state(&self) -> &ModelState;

    /// Recompute anything derived from the parameters.
    fn generate_arguments(&self) -> Result<()> {
        Ok(())
    }

    /// Current parameters as one flat vector.
    fn params(&self) -> Array {
        let params = self.model_state().params.borrow();
        Array::from_iterator(
            params.iter().map(Parameter::size).sum(),
            params.iter().flat_map(|p| p.values().iter().copied()),
        )
    }

    /// Overwrite every parameter from a flat vector and notify observers.
    fn set_params(&self, values: &Array) -> Result<()> {
        {
            let mut params = self.model_state().params.borrow_mut();
            let expected: usize = params.iter().map(Parameter::size).sum();
            ensure!(
                values.len() == expected,
                "model expects {expected} parameter values, got {}",
                values.len()
            );
            let mut offset = 0;
            for p in params.iter_mut() {
                let end = offset + p.size();
                p.set_values(&values.as_slice()[offset..end])?;
                offset = end;
            }
        }
        self.generate_arguments()?;
        self.notify_observers()
    }

    /// Constraint on the flat parameter vector.
    fn constraint(&self) -> ModelConstraint {
        ModelConstraint {
            params: self.model_state().params.borrow().clone(),
        }
    }

    /// Why the last calibration stopped.
    fn end_criteria(&self) -> Option<EndCriteriaType> {
        self.model_state().end_type.get()
    }

    /// Minimise the weighted helper errors over the model parameters.
    ///
    /// `weights` defaults to one per helper and `fix_parameters` to all
    /// free when empty.  Helpers whose quote is invalid are excluded.  The
    /// model is left holding the best parameters found; if the minimiser
    /// fails, the starting parameters are restored before the error is
    /// returned.  With every parameter fixed no search runs and the result
    /// reports the current cost.
    fn calibrate(
        &self,
        helpers: &[Rc<dyn CalibrationHelper>],
        method: &dyn OptimizationMethod,
        end_criteria: &EndCriteria,
        weights: &[Real],
        fix_parameters: &[bool],
    ) -> Result<OptimizationResult>
    where
        Self: Sized,
    {
        ensure!(!helpers.is_empty(), "no calibration helpers given");
        ensure!(
            weights.is_empty() || weights.len() == helpers.len(),
            "mismatch between number of helpers ({}) and weights ({})",
            helpers.len(),
            weights.len()
        );
        let all = self.params();
        ensure!(
            fix_parameters.is_empty() || fix_parameters.len() == all.len(),
            "mismatch between number of parameters ({}) and fixed-parameter specs ({})",
            all.len(),
            fix_parameters.len()
        );
        let weights: Vec<Real> = if weights.is_empty() {
            vec![1.0; helpers.len()]
        } else {
            weights.to_vec()
        };
        let fixed: Vec<bool> = if fix_parameters.is_empty() {
            vec![false; all.len()]
        } else {
            fix_parameters.to_vec()
        };

        let projection = Projection::new(all, fixed);
        let cost = CalibrationFunction {
            model: self,
            helpers,
            weights: &weights,
            projection: &projection,
        };
        let constraint = ProjectedConstraint {
            inner: self.constraint(),
            projection: &projection,
        };
        let start = self.params();
        let initial = projection.project(&start);
        if initial.is_empty() {
            let value = calibration_objective(helpers, &weights)?;
            self.model_state()
                .end_type
                .set(Some(EndCriteriaType::StationaryPoint));
            tracing::debug!(value, "calibration skipped: every parameter is fixed");
            return Ok(OptimizationResult {
                x: start,
                value,
                iterations: 0,
                end_type: EndCriteriaType::StationaryPoint,
            });
        }
        tracing::debug!(
            helpers = helpers.len(),
            free_parameters = initial.len(),
            "calibration started"
        );
        let result = match method.minimize(&cost, &constraint, &initial, end_criteria) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "calibration failed, restoring parameters");
                self.set_params(&start)?;
                return Err(e);
            }
        };
        self.set_params(&projection.include(&result.x))?;
        self.model_state().end_type.set(Some(result.end_type));
        tracing::debug!(
            iterations = result.iterations,
            value = result.value,
            end = ?result.end_type,
            "calibration finished"
        );
        Ok(OptimizationResult {
            x: self.params(),
            ..result
        })
    }
}

/// Maps between the full parameter vector and its free components.
#[derive(Debug)]
struct Projection {
    full: Array,
    fixed: Vec<bool>,
}

impl Projection {
    fn new(full: Array, fixed: Vec<bool>) -> Self {
        Self { full, fixed }
    }

    fn project(&self, full: &Array) -> Array {
        Array::from_iterator(
            self.fixed.iter().filter(|f| !**f).count(),
            full.iter()
                .zip(&self.fixed)
                .filter(|(_, f)| !**f)
                .map(|(v, _)| *v),
        )
    }

    fn include(&self, free: &Array) -> Array {
        let mut full = self.full.clone();
        let mut k = 0;
        for (i, f) in self.fixed.iter().enumerate() {
            if !*f {
                full[i] = free[k];
                k += 1;
            }
        }
        full
    }
}

struct ProjectedConstraint<'a> {
    inner: ModelConstraint,
    projection: &'a Projection,
}

impl Constraint for ProjectedConstraint<'_> {
    fn test(&self, x: &Array) -> bool {
        self.inner.test(&self.projection.include(x))
    }
}

struct CalibrationFunction<'a, M: CalibratedModel> {
    model: &'a M,
    helpers: &'a [Rc<dyn CalibrationHelper>],
    weights: &'a [Real],
    projection: &'a Projection,
}

impl<M: CalibratedModel> CostFunction for CalibrationFunction<'_, M> {
    fn values(&self, x: &Array) -> Result<Array> {
        self.model.set_params(&self.projection.include(x))?;
        let residuals = helper_residuals(self.helpers, self.weights)?;
        if residuals.is_empty() {
            return Err(Error::Precondition(
                "no calibration helper has a valid quote".into(),
            ));
        }
        Ok(Array::from_vec(residuals))
    }
}
