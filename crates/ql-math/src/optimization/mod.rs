//! Least-squares optimisation: cost functions, constraints, end criteria,
//! and the Nelder–Mead simplex and Levenberg–Marquardt minimisers.
//!
//! Parameter vectors are `nalgebra::DVector<Real>`.

use nalgebra::{DMatrix, DVector};
use ql_core::{ensure, errors::Result, Real};

/// A parameter vector.
pub type Array = DVector<Real>;

// ── Cost function trait ───────────────────────────────────────────────────────

/// A multi-dimensional least-squares objective.
pub trait CostFunction {
    /// Residuals at `x`.
    fn values(&self, x: &Array) -> Result<Array>;

    /// Scalar cost: the sum of squared residuals.
    fn value(&self, x: &Array) -> Result<Real> {
        Ok(self.values(x)?.norm_squared())
    }

    /// Jacobian of the residuals (rows: residuals, columns: parameters),
    /// by forward differences.
    fn jacobian(&self, x: &Array, step: Real) -> Result<DMatrix<Real>> {
        let f0 = self.values(x)?;
        let mut jac = DMatrix::zeros(f0.len(), x.len());
        for j in 0..x.len() {
            let h = step * x[j].abs().max(1.0);
            let mut xp = x.clone();
            xp[j] += h;
            let fp = self.values(&xp)?;
            jac.set_column(j, &((fp - &f0) / h));
        }
        Ok(jac)
    }
}

// ── Constraints ───────────────────────────────────────────────────────────────

/// A feasibility test on the parameter space.
pub trait Constraint {
    /// Return `true` if `x` is feasible.
    fn test(&self, x: &Array) -> bool;
}

/// Every point is feasible.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl Constraint for NoConstraint {
    fn test(&self, _x: &Array) -> bool {
        true
    }
}

/// Every component must be strictly positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositiveConstraint;

impl Constraint for PositiveConstraint {
    fn test(&self, x: &Array) -> bool {
        x.iter().all(|&v| v > 0.0)
    }
}

/// Every component must lie in `[low, high]`.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryConstraint {
    /// Lower bound.
    pub low: Real,
    /// Upper bound.
    pub high: Real,
}

impl BoundaryConstraint {
    /// Create a boundary constraint.
    pub fn new(low: Real, high: Real) -> Self {
        Self { low, high }
    }
}

impl Constraint for BoundaryConstraint {
    fn test(&self, x: &Array) -> bool {
        x.iter().all(|&v| v >= self.low && v <= self.high)
    }
}

// ── End criteria ──────────────────────────────────────────────────────────────

/// When to stop an optimisation.
#[derive(Debug, Clone, Copy)]
pub struct EndCriteria {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Maximum number of consecutive iterations without improvement.
    pub max_stationary_state_iterations: usize,
    /// Stop once the cost drops below this.
    pub root_epsilon: Real,
    /// An improvement smaller than this counts as stationary.
    pub function_epsilon: Real,
    /// Stop once the gradient norm drops below this.
    pub gradient_norm_epsilon: Real,
}

impl EndCriteria {
    /// Create new end criteria.
    pub fn new(
        max_iterations: usize,
        max_stationary_state_iterations: usize,
        root_epsilon: Real,
        function_epsilon: Real,
        gradient_norm_epsilon: Real,
    ) -> Self {
        Self {
            max_iterations,
            max_stationary_state_iterations,
            root_epsilon,
            function_epsilon,
            gradient_norm_epsilon,
        }
    }
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self::new(1000, 100, 1e-8, 1e-8, 1e-8)
    }
}

/// Why an optimisation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndCriteriaType {
    /// Iteration budget exhausted.
    MaxIterations,
    /// Cost below `root_epsilon`.
    RootEpsilon,
    /// Improvement below `function_epsilon` for too long.
    StationaryPoint,
    /// Gradient norm below `gradient_norm_epsilon`.
    GradientNormEpsilon,
}

/// Outcome of an optimisation.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Best parameters found.
    pub x: Array,
    /// Cost at `x`.
    pub value: Real,
    /// Iterations performed.
    pub iterations: usize,
    /// Reason for stopping.
    pub end_type: EndCriteriaType,
}

/// A minimiser of least-squares cost functions.
pub trait OptimizationMethod: std::fmt::Debug {
    /// Minimise `cost` over feasible points, starting from `initial`.
    fn minimize(
        &self,
        cost: &dyn CostFunction,
        constraint: &dyn Constraint,
        initial: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult>;
}

// ── Simplex (Nelder–Mead) ─────────────────────────────────────────────────────

/// Nelder–Mead simplex minimiser.
#[derive(Debug, Clone, Copy)]
pub struct Simplex {
    lambda: Real,
}

impl Simplex {
    /// Create a simplex minimiser whose initial vertices are `lambda` away
    /// from the starting point along each axis.
    pub fn new(lambda: Real) -> Self {
        Self { lambda }
    }
}

fn feasible_value(cost: &dyn CostFunction, constraint: &dyn Constraint, x: &Array) -> Result<Real> {
    if constraint.test(x) {
        cost.value(x)
    } else {
        Ok(Real::MAX)
    }
}

impl OptimizationMethod for Simplex {
    fn minimize(
        &self,
        cost: &dyn CostFunction,
        constraint: &dyn Constraint,
        initial: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult> {
        let n = initial.len();
        ensure!(n > 0, "simplex needs at least one free parameter");
        let mut vertices: Vec<Array> = Vec::with_capacity(n + 1);
        vertices.push(initial.clone());
        for i in 0..n {
            let mut v = initial.clone();
            v[i] += self.lambda;
            if !constraint.test(&v) {
                v[i] = initial[i] - self.lambda;
            }
            vertices.push(v);
        }
        let mut values = vertices
            .iter()
            .map(|v| feasible_value(cost, constraint, v))
            .collect::<Result<Vec<Real>>>()?;

        let mut iterations = 0;
        let mut stationary = 0;
        let mut previous_best = Real::MAX;

        loop {
            let (mut ilo, mut ihi) = (0, 0);
            for i in 0..=n {
                if values[i] < values[ilo] {
                    ilo = i;
                }
                if values[i] > values[ihi] {
                    ihi = i;
                }
            }
            let mut inhi = ilo;
            for i in 0..=n {
                if i != ihi && values[i] > values[inhi] {
                    inhi = i;
                }
            }

            iterations += 1;
            let finish = |end_type| OptimizationResult {
                x: vertices[ilo].clone(),
                value: values[ilo],
                iterations,
                end_type,
            };
            if values[ilo] < end_criteria.root_epsilon {
                return Ok(finish(EndCriteriaType::RootEpsilon));
            }
            if (previous_best - values[ilo]).abs() < end_criteria.function_epsilon {
                stationary += 1;
                if stationary >= end_criteria.max_stationary_state_iterations {
                    return Ok(finish(EndCriteriaType::StationaryPoint));
                }
            } else {
                stationary = 0;
            }
            previous_best = values[ilo];
            if iterations >= end_criteria.max_iterations {
                return Ok(finish(EndCriteriaType::MaxIterations));
            }

            let mut centroid = Array::zeros(n);
            for (i, v) in vertices.iter().enumerate() {
                if i != ihi {
                    centroid += v;
                }
            }
            centroid /= n as Real;

            let reflected = &centroid * 2.0 - &vertices[ihi];
            let fr = feasible_value(cost, constraint, &reflected)?;
            if fr < values[ilo] {
                let expanded = &reflected * 2.0 - &centroid;
                let fe = feasible_value(cost, constraint, &expanded)?;
                if fe < fr {
                    vertices[ihi] = expanded;
                    values[ihi] = fe;
                } else {
                    vertices[ihi] = reflected;
                    values[ihi] = fr;
                }
            } else if fr < values[inhi] {
                vertices[ihi] = reflected;
                values[ihi] = fr;
            } else {
                let contracted = if fr < values[ihi] {
                    (&centroid + &reflected) * 0.5
                } else {
                    (&centroid + &vertices[ihi]) * 0.5
                };
                let fc = feasible_value(cost, constraint, &contracted)?;
                if fc < values[ihi].min(fr) {
                    vertices[ihi] = contracted;
                    values[ihi] = fc;
                } else {
                    let best = vertices[ilo].clone();
                    for i in 0..=n {
                        if i != ilo {
                            vertices[i] = (&best + &vertices[i]) * 0.5;
                            values[i] = feasible_value(cost, constraint, &vertices[i])?;
                        }
                    }
                }
            }
        }
    }
}

// ── Levenberg–Marquardt ───────────────────────────────────────────────────────

/// Levenberg–Marquardt least-squares minimiser.
///
/// Each iteration solves `(JᵀJ + μ·diag(JᵀJ)) δ = −Jᵀr` and accepts the step
/// if it is feasible and lowers the cost; otherwise `μ` grows tenfold and
/// the step is retried.
#[derive(Debug, Clone, Copy)]
pub struct LevenbergMarquardt {
    epsfcn: Real,
    xtol: Real,
}

impl LevenbergMarquardt {
    /// `epsfcn` is the relative finite-difference step; `xtol` the smallest
    /// step worth taking.
    pub fn new(epsfcn: Real, xtol: Real) -> Self {
        Self { epsfcn, xtol }
    }
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self::new(1e-8, 1e-12)
    }
}

impl OptimizationMethod for LevenbergMarquardt {
    fn minimize(
        &self,
        cost: &dyn CostFunction,
        constraint: &dyn Constraint,
        initial: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult> {
        ensure!(
            !initial.is_empty(),
            "Levenberg-Marquardt needs at least one free parameter"
        );
        let mut x = initial.clone();
        let mut residuals = cost.values(&x)?;
        let mut value = residuals.norm_squared();
        let mut mu = 1e-3;
        let mut stationary = 0;

        for iteration in 0..end_criteria.max_iterations {
            let finish = |x: Array, value, end_type| OptimizationResult {
                x,
                value,
                iterations: iteration,
                end_type,
            };
            if value < end_criteria.root_epsilon {
                return Ok(finish(x, value, EndCriteriaType::RootEpsilon));
            }
            let jac = cost.jacobian(&x, self.epsfcn)?;
            let gradient = jac.tr_mul(&residuals);
            if gradient.norm() < end_criteria.gradient_norm_epsilon {
                return Ok(finish(x, value, EndCriteriaType::GradientNormEpsilon));
            }
            let jtj = jac.tr_mul(&jac);

            let mut accepted = None;
            while mu < 1e16 {
                let mut lhs = jtj.clone();
                for i in 0..lhs.nrows() {
                    lhs[(i, i)] += mu * jtj[(i, i)].max(1e-12);
                }
                let Some(step) = lhs.lu().solve(&(-&gradient)) else {
                    mu *= 10.0;
                    continue;
                };
                if step.norm() < self.xtol * (x.norm() + self.xtol) {
                    break;
                }
                let candidate = &x + &step;
                if constraint.test(&candidate) {
                    let r = cost.values(&candidate)?;
                    let v = r.norm_squared();
                    if v < value {
                        accepted = Some((candidate, r, v));
                        mu = (mu * 0.1).max(1e-15);
                        break;
                    }
                }
                mu *= 10.0;
            }

            let Some((candidate, r, v)) = accepted else {
                return Ok(finish(x, value, EndCriteriaType::StationaryPoint));
            };
            if value - v < end_criteria.function_epsilon {
                stationary += 1;
            } else {
                stationary = 0;
            }
            x = candidate;
            residuals = r;
            value = v;
            if stationary >= end_criteria.max_stationary_state_iterations {
                return Ok(finish(x, value, EndCriteriaType::StationaryPoint));
            }
        }

        Ok(OptimizationResult {
            x,
            value,
            iterations: end_criteria.max_iterations,
            end_type: EndCriteriaType::MaxIterations,
        })
    }
}
