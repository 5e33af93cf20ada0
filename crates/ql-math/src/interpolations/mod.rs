//! 1-D interpolation over sorted nodes.
//!
//! Curves never build a concrete interpolation type directly: they hold an
//! [`Interpolator`] (the factory) and ask it for a boxed [`Interpolation`]
//! over their nodes.  After the node values move, the curve calls
//! [`Interpolation::update`] to re-fit in place.

use ql_core::{
    ensure,
    errors::{Error, Result},
    Real,
};

/// A fitted 1-D interpolation `f: R → R`.
pub trait Interpolation: std::fmt::Debug {
    /// Lower end of the node range.
    fn x_min(&self) -> Real;

    /// Upper end of the node range.
    fn x_max(&self) -> Real;

    /// Evaluate at `x`, extrapolating beyond the nodes if needed.
    fn value_unchecked(&self, x: Real) -> Real;

    /// Replace the node values (same abscissae) and re-fit.
    fn update(&mut self, ys: &[Real]) -> Result<()>;

    /// Return `true` if `x` lies within `[x_min, x_max]`.
    fn is_in_range(&self, x: Real) -> bool {
        let tolerance = 1e-12 * self.x_max().abs().max(1.0);
        x >= self.x_min() - tolerance && x <= self.x_max() + tolerance
    }

    /// Evaluate at `x`.
    ///
    /// # Errors
    /// [`Error::Extrapolation`] if `x` is outside the node range and
    /// `allow_extrapolation` is `false`.
    fn value(&self, x: Real, allow_extrapolation: bool) -> Result<Real> {
        if !allow_extrapolation && !self.is_in_range(x) {
            return Err(Error::Extrapolation(format!(
                "interpolation range is [{}, {}]: extrapolation at {x} not allowed",
                self.x_min(),
                self.x_max()
            )));
        }
        Ok(self.value_unchecked(x))
    }
}

/// Interpolation factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolator {
    /// Piecewise linear in `y`.
    #[default]
    Linear,
    /// Piecewise linear in `ln y`; values must be positive.
    LogLinear,
    /// Piecewise constant, each node's value holding back to the previous node.
    BackwardFlat,
}

impl Interpolator {
    /// Minimum number of nodes the scheme needs.
    pub fn required_points(self) -> usize {
        match self {
            Interpolator::Linear | Interpolator::LogLinear => 2,
            Interpolator::BackwardFlat => 1,
        }
    }

    /// Fit the scheme to `(xs, ys)`.
    ///
    /// # Errors
    /// [`Error::Precondition`] if the slices differ in length, hold too few
    /// points, or `xs` is not strictly increasing.
    pub fn interpolate(self, xs: &[Real], ys: &[Real]) -> Result<Box<dyn Interpolation>> {
        ensure!(
            xs.len() == ys.len(),
            "{} abscissae but {} ordinates",
            xs.len(),
            ys.len()
        );
        ensure!(
            xs.len() >= self.required_points(),
            "{self:?} interpolation needs at least {} points, got {}",
            self.required_points(),
            xs.len()
        );
        ensure!(
            xs.windows(2).all(|w| w[0] < w[1]),
            "abscissae must be strictly increasing"
        );
        let nodes = Nodes {
            xs: xs.to_vec(),
            ys: Vec::new(),
        };
        let mut interpolation: Box<dyn Interpolation> = match self {
            Interpolator::Linear => Box::new(Linear(nodes)),
            Interpolator::LogLinear => Box::new(LogLinear(nodes)),
            Interpolator::BackwardFlat => Box::new(BackwardFlat(nodes)),
        };
        interpolation.update(ys)?;
        Ok(interpolation)
    }
}

#[derive(Debug, Clone)]
struct Nodes {
    xs: Vec<Real>,
    ys: Vec<Real>,
}

impl Nodes {
    fn set(&mut self, ys: &[Real]) -> Result<()> {
        ensure!(
            ys.len() == self.xs.len(),
            "{} values supplied for {} nodes",
            ys.len(),
            self.xs.len()
        );
        self.ys.clear();
        self.ys.extend_from_slice(ys);
        Ok(())
    }

    /// Index `i` of the segment `[x_i, x_{i+1}]` used for `x`, clamped to the
    /// first and last segments.
    fn locate(&self, x: Real) -> usize {
        let n = self.xs.len();
        if n < 2 || x < self.xs[0] {
            return 0;
        }
        let i = self.xs.partition_point(|&xi| xi <= x);
        i.saturating_sub(1).min(n - 2)
    }

    fn linear(&self, x: Real) -> Real {
        let i = self.locate(x);
        let slope = (self.ys[i + 1] - self.ys[i]) / (self.xs[i + 1] - self.xs[i]);
        self.ys[i] + (x - self.xs[i]) * slope
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }
}

#[derive(Debug, Clone)]
struct Linear(Nodes);

impl Interpolation for Linear {
    fn x_min(&self) -> Real {
        self.0.x_min()
    }
    fn x_max(&self) -> Real {
        self.0.x_max()
    }
    fn value_unchecked(&self, x: Real) -> Real {
        self.0.linear(x)
    }
    fn update(&mut self, ys: &[Real]) -> Result<()> {
        self.0.set(ys)
    }
}

/// Stores `ln y`.
#[derive(Debug, Clone)]
struct LogLinear(Nodes);

impl Interpolation for LogLinear {
    fn x_min(&self) -> Real {
        self.0.x_min()
    }
    fn x_max(&self) -> Real {
        self.0.x_max()
    }
    fn value_unchecked(&self, x: Real) -> Real {
        self.0.linear(x).exp()
    }
    fn update(&mut self, ys: &[Real]) -> Result<()> {
        ensure!(
            ys.iter().all(|&y| y > 0.0),
            "log-linear interpolation needs positive values"
        );
        let logs: Vec<Real> = ys.iter().map(|y| y.ln()).collect();
        self.0.set(&logs)
    }
}

#[derive(Debug, Clone)]
struct BackwardFlat(Nodes);

impl Interpolation for BackwardFlat {
    fn x_min(&self) -> Real {
        self.0.x_min()
    }
    fn x_max(&self) -> Real {
        self.0.x_max()
    }
    fn value_unchecked(&self, x: Real) -> Real {
        let nodes = &self.0;
        let n = nodes.xs.len();
        if n == 1 || x <= nodes.xs[0] {
            return nodes.ys[0];
        }
        if x > nodes.xs[n - 1] {
            return nodes.ys[n - 1];
        }
        let i = nodes.locate(x);
        if x == nodes.xs[i] {
            nodes.ys[i]
        } else {
            nodes.ys[i + 1]
        }
    }
    fn update(&mut self, ys: &[Real]) -> Result<()> {
        self.0.set(ys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_interpolates_and_extrapolates() {
        let f = Interpolator::Linear
            .interpolate(&[0.0, 1.0, 2.0], &[0.0, 1.0, 4.0])
            .unwrap();
        assert_abs_diff_eq!(f.value(0.5, false).unwrap(), 0.5);
        assert_abs_diff_eq!(f.value(1.5, false).unwrap(), 2.5);
        assert_abs_diff_eq!(f.value(2.0, false).unwrap(), 4.0);
        assert!(matches!(f.value(3.0, false), Err(Error::Extrapolation(_))));
        assert_abs_diff_eq!(f.value(3.0, true).unwrap(), 7.0);
        assert_abs_diff_eq!(f.value(-1.0, true).unwrap(), -1.0);
    }

    #[test]
    fn log_linear_is_geometric() {
        let f = Interpolator::LogLinear
            .interpolate(&[0.0, 1.0], &[1.0, std::f64::consts::E])
            .unwrap();
        assert_abs_diff_eq!(f.value(0.5, false).unwrap(), 0.5f64.exp(), epsilon = 1e-14);
        assert!(Interpolator::LogLinear.interpolate(&[0.0, 1.0], &[1.0, -1.0]).is_err());
    }

    #[test]
    fn backward_flat_takes_next_node() {
        let f = Interpolator::BackwardFlat
            .interpolate(&[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0])
            .unwrap();
        assert_eq!(f.value(0.5, true).unwrap(), 10.0);
        assert_eq!(f.value(1.0, false).unwrap(), 10.0);
        assert_eq!(f.value(1.5, false).unwrap(), 20.0);
        assert_eq!(f.value(2.0, false).unwrap(), 20.0);
        assert_eq!(f.value(2.5, false).unwrap(), 30.0);
        assert_eq!(f.value(9.0, true).unwrap(), 30.0);
    }

    #[test]
    fn update_refits_in_place() {
        let mut f = Interpolator::Linear.interpolate(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        f.update(&[1.0, 3.0]).unwrap();
        assert_abs_diff_eq!(f.value(0.5, false).unwrap(), 2.0);
        assert!(f.update(&[1.0]).is_err());
    }

    #[test]
    fn rejects_bad_nodes() {
        assert!(Interpolator::Linear.interpolate(&[0.0, 1.0], &[0.0]).is_err());
        assert!(Interpolator::Linear.interpolate(&[1.0, 1.0], &[0.0, 0.0]).is_err());
        assert!(Interpolator::Linear.interpolate(&[1.0], &[0.0]).is_err());
        assert!(Interpolator::BackwardFlat.interpolate(&[1.0], &[0.0]).is_ok());
    }
}
