//! 1-D root finders.
//!
//! Each solver takes the objective as a fallible closure, so an error raised
//! while evaluating it (an extrapolation failure, an unset handle) stops the
//! search and reaches the caller unchanged.
//!
//! * an initial bracket without a sign change fails with
//!   [`Error::Precondition`];
//! * running out of `max_evaluations` fails with [`Error::NotConverged`].

use ql_core::{
    ensure,
    errors::{Error, Result},
    Real,
};

/// Default cap on objective evaluations.
pub const DEFAULT_MAX_EVALUATIONS: usize = 100;

fn not_converged(name: &str, max_evaluations: usize, x: Real) -> Error {
    Error::NotConverged(format!(
        "{name}: maximum number of function evaluations ({max_evaluations}) exceeded, last x = {x}"
    ))
}

fn check_bracket(name: &str, x_min: Real, x_max: Real, f_min: Real, f_max: Real) -> Result<()> {
    ensure!(x_min < x_max, "{name}: invalid bracket [{x_min}, {x_max}]");
    ensure!(
        f_min * f_max <= 0.0,
        "{name}: root not bracketed: f[{x_min}, {x_max}] -> [{f_min:e}, {f_max:e}]"
    );
    Ok(())
}

// ── Brent ─────────────────────────────────────────────────────────────────────

/// Brent's method on `[x_min, x_max]`.
///
/// Combines bisection, secant and inverse quadratic interpolation.  Stops
/// when the bracket is narrower than `accuracy`.
pub fn brent<F>(
    mut f: F,
    x_min: Real,
    x_max: Real,
    accuracy: Real,
    max_evaluations: usize,
) -> Result<Real>
where
    F: FnMut(Real) -> Result<Real>,
{
    let mut a = x_min;
    let mut b = x_max;
    let mut fa = f(a)?;
    let mut fb = f(b)?;
    check_bracket("brent", x_min, x_max, fa, fb)?;
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }

    let mut evaluations = 2;
    let mut c = b;
    let mut fc = fb;
    let mut d = b - a;
    let mut e = d;

    while evaluations <= max_evaluations {
        if fb * fc > 0.0 {
            c = a;
            fc = fa;
            d = b - a;
            e = d;
        }
        if fc.abs() < fb.abs() {
            a = b;
            b = c;
            c = a;
            fa = fb;
            fb = fc;
            fc = fa;
        }
        let tol = 2.0 * f64::EPSILON * b.abs() + 0.5 * accuracy;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol || fb == 0.0 {
            return Ok(b);
        }
        if e.abs() >= tol && fa.abs() > fb.abs() {
            let s = fb / fa;
            let (p, q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let q = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                    (q - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            let (p, q) = if p > 0.0 { (p, -q) } else { (-p, q) };
            let min1 = 3.0 * xm * q - (tol * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            d = xm;
            e = d;
        }
        a = b;
        fa = fb;
        b += if d.abs() > tol { d } else { tol.copysign(xm) };
        fb = f(b)?;
        evaluations += 1;
    }
    Err(not_converged("brent", max_evaluations, b))
}

// ── Bisection ────────────────────────────────────────────────────────────────

/// Plain bisection on `[x_min, x_max]`.
pub fn bisection<F>(
    mut f: F,
    x_min: Real,
    x_max: Real,
    accuracy: Real,
    max_evaluations: usize,
) -> Result<Real>
where
    F: FnMut(Real) -> Result<Real>,
{
    let fa = f(x_min)?;
    let fb = f(x_max)?;
    check_bracket("bisection", x_min, x_max, fa, fb)?;
    if fa == 0.0 {
        return Ok(x_min);
    }
    if fb == 0.0 {
        return Ok(x_max);
    }
    // orient so that f(root) < 0 at `root` and the step moves towards the sign change
    let (mut root, mut dx) = if fa < 0.0 {
        (x_min, x_max - x_min)
    } else {
        (x_max, x_min - x_max)
    };
    let mut evaluations = 2;
    while evaluations <= max_evaluations {
        dx *= 0.5;
        let mid = root + dx;
        let fm = f(mid)?;
        evaluations += 1;
        if fm <= 0.0 {
            root = mid;
        }
        if dx.abs() < accuracy || fm == 0.0 {
            return Ok(root);
        }
    }
    Err(not_converged("bisection", max_evaluations, root))
}

// ── Newton-Safe ──────────────────────────────────────────────────────────────

/// Newton–Raphson safeguarded by bisection.
///
/// `f_df` returns the value and the derivative.  A Newton step that would
/// leave the current bracket, or that does not shrink it fast enough, is
/// replaced by a bisection step.
pub fn newton_safe<F>(
    mut f_df: F,
    x_min: Real,
    x_max: Real,
    accuracy: Real,
    max_evaluations: usize,
) -> Result<Real>
where
    F: FnMut(Real) -> Result<(Real, Real)>,
{
    let (f_lo, _) = f_df(x_min)?;
    let (f_hi, _) = f_df(x_max)?;
    check_bracket("newton_safe", x_min, x_max, f_lo, f_hi)?;
    if f_lo == 0.0 {
        return Ok(x_min);
    }
    if f_hi == 0.0 {
        return Ok(x_max);
    }

    // keep f(lo) < 0 < f(hi)
    let (mut lo, mut hi) = if f_lo < 0.0 { (x_min, x_max) } else { (x_max, x_min) };
    let mut root = 0.5 * (x_min + x_max);
    let mut dx_old = (x_max - x_min).abs();
    let mut dx = dx_old;
    let (mut froot, mut dfroot) = f_df(root)?;
    let mut evaluations = 3;

    while evaluations <= max_evaluations {
        let newton_leaves_bracket =
            ((root - hi) * dfroot - froot) * ((root - lo) * dfroot - froot) > 0.0;
        let newton_too_slow = (2.0 * froot).abs() > (dx_old * dfroot).abs();
        dx_old = dx;
        if newton_leaves_bracket || newton_too_slow {
            dx = 0.5 * (hi - lo);
            root = lo + dx;
        } else {
            dx = froot / dfroot;
            root -= dx;
        }
        if dx.abs() < accuracy {
            return Ok(root);
        }
        let (fr, dfr) = f_df(root)?;
        froot = fr;
        dfroot = dfr;
        evaluations += 1;
        if froot < 0.0 {
            lo = root;
        } else {
            hi = root;
        }
    }
    Err(not_converged("newton_safe", max_evaluations, root))
}
