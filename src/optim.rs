//! Internal root-finding utilities for implied volatility back-solving.

use crate::error::IvCrushError;

/// Configuration for Brent's bracketed root finder.
pub(crate) struct BrentConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Absolute convergence threshold on the bracket half-width.
    pub x_tol: f64,
}

/// Result of a Brent root search.
pub(crate) struct BrentRoot {
    /// Abscissa of the root.
    pub x: f64,
    /// Iterations consumed.
    pub iterations: usize,
}

/// Find a root of `f` inside `[lo, hi]` using Brent's method.
///
/// Combines bisection, secant and inverse quadratic interpolation: it keeps
/// the root bracketed at every step, so convergence is guaranteed whenever
/// `f(lo)` and `f(hi)` have opposite signs.
///
/// # Errors
/// Returns [`IvCrushError::Convergence`] if the endpoints do not bracket a
/// root, if `f` produces a non-finite value, or if `max_iter` is exhausted.
pub(crate) fn brent_root<F>(
    f: F,
    lo: f64,
    hi: f64,
    config: &BrentConfig,
) -> crate::error::Result<BrentRoot>
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = (lo, hi);
    let (mut fa, mut fb) = (f(a), f(b));

    if !fa.is_finite() || !fb.is_finite() {
        return Err(IvCrushError::Convergence {
            message: format!("objective not finite at bracket endpoints [{lo}, {hi}]"),
            iterations: 0,
        });
    }
    if fa == 0.0 {
        return Ok(BrentRoot { x: a, iterations: 0 });
    }
    if fb == 0.0 {
        return Ok(BrentRoot { x: b, iterations: 0 });
    }
    if fa.signum() == fb.signum() {
        return Err(IvCrushError::Convergence {
            message: format!("root not bracketed in [{lo}, {hi}]: f(lo)={fa}, f(hi)={fb}"),
            iterations: 0,
        });
    }

    let (mut c, mut fc) = (b, fb);
    let mut d = b - a;
    let mut e = d;

    for iter in 1..=config.max_iter {
        if fb.signum() == fc.signum() {
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

        let tol1 = 2.0 * f64::EPSILON * b.abs() + 0.5 * config.x_tol;
        let xm = 0.5 * (c - b);
        if xm.abs() <= tol1 || fb == 0.0 {
            return Ok(BrentRoot {
                x: b,
                iterations: iter,
            });
        }

        if e.abs() >= tol1 && fa.abs() > fb.abs() {
            // Attempt interpolation
            let s = fb / fa;
            let (mut p, mut q) = if a == c {
                (2.0 * xm * s, 1.0 - s)
            } else {
                let q0 = fa / fc;
                let r = fb / fc;
                (
                    s * (2.0 * xm * q0 * (q0 - r) - (b - a) * (r - 1.0)),
                    (q0 - 1.0) * (r - 1.0) * (s - 1.0),
                )
            };
            if p > 0.0 {
                q = -q;
            }
            p = p.abs();
            let min1 = 3.0 * xm * q - (tol1 * q).abs();
            let min2 = (e * q).abs();
            if 2.0 * p < min1.min(min2) {
                e = d;
                d = p / q;
            } else {
                d = xm;
                e = d;
            }
        } else {
            // Bisection
            d = xm;
            e = d;
        }

        a = b;
        fa = fb;
        b += if d.abs() > tol1 { d } else { tol1.copysign(xm) };
        fb = f(b);
        if !fb.is_finite() {
            return Err(IvCrushError::Convergence {
                message: format!("objective not finite at x={b}"),
                iterations: iter,
            });
        }
    }

    Err(IvCrushError::Convergence {
        message: format!("no root within tolerance {} in [{lo}, {hi}]", config.x_tol),
        iterations: config.max_iter,
    })
}
