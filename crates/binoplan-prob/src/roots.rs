//! Bracketed scalar root finding.
//!
//! Brent's method: inverse quadratic interpolation or secant steps while they
//! make progress, bisection otherwise. The bracket always contains a sign
//! change, so convergence is guaranteed for continuous `f`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RootError {
    #[error("Root is not bracketed: f({lo}) = {f_lo}, f({hi}) = {f_hi}")]
    NotBracketed {
        lo: f64,
        hi: f64,
        f_lo: f64,
        f_hi: f64,
    },
    #[error("No convergence after {iterations} iterations")]
    NoConvergence { iterations: usize },
    #[error("Objective returned a non-finite value at x={x}")]
    NonFinite { x: f64 },
    /// The iteration converged, but the objective at the root is further
    /// from zero than the caller accepts.
    #[error("Residual {residual:e} at x={x} exceeds tolerance {tolerance:e}")]
    ResidualTooLarge {
        x: f64,
        residual: f64,
        tolerance: f64,
    },
}

/// Stopping rule for [`brent`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootOptions {
    /// Absolute tolerance on the root location.
    pub xtol: f64,
    /// Relative tolerance on the root location.
    pub rtol: f64,
    pub max_iter: usize,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            xtol: 1e-10,
            rtol: 4.0 * f64::EPSILON,
            max_iter: 200,
        }
    }
}

fn eval<F: FnMut(f64) -> f64>(f: &mut F, x: f64) -> Result<f64, RootError> {
    let y = f(x);
    if y.is_nan() {
        return Err(RootError::NonFinite { x });
    }
    Ok(y)
}

/// Find `x` in `[lo, hi]` with `f(x) = 0`.
///
/// # Parameters
/// - `f`: Continuous objective. `f(lo)` and `f(hi)` must differ in sign.
/// - `lo`, `hi`: Bracket endpoints.
/// - `opts`: Tolerances and iteration cap.
///
/// # Returns
/// The root to within `xtol + rtol * |x|`, or a [`RootError`].
pub fn brent<F>(mut f: F, lo: f64, hi: f64, opts: RootOptions) -> Result<f64, RootError>
where
    F: FnMut(f64) -> f64,
{
    let mut xpre = lo;
    let mut xcur = hi;
    let mut fpre = eval(&mut f, xpre)?;
    let mut fcur = eval(&mut f, xcur)?;

    if fpre == 0.0 {
        return Ok(xpre);
    }
    if fcur == 0.0 {
        return Ok(xcur);
    }
    if fpre.signum() == fcur.signum() {
        return Err(RootError::NotBracketed {
            lo,
            hi,
            f_lo: fpre,
            f_hi: fcur,
        });
    }

    // xblk is the contrapoint: f(xblk) and f(xcur) always differ in sign.
    let mut xblk = 0.0;
    let mut fblk = 0.0;
    let mut spre = 0.0;
    let mut scur = 0.0;

    for _ in 0..opts.max_iter {
        if fpre != 0.0 && fcur != 0.0 && fpre.signum() != fcur.signum() {
            xblk = xpre;
            fblk = fpre;
            spre = xcur - xpre;
            scur = spre;
        }
        if fblk.abs() < fcur.abs() {
            xpre = xcur;
            xcur = xblk;
            xblk = xpre;

            fpre = fcur;
            fcur = fblk;
            fblk = fpre;
        }

        let delta = (opts.xtol + opts.rtol * xcur.abs()) / 2.0;
        let sbis = (xblk - xcur) / 2.0;
        if fcur == 0.0 || sbis.abs() < delta {
            return Ok(xcur);
        }

        if spre.abs() > delta && fcur.abs() < fpre.abs() {
            let stry = if xpre == xblk {
                // secant
                -fcur * (xcur - xpre) / (fcur - fpre)
            } else {
                // inverse quadratic interpolation
                let dpre = (fpre - fcur) / (xpre - xcur);
                let dblk = (fblk - fcur) / (xblk - xcur);
                -fcur * (fblk * dblk - fpre * dpre) / (dblk * dpre * (fblk - fpre))
            };
            if 2.0 * stry.abs() < spre.abs().min(3.0 * sbis.abs() - delta) {
                spre = scur;
                scur = stry;
            } else {
                spre = sbis;
                scur = sbis;
            }
        } else {
            spre = sbis;
            scur = sbis;
        }

        xpre = xcur;
        fpre = fcur;
        if scur.abs() > delta {
            xcur += scur;
        } else if sbis > 0.0 {
            xcur += delta;
        } else {
            xcur -= delta;
        }
        fcur = eval(&mut f, xcur)?;
    }

    Err(RootError::NoConvergence {
        iterations: opts.max_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brent_polynomial() {
        let root = brent(|x| x * x - 2.0, 0.0, 2.0, RootOptions::default()).unwrap();
        assert!((root - 2f64.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_brent_decreasing_function() {
        let root = brent(|x| (-x).exp() - 0.5, 0.0, 5.0, RootOptions::default()).unwrap();
        assert!((root - 2f64.ln()).abs() < 1e-10);
    }

    #[test]
    fn test_brent_root_at_endpoint() {
        assert_eq!(
            brent(|x| x - 1.0, 1.0, 3.0, RootOptions::default()).unwrap(),
            1.0
        );
        assert_eq!(
            brent(|x| x - 3.0, 1.0, 3.0, RootOptions::default()).unwrap(),
            3.0
        );
    }

    #[test]
    fn test_brent_not_bracketed() {
        let err = brent(|x| x * x + 1.0, -1.0, 1.0, RootOptions::default()).unwrap_err();
        assert!(matches!(err, RootError::NotBracketed { .. }), "{err}");
    }

    #[test]
    fn test_brent_nan_objective() {
        let err = brent(|_| f64::NAN, 0.0, 1.0, RootOptions::default()).unwrap_err();
        assert!(matches!(err, RootError::NonFinite { .. }));
    }

    #[test]
    fn test_brent_iteration_cap() {
        let opts = RootOptions {
            max_iter: 1,
            ..RootOptions::default()
        };
        let err = brent(|x| x.powi(3) - 0.3, 0.0, 1.0, opts).unwrap_err();
        assert_eq!(err, RootError::NoConvergence { iterations: 1 });
    }

    #[test]
    fn test_brent_step_function_falls_back_to_bisection() {
        // Discontinuous objective: interpolation is useless, bisection still
        // narrows onto the jump.
        let root = brent(
            |x| if x < 0.3 { 1.0 } else { -1.0 },
            0.0,
            1.0,
            RootOptions::default(),
        )
        .unwrap();
        assert!((root - 0.3).abs() < 1e-9, "root = {root}");
    }
}
