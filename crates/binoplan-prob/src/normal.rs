use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use tracing::debug;

use crate::plan::{PlanError, PlanRequest, TestCase};

/// Large-sample starting point for the exact search.
///
/// Not guaranteed to satisfy the exact error bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalSeed {
    pub n: u64,
    pub r: u64,
    pub z_alpha: f64,
    pub z_beta: f64,
}

/// Standard normal quantile `Phi^-1(q)` for `q` in (0, 1).
pub fn inverse_normal_cdf(q: f64) -> Result<f64, PlanError> {
    if !(q > 0.0 && q < 1.0) {
        return Err(PlanError::InvalidInput(format!(
            "normal quantile level must lie strictly inside (0, 1), got {q}"
        )));
    }
    let standard = Normal::new(0.0, 1.0)
        .map_err(|e| PlanError::InvalidInput(format!("standard normal: {e}")))?;
    Ok(standard.inverse_cdf(q))
}

/// Normal approximation to the binomial plan.
///
/// `n = ceil((z_a sqrt(p0 q0) + z_b sqrt(p1 q1))^2 / (p1 - p0)^2)`, and the
/// threshold sits `z_a` standard deviations past `n p0` on the rejection side.
pub fn normal_approximation(request: &PlanRequest) -> Result<NormalSeed, PlanError> {
    request.validate()?;
    let PlanRequest {
        p0,
        p1,
        alpha,
        beta,
        ..
    } = *request;

    let z_alpha = inverse_normal_cdf(1.0 - alpha)?;
    let z_beta = inverse_normal_cdf(1.0 - beta)?;

    let sd0 = (p0 * (1.0 - p0)).sqrt();
    let sd1 = (p1 * (1.0 - p1)).sqrt();
    let numerator = (z_alpha * sd0 + z_beta * sd1).powi(2);
    let denominator = (p1 - p0).powi(2);
    // `as` saturates, so astronomically large seeds clamp to u64::MAX.
    let n = ((numerator / denominator).ceil() as u64).max(1);

    let nf = n as f64;
    let spread = z_alpha * (nf * p0 * (1.0 - p0)).sqrt();
    let r_raw = match request.case {
        TestCase::UpperTailed => (nf * p0 + spread).ceil(),
        TestCase::LowerTailed => (nf * p0 - spread).floor(),
    };
    let r = r_raw.clamp(0.0, nf) as u64;

    debug!(n, r, z_alpha, z_beta, case = %request.case, "normal approximation");
    Ok(NormalSeed {
        n,
        r,
        z_alpha,
        z_beta,
    })
}
