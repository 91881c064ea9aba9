use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::binomial::{self, BinomialError, BinomialParams};
use crate::config::InverseConfig;
use crate::roots::{self, RootError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InverseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("No p in (0, 1) gives P(X <= {r}) = {a} with n={n}: {reason}")]
    NoSolution {
        a: f64,
        n: u64,
        r: u64,
        reason: RootError,
    },
    #[error("Binomial error: {0}")]
    Binomial(#[from] BinomialError),
}

/// Observed left-tail probability `A = P(X <= r)` of `Binomial(n, p)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InverseRequest {
    pub a: f64,
    pub n: u64,
    pub r: u64,
}

impl InverseRequest {
    pub fn new(a: f64, n: u64, r: u64) -> Result<Self, InverseError> {
        let request = Self { a, n, r };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), InverseError> {
        if !(self.a > 0.0 && self.a < 1.0) {
            return Err(InverseError::InvalidInput(format!(
                "A must lie strictly inside (0, 1), got {}",
                self.a
            )));
        }
        if self.n == 0 {
            return Err(InverseError::InvalidInput(
                "sample size n must be positive".into(),
            ));
        }
        if self.r > self.n {
            return Err(InverseError::InvalidInput(format!(
                "success count r={} exceeds sample size n={}",
                self.r, self.n
            )));
        }
        Ok(())
    }
}

/// Bracket that produced the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketUsed {
    Primary,
    Expanded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InverseResult {
    pub request: InverseRequest,
    /// Success probability with `F(r; n, p) = A`.
    pub p: f64,
    /// `F(r; n, p)` at the returned root.
    pub achieved: f64,
    /// `|achieved - A|`.
    pub abs_error: f64,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub bracket: BracketUsed,
}

impl std::fmt::Display for InverseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let InverseRequest { a, n, r } = self.request;
        writeln!(f, "p = {:.10}", self.p)?;
        writeln!(
            f,
            "  Check: P(X <= {r}) with n={n}, p={:.10} = {:.10} (target {a}, error {:.2e})",
            self.p, self.achieved, self.abs_error
        )?;
        writeln!(f, "  Mean (np): {:.2}", self.mean)?;
        writeln!(f, "  Standard deviation: {:.2}", self.std_dev)?;
        write!(f, "  Variance: {:.2}", self.variance)
    }
}

/// Recover `p` from `A = F(r; n, p)` with the default configuration.
pub fn solve_inverse_p(request: &InverseRequest) -> Result<InverseResult, InverseError> {
    solve_inverse_p_with(request, &InverseConfig::default())
}

/// Recover `p` from `A = F(r; n, p)`.
///
/// `F(r; n, p)` falls monotonically in `p`, so `F(r; n, p) - A` changes sign
/// once. The primary bracket is tried first; if it fails (A very close to 0
/// or 1) the expanded bracket is tried.
pub fn solve_inverse_p_with(
    request: &InverseRequest,
    config: &InverseConfig,
) -> Result<InverseResult, InverseError> {
    request.validate()?;
    let InverseRequest { a, n, r } = *request;
    let r_i = r as i64;
    // p stays inside (0, 1) here, so the CDF cannot fail; NaN would surface
    // as RootError::NonFinite anyway.
    let objective = |p: f64| binomial::cdf(r_i, n, p).map_or(f64::NAN, |f| f - a);

    let attempts = [
        (BracketUsed::Primary, config.primary_bracket),
        (BracketUsed::Expanded, config.expanded_bracket),
    ];
    let mut last_err = RootError::NoConvergence { iterations: 0 };
    for (bracket, (lo, hi)) in attempts {
        let p = match roots::brent(objective, lo, hi, config.root) {
            Ok(p) => p,
            Err(err) => {
                if bracket == BracketUsed::Primary {
                    warn!(%err, a, n, r, "primary bracket failed; retrying with expanded bracket");
                }
                last_err = err;
                continue;
            }
        };

        let params = BinomialParams::new(n, p)?;
        let achieved = params.cdf(r_i);
        let abs_error = (achieved - a).abs();
        if abs_error > config.max_residual {
            debug!(p, achieved, abs_error, "root rejected: residual too large");
            last_err = RootError::ResidualTooLarge {
                x: p,
                residual: abs_error,
                tolerance: config.max_residual,
            };
            continue;
        }

        debug!(p, achieved, ?bracket, "inverse binomial solved");
        return Ok(InverseResult {
            request: *request,
            p,
            achieved,
            abs_error,
            mean: params.mean(),
            variance: params.variance(),
            std_dev: params.std_dev(),
            bracket,
        });
    }

    Err(InverseError::NoSolution {
        a,
        n,
        r,
        reason: last_err,
    })
}
