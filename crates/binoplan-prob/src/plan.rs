use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::binomial::{BinomialError, BinomialParams};
use crate::normal::NormalSeed;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlanError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("{}", no_solution_message(.seed_n, .n_lo, .n_hi, .visited))]
    NoSolution {
        /// Sample size of the normal-approximation seed.
        seed_n: u64,
        n_lo: u64,
        n_hi: u64,
        visited: u64,
    },
    #[error("Search cancelled{}", cancelled_suffix(.last_n))]
    Cancelled { last_n: Option<u64> },
    #[error("Binomial error: {0}")]
    Binomial(#[from] BinomialError),
}

fn no_solution_message(seed_n: &u64, n_lo: &u64, n_hi: &u64, visited: &u64) -> String {
    if n_lo > n_hi {
        format!(
            "No feasible plan: the sample-size window around the normal seed \
             n={seed_n} is empty (lower bound {n_lo}, upper bound {n_hi})"
        )
    } else {
        format!(
            "No feasible plan for sample sizes in [{n_lo}, {n_hi}] \
             ({visited} sample sizes scanned)"
        )
    }
}

fn cancelled_suffix(last_n: &Option<u64>) -> String {
    match last_n {
        Some(n) => format!(" after scanning up to n={n}"),
        None => String::new(),
    }
}

/// Direction of a one-sided test on a Bernoulli proportion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCase {
    /// H0: p <= p0 against H1: p > p0. Reject when X >= r.
    UpperTailed,
    /// H0: p >= p0 against H1: p < p0. Reject when X <= r.
    LowerTailed,
}

impl TestCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestCase::UpperTailed => "upper",
            TestCase::LowerTailed => "lower",
        }
    }

    /// Comparison used by the rejection rule.
    pub fn rejection_operator(&self) -> &'static str {
        match self {
            TestCase::UpperTailed => ">=",
            TestCase::LowerTailed => "<=",
        }
    }
}

impl std::fmt::Display for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestCase {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upper" | "upper_tailed" | "greater" => Ok(TestCase::UpperTailed),
            "lower" | "lower_tailed" | "less" => Ok(TestCase::LowerTailed),
            other => Err(PlanError::InvalidInput(format!(
                "unknown test case '{other}', expected 'upper' or 'lower'"
            ))),
        }
    }
}

/// Target error rates of a one-sided test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Proportion under H0.
    pub p0: f64,
    /// Proportion under H1 that the test must detect.
    pub p1: f64,
    /// Largest acceptable Type I error.
    pub alpha: f64,
    /// Largest acceptable Type II error.
    pub beta: f64,
    pub case: TestCase,
}

fn check_open_unit(name: &str, v: f64) -> Result<(), PlanError> {
    if v > 0.0 && v < 1.0 {
        Ok(())
    } else {
        Err(PlanError::InvalidInput(format!(
            "{name} must lie strictly inside (0, 1), got {v}"
        )))
    }
}

impl PlanRequest {
    /// Construct a validated request.
    pub fn new(p0: f64, p1: f64, alpha: f64, beta: f64, case: TestCase) -> Result<Self, PlanError> {
        let request = Self {
            p0,
            p1,
            alpha,
            beta,
            case,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        check_open_unit("p0", self.p0)?;
        check_open_unit("p1", self.p1)?;
        check_open_unit("alpha", self.alpha)?;
        check_open_unit("beta", self.beta)?;
        match self.case {
            TestCase::UpperTailed if self.p1 <= self.p0 => Err(PlanError::InvalidInput(format!(
                "upper-tailed test needs p1 > p0, got p0={}, p1={}",
                self.p0, self.p1
            ))),
            TestCase::LowerTailed if self.p1 >= self.p0 => Err(PlanError::InvalidInput(format!(
                "lower-tailed test needs p1 < p0, got p0={}, p1={}",
                self.p0, self.p1
            ))),
            _ => Ok(()),
        }
    }
}

/// Error rates of every threshold at one sample size.
///
/// Holds the two distributions so a threshold scan does not rebuild them.
#[derive(Debug, Clone)]
pub(crate) struct RateModel {
    case: TestCase,
    under_h0: BinomialParams,
    under_h1: BinomialParams,
    evaluations: u64,
}

impl RateModel {
    pub(crate) fn new(request: &PlanRequest, n: u64) -> Result<Self, PlanError> {
        Ok(Self {
            case: request.case,
            under_h0: BinomialParams::new(n, request.p0)?,
            under_h1: BinomialParams::new(n, request.p1)?,
            evaluations: 0,
        })
    }

    /// Type I error of threshold `r`.
    pub(crate) fn alpha(&mut self, r: u64) -> f64 {
        self.evaluations += 1;
        let r = r as i64;
        match self.case {
            TestCase::UpperTailed => self.under_h0.sf(r - 1),
            TestCase::LowerTailed => self.under_h0.cdf(r),
        }
    }

    /// Type II error of threshold `r`.
    pub(crate) fn beta(&mut self, r: u64) -> f64 {
        self.evaluations += 1;
        let r = r as i64;
        match self.case {
            TestCase::UpperTailed => self.under_h1.cdf(r - 1),
            TestCase::LowerTailed => self.under_h1.sf(r),
        }
    }

    /// CDF evaluations performed so far.
    pub(crate) fn evaluations(&self) -> u64 {
        self.evaluations
    }
}

/// Achieved error rates of a fixed plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlanEvaluation {
    pub n: u64,
    pub r: u64,
    pub actual_alpha: f64,
    pub actual_beta: f64,
    /// Probability of rejecting H0 when p = p1.
    pub power: f64,
    pub alpha_ok: bool,
    pub beta_ok: bool,
}

impl PlanEvaluation {
    pub fn feasible(&self) -> bool {
        self.alpha_ok && self.beta_ok
    }
}

/// Error rates of the plan "take `n` trials, compare the success count with `r`".
pub fn evaluate_plan(request: &PlanRequest, n: u64, r: u64) -> Result<PlanEvaluation, PlanError> {
    request.validate()?;
    if n == 0 {
        return Err(PlanError::InvalidInput(
            "sample size n must be positive".into(),
        ));
    }
    if r > n {
        return Err(PlanError::InvalidInput(format!(
            "threshold r={r} exceeds sample size n={n}"
        )));
    }
    let mut model = RateModel::new(request, n)?;
    let actual_alpha = model.alpha(r);
    let actual_beta = model.beta(r);
    Ok(PlanEvaluation {
        n,
        r,
        actual_alpha,
        actual_beta,
        power: 1.0 - actual_beta,
        alpha_ok: actual_alpha <= request.alpha,
        beta_ok: actual_beta <= request.beta,
    })
}

/// Bookkeeping of one exact search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SearchStats {
    pub n_lo: u64,
    pub n_hi: u64,
    /// Sample sizes whose thresholds were scanned.
    pub visited: u64,
    /// Binomial tail evaluations.
    pub evaluations: u64,
}

/// A feasible sampling plan.
///
/// `actual_alpha <= request.alpha` and `actual_beta <= request.beta` always hold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResult {
    pub request: PlanRequest,
    /// Number of trials.
    pub n: u64,
    /// Rejection threshold.
    pub r: u64,
    pub actual_alpha: f64,
    pub actual_beta: f64,
    pub power: f64,
    /// `1000 n + 1000 (alpha - actual_alpha)^2 + 1000 (beta - actual_beta)^2`.
    pub score: f64,
    /// Normal-approximation starting point.
    pub seed: NormalSeed,
    pub stats: SearchStats,
}

impl PlanResult {
    /// Whether `successes` out of `n` trials rejects H0.
    pub fn rejects(&self, successes: u64) -> bool {
        match self.request.case {
            TestCase::UpperTailed => successes >= self.r,
            TestCase::LowerTailed => successes <= self.r,
        }
    }

    pub fn decision_rule(&self) -> String {
        format!(
            "reject H0 if X {} {} in {} trials",
            self.request.case.rejection_operator(),
            self.r,
            self.n
        )
    }
}

impl std::fmt::Display for PlanResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (h0, h1) = match self.request.case {
            TestCase::UpperTailed => ("<=", ">"),
            TestCase::LowerTailed => (">=", "<"),
        };
        writeln!(
            f,
            "Sampling plan (H0: p {h0} {} vs H1: p {h1} {}):",
            self.request.p0, self.request.p1
        )?;
        writeln!(
            f,
            "  Sample size n: {} (normal approximation {})",
            self.n, self.seed.n
        )?;
        writeln!(
            f,
            "  Threshold r: {} (normal approximation {})",
            self.r, self.seed.r
        )?;
        writeln!(f, "  Decision rule: {}", self.decision_rule())?;
        writeln!(
            f,
            "  Type I error: {:.10} (target {})",
            self.actual_alpha, self.request.alpha
        )?;
        writeln!(
            f,
            "  Type II error: {:.10} (target {})",
            self.actual_beta, self.request.beta
        )?;
        write!(f, "  Power at p1={}: {:.6}", self.request.p1, self.power)
    }
}
