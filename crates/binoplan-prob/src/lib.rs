//! Acceptance-sampling plans for one-sided tests on a Bernoulli proportion,
//! and recovery of the success probability implied by a binomial left tail.
//!
//! [`compute_plan`] finds the smallest sample size `n` and threshold `r` that
//! keep both error rates of "reject H0 if X >= r" (or "X <= r") within their
//! targets. [`solve_inverse_p`] finds `p` with `P(X <= r) = A`.

pub mod binomial;
pub mod config;
pub mod inverse;
pub mod normal;
pub mod plan;
pub mod progress;
pub mod roots;
pub mod search;

pub use binomial::{BinomialError, BinomialParams};
pub use config::{InverseConfig, RangeFactors, SearchConfig, ThresholdScan};
pub use inverse::{
    solve_inverse_p, solve_inverse_p_with, BracketUsed, InverseError, InverseRequest, InverseResult,
};
pub use normal::{inverse_normal_cdf, normal_approximation, NormalSeed};
pub use plan::{
    evaluate_plan, PlanError, PlanEvaluation, PlanRequest, PlanResult, SearchStats, TestCase,
};
pub use progress::{CancellationToken, ChannelSink, Progress, ProgressSink, SinkError};
pub use roots::{brent, RootError, RootOptions};
pub use search::{compute_plan, threshold_range, ExactPlanSearch, SearchWindow};
