//! Exact `(n, r)` search seeded by the normal approximation.
//!
//! Sample sizes are scanned in ascending order inside a window around the
//! seed. For each `n` the feasible thresholds are scored and the best plan is
//! kept. Once a feasible plan exists the scan continues for `patience` more
//! sample sizes, then stops. The result is minimal within the window only;
//! the window and the threshold ranges are heuristics.

use tracing::{debug, info, warn};

use crate::config::{SearchConfig, ThresholdScan};
use crate::normal::{normal_approximation, NormalSeed};
use crate::plan::{PlanError, PlanRequest, PlanResult, RateModel, SearchStats, TestCase};
use crate::progress::{CancellationToken, Progress, ProgressSink};

const SCORE_WEIGHT: f64 = 1000.0;

/// Feasible plan at one sample size.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    n: u64,
    r: u64,
    alpha: f64,
    beta: f64,
    /// Squared distance between achieved and target error rates.
    slack: f64,
}

impl Candidate {
    fn new(request: &PlanRequest, n: u64, r: u64, alpha: f64, beta: f64) -> Self {
        let slack = (request.alpha - alpha).powi(2) + (request.beta - beta).powi(2);
        Self {
            n,
            r,
            alpha,
            beta,
            slack,
        }
    }

    fn score(&self) -> f64 {
        SCORE_WEIGHT * self.n as f64 + SCORE_WEIGHT * self.slack
    }

    /// Smaller `n` wins outright; then the plan that uses more of the error
    /// budget; then the smaller threshold.
    fn beats(&self, other: &Candidate) -> bool {
        self.n
            .cmp(&other.n)
            .then(self.slack.total_cmp(&other.slack))
            .then(self.r.cmp(&other.r))
            .is_lt()
    }
}

/// Inclusive range of sample sizes scanned by one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub n_lo: u64,
    pub n_hi: u64,
}

impl SearchWindow {
    /// `[max(min_n, floor(low * seed)), min(max_n, ceil(high * seed))]`.
    pub fn around(seed_n: u64, config: &SearchConfig) -> Self {
        let nf = seed_n as f64;
        let n_lo = ((config.window_low * nf).floor() as u64).max(config.min_sample_size);
        let n_hi = ((config.window_high * nf).ceil() as u64).min(config.max_sample_size);
        Self { n_lo, n_hi }
    }

    pub fn is_empty(&self) -> bool {
        self.n_lo > self.n_hi
    }

    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.n_hi - self.n_lo + 1
        }
    }
}

/// Thresholds considered at sample size `n`, clamped to `[0, n]`.
///
/// The range spans the expected success counts under both hypotheses,
/// widened by the configured factors.
pub fn threshold_range(request: &PlanRequest, n: u64, config: &SearchConfig) -> (u64, u64) {
    let factors = config.range_factors(request.case);
    let (p_low, p_high) = match request.case {
        TestCase::UpperTailed => (request.p0, request.p1),
        TestCase::LowerTailed => (request.p1, request.p0),
    };
    let nf = n as f64;
    let lo = (factors.low * nf * p_low).floor().clamp(0.0, nf) as u64;
    let hi = (factors.high * nf * p_high).ceil().clamp(0.0, nf) as u64;
    (lo, hi)
}

/// Smallest `r` in `[lo, hi]` with `pred(r)`, for `pred` monotone false-then-true.
fn first_true(lo: u64, hi: u64, mut pred: impl FnMut(u64) -> bool) -> Option<u64> {
    let (mut a, mut b) = (lo, hi + 1);
    while a < b {
        let mid = a + (b - a) / 2;
        if pred(mid) {
            b = mid;
        } else {
            a = mid + 1;
        }
    }
    (a <= hi).then_some(a)
}

/// Largest `r` in `[lo, hi]` with `pred(r)`, for `pred` monotone true-then-false.
fn last_true(lo: u64, hi: u64, mut pred: impl FnMut(u64) -> bool) -> Option<u64> {
    let (mut a, mut b) = (lo, hi + 1);
    while a < b {
        let mid = a + (b - a) / 2;
        if pred(mid) {
            a = mid + 1;
        } else {
            b = mid;
        }
    }
    (a > lo).then(|| a - 1)
}

/// Thresholds in `[r_lo, r_hi]` meeting both error bounds.
///
/// Type I error is monotone in `r` in one direction and Type II error in the
/// other, so the feasible set is an interval.
fn feasible_span(
    model: &mut RateModel,
    request: &PlanRequest,
    r_lo: u64,
    r_hi: u64,
) -> Option<(u64, u64)> {
    if r_lo > r_hi {
        return None;
    }
    let (alpha_t, beta_t) = (request.alpha, request.beta);
    let (first, last) = match request.case {
        // alpha falls and beta rises as r grows
        TestCase::UpperTailed => (
            first_true(r_lo, r_hi, |r| model.alpha(r) <= alpha_t)?,
            last_true(r_lo, r_hi, |r| model.beta(r) <= beta_t)?,
        ),
        // alpha rises and beta falls as r grows
        TestCase::LowerTailed => (
            first_true(r_lo, r_hi, |r| model.beta(r) <= beta_t)?,
            last_true(r_lo, r_hi, |r| model.alpha(r) <= alpha_t)?,
        ),
    };
    (first <= last).then_some((first, last))
}

#[derive(Debug, Clone, Copy)]
struct SizeOutcome {
    n: u64,
    best: Option<Candidate>,
    evaluations: u64,
}

fn scan_sample_size(
    request: &PlanRequest,
    n: u64,
    config: &SearchConfig,
) -> Result<SizeOutcome, PlanError> {
    let (r_lo, r_hi) = threshold_range(request, n, config);
    let mut model = RateModel::new(request, n)?;
    let span = match config.threshold_scan {
        ThresholdScan::Linear => (r_lo <= r_hi).then_some((r_lo, r_hi)),
        ThresholdScan::Bisect => feasible_span(&mut model, request, r_lo, r_hi),
    };

    let mut best: Option<Candidate> = None;
    if let Some((first, last)) = span {
        for r in first..=last {
            let alpha = model.alpha(r);
            let beta = model.beta(r);
            if alpha > request.alpha || beta > request.beta {
                continue;
            }
            let candidate = Candidate::new(request, n, r, alpha, beta);
            if best.map_or(true, |b| candidate.beats(&b)) {
                best = Some(candidate);
            }
        }
    }
    Ok(SizeOutcome {
        n,
        best,
        evaluations: model.evaluations(),
    })
}

type Outcomes<'a> = Box<dyn Iterator<Item = Result<SizeOutcome, PlanError>> + 'a>;

/// Outcomes for `from..=to` in ascending `n`.
///
/// The sequential path is lazy: sample sizes the caller never pulls are
/// never scored. The parallel path scores the whole range up front.
#[cfg(feature = "parallel")]
fn scan_range<'a>(
    request: &'a PlanRequest,
    from: u64,
    to: u64,
    config: &'a SearchConfig,
) -> Outcomes<'a> {
    if config.parallel {
        use rayon::prelude::*;
        let outcomes: Vec<Result<SizeOutcome, PlanError>> = (from..=to)
            .into_par_iter()
            .map(|n| scan_sample_size(request, n, config))
            .collect();
        return Box::new(outcomes.into_iter());
    }
    Box::new((from..=to).map(move |n| scan_sample_size(request, n, config)))
}

#[cfg(not(feature = "parallel"))]
fn scan_range<'a>(
    request: &'a PlanRequest,
    from: u64,
    to: u64,
    config: &'a SearchConfig,
) -> Outcomes<'a> {
    if config.parallel {
        debug!("parallel scan requested but the `parallel` feature is disabled");
    }
    Box::new((from..=to).map(move |n| scan_sample_size(request, n, config)))
}

/// Exact plan search with optional progress reporting and cancellation.
///
/// Sample sizes are processed in chunks of `progress_every`. Before each chunk
/// the cancellation token is polled and a [`Progress`] event is emitted. With
/// `parallel` set, the sample sizes of a chunk are scored concurrently and
/// folded in ascending order, so the selected plan matches a sequential scan.
pub struct ExactPlanSearch<'a> {
    config: SearchConfig,
    sink: Option<&'a mut dyn ProgressSink>,
    cancel: Option<CancellationToken>,
}

impl<'a> ExactPlanSearch<'a> {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            sink: None,
            cancel: None,
        }
    }

    pub fn with_progress(mut self, sink: &'a mut dyn ProgressSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Seed with the normal approximation, then search.
    pub fn compute(&mut self, request: &PlanRequest) -> Result<PlanResult, PlanError> {
        let seed = normal_approximation(request)?;
        self.run(request, seed)
    }

    /// Search the window around `seed`.
    ///
    /// # Returns
    /// The best feasible plan, [`PlanError::NoSolution`] when no sample size in
    /// the window admits a feasible threshold, or [`PlanError::Cancelled`].
    pub fn run(
        &mut self,
        request: &PlanRequest,
        seed: NormalSeed,
    ) -> Result<PlanResult, PlanError> {
        request.validate()?;
        self.config.validate()?;

        let window = SearchWindow::around(seed.n, &self.config);
        let mut stats = SearchStats {
            n_lo: window.n_lo,
            n_hi: window.n_hi,
            ..SearchStats::default()
        };
        debug!(
            seed_n = seed.n,
            seed_r = seed.r,
            n_lo = window.n_lo,
            n_hi = window.n_hi,
            "exact search window"
        );
        if window.is_empty() {
            return Err(PlanError::NoSolution {
                seed_n: seed.n,
                n_lo: window.n_lo,
                n_hi: window.n_hi,
                visited: 0,
            });
        }

        let total = window.len() as f64;
        let chunk = self.config.progress_every;
        let mut best: Option<Candidate> = None;
        let mut stop_after = window.n_hi;
        let mut last_scanned: Option<u64> = None;
        let mut next = window.n_lo;

        while next <= stop_after {
            if self.is_cancelled() {
                debug!(?last_scanned, "exact search cancelled");
                return Err(PlanError::Cancelled {
                    last_n: last_scanned,
                });
            }
            self.emit(Progress {
                percent: 100.0 * (next - window.n_lo) as f64 / total,
                n: next,
                best_n: best.map(|c| c.n),
            });

            let chunk_end = next.saturating_add(chunk - 1).min(stop_after);
            for outcome in scan_range(request, next, chunk_end, &self.config) {
                let outcome = outcome?;
                if outcome.n > stop_after {
                    break;
                }
                stats.visited += 1;
                stats.evaluations += outcome.evaluations;
                last_scanned = Some(outcome.n);

                let Some(candidate) = outcome.best else {
                    continue;
                };
                if best.map_or(true, |b| candidate.beats(&b)) {
                    debug!(
                        n = candidate.n,
                        r = candidate.r,
                        alpha = candidate.alpha,
                        beta = candidate.beta,
                        "new best plan"
                    );
                    best = Some(candidate);
                    stop_after = candidate
                        .n
                        .saturating_add(self.config.patience)
                        .min(window.n_hi);
                }
            }
            next = chunk_end + 1;
        }

        let Some(best) = best else {
            debug!(visited = stats.visited, "no feasible plan in window");
            return Err(PlanError::NoSolution {
                seed_n: seed.n,
                n_lo: window.n_lo,
                n_hi: window.n_hi,
                visited: stats.visited,
            });
        };

        self.emit(Progress {
            percent: 100.0,
            n: best.n,
            best_n: Some(best.n),
        });
        info!(
            n = best.n,
            r = best.r,
            actual_alpha = best.alpha,
            actual_beta = best.beta,
            visited = stats.visited,
            evaluations = stats.evaluations,
            "sampling plan found"
        );
        Ok(PlanResult {
            request: *request,
            n: best.n,
            r: best.r,
            actual_alpha: best.alpha,
            actual_beta: best.beta,
            power: 1.0 - best.beta,
            score: best.score(),
            seed,
            stats,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|t| t.is_cancelled())
    }

    fn emit(&mut self, progress: Progress) {
        if let Some(sink) = self.sink.as_mut() {
            if let Err(err) = sink.report(progress) {
                warn!(%err, "progress sink failed; continuing search");
            }
        }
    }
}

/// Compute a sampling plan with the default configuration.
pub fn compute_plan(request: &PlanRequest) -> Result<PlanResult, PlanError> {
    ExactPlanSearch::new(SearchConfig::default()).compute(request)
}
