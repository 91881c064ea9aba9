// Command handler for: Plan
//
// Seeds with the normal approximation, runs the exact search with progress
// logging, and renders the selected plan.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use miette::IntoDiagnostic;
use serde::Serialize;
use tracing::info;

use binoplan_prob::{CancellationToken, ExactPlanSearch, PlanRequest, PlanResult, Progress};

use super::helpers::{
    load_search_config, parse_output_format, parse_test_case, print_json, OutputFormat,
};

/// Progress is logged at most once per this many percentage points.
const PROGRESS_LOG_STEP: f64 = 10.0;

pub(crate) struct PlanArgs {
    pub(crate) p0: f64,
    pub(crate) p1: f64,
    pub(crate) alpha: f64,
    pub(crate) beta: f64,
    pub(crate) case: String,
    pub(crate) config: Option<PathBuf>,
    pub(crate) parallel: bool,
    pub(crate) max_n: Option<u64>,
    pub(crate) timeout_secs: Option<u64>,
    pub(crate) format: String,
}

#[derive(Serialize)]
struct PlanReport<'a> {
    #[serde(flatten)]
    plan: &'a PlanResult,
    decision_rule: String,
}

/// Cancel `token` once `timeout` has elapsed.
fn spawn_watchdog(token: CancellationToken, timeout: Duration) {
    thread::spawn(move || {
        thread::sleep(timeout);
        token.cancel();
    });
}

/// Handler for the `plan` subcommand.
pub(crate) fn run_plan_command(args: PlanArgs) -> miette::Result<()> {
    let format = parse_output_format(&args.format)?;
    let case = parse_test_case(&args.case)?;
    let request =
        PlanRequest::new(args.p0, args.p1, args.alpha, args.beta, case).into_diagnostic()?;

    let mut config = load_search_config(args.config.as_deref())?;
    if args.parallel {
        config.parallel = true;
    }
    if let Some(max_n) = args.max_n {
        config.max_sample_size = max_n;
    }

    let token = CancellationToken::new();
    if let Some(secs) = args.timeout_secs {
        spawn_watchdog(token.clone(), Duration::from_secs(secs));
    }

    let mut next_log = 0.0;
    let mut log_progress = |p: Progress| {
        if p.percent >= next_log {
            info!(percent = p.percent.round(), n = p.n, best_n = ?p.best_n, "searching");
            next_log =
                (p.percent / PROGRESS_LOG_STEP).floor() * PROGRESS_LOG_STEP + PROGRESS_LOG_STEP;
        }
    };

    let plan = ExactPlanSearch::new(config)
        .with_progress(&mut log_progress)
        .with_cancellation(token)
        .compute(&request)
        .into_diagnostic()?;

    match format {
        OutputFormat::Text => println!("{plan}"),
        OutputFormat::Json => print_json(&PlanReport {
            decision_rule: plan.decision_rule(),
            plan: &plan,
        })?,
    }
    Ok(())
}
