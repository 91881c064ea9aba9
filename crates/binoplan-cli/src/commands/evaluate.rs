// Command handler for: Evaluate
//
// Reports the exact error rates of a user-supplied (n, r) and whether each
// stays within its target.

use miette::IntoDiagnostic;

use binoplan_prob::{evaluate_plan, PlanRequest};

use super::helpers::{parse_output_format, parse_test_case, print_json, OutputFormat};

fn verdict(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "EXCEEDED"
    }
}

/// Handler for the `evaluate` subcommand.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run_evaluate_command(
    p0: f64,
    p1: f64,
    alpha: f64,
    beta: f64,
    case: &str,
    n: u64,
    r: u64,
    format: &str,
) -> miette::Result<()> {
    let format = parse_output_format(format)?;
    let case = parse_test_case(case)?;
    let request = PlanRequest::new(p0, p1, alpha, beta, case).into_diagnostic()?;
    let eval = evaluate_plan(&request, n, r).into_diagnostic()?;

    match format {
        OutputFormat::Text => {
            println!(
                "Plan: reject H0 if X {} {r} in {n} trials",
                case.rejection_operator()
            );
            println!(
                "  Type I error: {:.10} (target {alpha}) {}",
                eval.actual_alpha,
                verdict(eval.alpha_ok)
            );
            println!(
                "  Type II error: {:.10} (target {beta}) {}",
                eval.actual_beta,
                verdict(eval.beta_ok)
            );
            println!("  Power at p1={p1}: {:.6}", eval.power);
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "request": request,
            "evaluation": eval,
            "feasible": eval.feasible(),
        }))?,
    }
    Ok(())
}
