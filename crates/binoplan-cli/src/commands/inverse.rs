// Command handler for: Inverse

use miette::IntoDiagnostic;

use binoplan_prob::{solve_inverse_p, InverseRequest};

use super::helpers::{parse_output_format, print_json, OutputFormat};

/// Handler for the `inverse` subcommand.
pub(crate) fn run_inverse_command(a: f64, n: u64, r: u64, format: &str) -> miette::Result<()> {
    let format = parse_output_format(format)?;
    let request = InverseRequest::new(a, n, r).into_diagnostic()?;
    let result = solve_inverse_p(&request).into_diagnostic()?;
    match format {
        OutputFormat::Text => println!("{result}"),
        OutputFormat::Json => print_json(&result)?,
    }
    Ok(())
}
