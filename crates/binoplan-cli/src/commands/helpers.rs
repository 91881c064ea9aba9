// Shared parsing and rendering helpers for the command handlers.

use std::path::Path;

use miette::{IntoDiagnostic, WrapErr};
use serde::Serialize;

use binoplan_prob::{SearchConfig, TestCase};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

pub(crate) fn parse_output_format(raw: &str) -> miette::Result<OutputFormat> {
    match raw {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(miette::miette!(
            "Unknown output format: {other}. Use 'text' or 'json'."
        )),
    }
}

pub(crate) fn parse_test_case(raw: &str) -> miette::Result<TestCase> {
    raw.parse::<TestCase>().into_diagnostic()
}

/// Load search constants from a JSON file. Missing fields keep their defaults.
pub(crate) fn load_search_config(path: Option<&Path>) -> miette::Result<SearchConfig> {
    let Some(path) = path else {
        return Ok(SearchConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read search config {}", path.display()))?;
    let config: SearchConfig = serde_json::from_str(&raw)
        .into_diagnostic()
        .wrap_err_with(|| format!("Invalid search config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded search config");
    Ok(config)
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> miette::Result<()> {
    let rendered = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{rendered}");
    Ok(())
}
