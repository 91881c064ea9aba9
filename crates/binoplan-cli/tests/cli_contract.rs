use serde_json::Value;
use std::process::{Command, Output};

fn binoplan(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_binoplan"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to execute binoplan")
}

fn json_stdout(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "command should succeed, stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "output should be JSON (stderr={}). parse error: {e}",
            String::from_utf8_lossy(&output.stderr)
        )
    })
}

const UPPER: [&str; 9] = [
    "plan", "--p0", "0.1", "--p1", "0.2", "--alpha", "0.05", "--beta", "0.1",
];

#[test]
fn plan_upper_tailed_json_reports_minimal_plan() {
    let mut args = UPPER.to_vec();
    args.extend(["--format", "json"]);
    let report = json_stdout(&binoplan(&args));

    assert_eq!(report["n"].as_u64(), Some(109));
    assert_eq!(report["r"].as_u64(), Some(17));
    assert!(report["actual_alpha"].as_f64().unwrap() <= 0.05);
    assert!(report["actual_beta"].as_f64().unwrap() <= 0.1);
    assert_eq!(report["seed"]["n"].as_u64(), Some(102));
    assert_eq!(
        report["decision_rule"].as_str(),
        Some("reject H0 if X >= 17 in 109 trials")
    );
    assert_eq!(report["request"]["case"].as_str(), Some("upper_tailed"));
}

#[test]
fn plan_lower_tailed_json_reports_minimal_plan() {
    let report = json_stdout(&binoplan(&[
        "plan", "--p0", "0.2", "--p1", "0.1", "--alpha", "0.05", "--beta", "0.1", "--case",
        "lower", "--format", "json",
    ]));
    assert_eq!(report["n"].as_u64(), Some(112));
    assert_eq!(report["r"].as_u64(), Some(15));
    assert_eq!(
        report["decision_rule"].as_str(),
        Some("reject H0 if X <= 15 in 112 trials")
    );
}

#[test]
fn plan_text_output_names_decision_rule() {
    let output = binoplan(&UPPER);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Decision rule: reject H0 if X >= 17 in 109 trials"));
    assert!(stdout.contains("Type I error"));
}

#[test]
fn plan_parallel_matches_sequential() {
    let mut args = UPPER.to_vec();
    args.extend(["--format", "json", "--parallel"]);
    let report = json_stdout(&binoplan(&args));
    assert_eq!(report["n"].as_u64(), Some(109));
    assert_eq!(report["r"].as_u64(), Some(17));
}

#[test]
fn plan_config_file_overrides_search_constants() {
    let path = std::env::temp_dir().join(format!("binoplan-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{ "threshold_scan": "linear", "patience": 3 }"#).unwrap();

    let mut args = UPPER.to_vec();
    let path_str = path.to_string_lossy().into_owned();
    args.extend(["--format", "json", "--config", &path_str]);
    let output = binoplan(&args);
    let _ = std::fs::remove_file(&path);

    let report = json_stdout(&output);
    assert_eq!(report["n"].as_u64(), Some(109));
    assert_eq!(report["r"].as_u64(), Some(17));
}

#[test]
fn plan_rejects_inconsistent_hypotheses() {
    // Upper-tailed needs p1 > p0.
    let output = binoplan(&[
        "plan", "--p0", "0.2", "--p1", "0.1", "--alpha", "0.05", "--beta", "0.1",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid input"), "stderr={stderr}");
}

#[test]
fn plan_reports_empty_window() {
    // Normal approximation lands at n = 2, so the window [10, 3] is empty.
    let output = binoplan(&[
        "plan", "--p0", "0.3", "--p1", "0.7", "--alpha", "0.3", "--beta", "0.3",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No feasible plan"), "stderr={stderr}");
    assert!(stderr.contains("normal seed n=2"), "stderr={stderr}");
}

#[test]
fn plan_max_n_caps_the_window() {
    let mut args = UPPER.to_vec();
    args.extend(["--max-n", "50"]);
    let output = binoplan(&args);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No feasible plan"));
}

#[test]
fn plan_timeout_cancels_long_search() {
    // Nearly equal proportions with tiny error rates put the seed in the
    // tens of millions, so the watchdog fires long before the window ends.
    let output = binoplan(&[
        "plan", "--p0", "0.3", "--p1", "0.3005", "--alpha", "0.001", "--beta", "0.001", "--max-n",
        "100000000", "--timeout-secs", "0",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Search cancelled"), "stderr={stderr}");
}

#[test]
fn plan_rejects_unknown_format() {
    let mut args = UPPER.to_vec();
    args.extend(["--format", "yaml"]);
    let output = binoplan(&args);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown output format"));
}

#[test]
fn inverse_recovers_p_for_upper_quantile() {
    let report = json_stdout(&binoplan(&[
        "inverse", "--a", "0.95", "--n", "600", "--r", "149", "--format", "json",
    ]));
    let p = report["p"].as_f64().unwrap();
    assert!((p - 0.2210495).abs() < 1e-6, "p = {p}");
    assert!(report["abs_error"].as_f64().unwrap() < 1e-6);
    assert_eq!(report["bracket"].as_str(), Some("primary"));
}

#[test]
fn inverse_text_output_shows_check() {
    let output = binoplan(&["inverse", "--a", "0.05", "--n", "600", "--r", "150"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("p = 0.2807"), "stdout={stdout}");
    assert!(stdout.contains("P(X <= 150)"));
}

#[test]
fn inverse_rejects_r_above_n() {
    let output = binoplan(&["inverse", "--a", "0.5", "--n", "10", "--r", "11"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("exceeds sample size"));
}

#[test]
fn evaluate_reports_feasible_plan() {
    let report = json_stdout(&binoplan(&[
        "evaluate", "--p0", "0.1", "--p1", "0.2", "--alpha", "0.05", "--beta", "0.1", "--n", "109",
        "--r", "17", "--format", "json",
    ]));
    assert_eq!(report["feasible"].as_bool(), Some(true));
    assert_eq!(report["evaluation"]["alpha_ok"].as_bool(), Some(true));
}

#[test]
fn evaluate_flags_undersized_plan() {
    let report = json_stdout(&binoplan(&[
        "evaluate", "--p0", "0.1", "--p1", "0.2", "--alpha", "0.05", "--beta", "0.1", "--n", "108",
        "--r", "17", "--format", "json",
    ]));
    assert_eq!(report["feasible"].as_bool(), Some(false));
}
