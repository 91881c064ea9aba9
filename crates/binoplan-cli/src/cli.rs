//! CLI argument definitions: top-level `Cli` struct and `Commands` enum.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub(crate) const CLI_LONG_ABOUT: &str =
    "Acceptance-sampling plans for one-sided tests on a Bernoulli proportion.\n\n\
    Typical use:\n  \
    1. binoplan plan --p0 0.05 --p1 0.06 --alpha 0.01 --beta 0.05\n  \
    2. binoplan evaluate --p0 0.05 --p1 0.06 --alpha 0.01 --beta 0.05 --n <N> --r <R>\n\n\
    Inverse problem:\n  \
    - binoplan inverse --a 0.95 --n 600 --r 149\n\n\
    Use --case lower for H1: p < p0 (reject when X <= r).";

#[derive(Parser)]
#[command(name = "binoplan")]
#[command(about = "Acceptance-sampling plans and inverse binomial solving")]
#[command(long_about = CLI_LONG_ABOUT)]
#[command(version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Find the smallest (n, r) meeting both error targets
    #[command(display_order = 10)]
    Plan {
        /// Proportion under H0
        #[arg(long)]
        p0: f64,

        /// Proportion under H1 the test must detect
        #[arg(long)]
        p1: f64,

        /// Largest acceptable Type I error
        #[arg(long)]
        alpha: f64,

        /// Largest acceptable Type II error
        #[arg(long)]
        beta: f64,

        /// Test direction: upper (H1: p > p0) | lower (H1: p < p0)
        #[arg(long, default_value = "upper")]
        case: String,

        /// JSON file overriding search constants
        #[arg(long)]
        config: Option<PathBuf>,

        /// Score the sample sizes of each chunk concurrently
        #[arg(long, default_value_t = false)]
        parallel: bool,

        /// Hard cap on the sample size
        #[arg(long)]
        max_n: Option<u64>,

        /// Cancel the search after this many seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Find p such that P(X <= r) = A for X ~ Binomial(n, p)
    #[command(display_order = 20)]
    Inverse {
        /// Left-tail probability P(X <= r)
        #[arg(long)]
        a: f64,

        /// Number of trials
        #[arg(long)]
        n: u64,

        /// Number of successes
        #[arg(long)]
        r: u64,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Report the error rates of a given plan
    #[command(display_order = 30)]
    Evaluate {
        /// Proportion under H0
        #[arg(long)]
        p0: f64,

        /// Proportion under H1
        #[arg(long)]
        p1: f64,

        /// Type I error target
        #[arg(long)]
        alpha: f64,

        /// Type II error target
        #[arg(long)]
        beta: f64,

        /// Test direction: upper | lower
        #[arg(long, default_value = "upper")]
        case: String,

        /// Number of trials
        #[arg(long)]
        n: u64,

        /// Rejection threshold
        #[arg(long)]
        r: u64,

        /// Output format: text | json
        #[arg(long, default_value = "text")]
        format: String,
    },
}
