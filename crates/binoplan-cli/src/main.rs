#![doc = include_str!("../README.md")]

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan {
            p0,
            p1,
            alpha,
            beta,
            case,
            config,
            parallel,
            max_n,
            timeout_secs,
            format,
        } => {
            commands::plan::run_plan_command(commands::plan::PlanArgs {
                p0,
                p1,
                alpha,
                beta,
                case,
                config,
                parallel,
                max_n,
                timeout_secs,
                format,
            })?;
        }
        Commands::Inverse { a, n, r, format } => {
            commands::inverse::run_inverse_command(a, n, r, &format)?;
        }
        Commands::Evaluate {
            p0,
            p1,
            alpha,
            beta,
            case,
            n,
            r,
            format,
        } => {
            commands::evaluate::run_evaluate_command(p0, p1, alpha, beta, &case, n, r, &format)?;
        }
    }

    Ok(())
}
