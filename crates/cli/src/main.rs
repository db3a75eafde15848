mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use redzone_core::config::{load_dotenv, Config};

use crate::cli::{CliArgs, Command};

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let args = CliArgs::parse();
    let config = match args.profile.as_deref() {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    config.log_summary();

    match args.command {
        Command::Fields { catalog } => commands::fields(&config, catalog),
        Command::Validate {
            rules,
            catalog,
            strict,
        } => commands::validate(&config, rules, catalog, strict),
        Command::Evaluate { rules, record, all } => {
            commands::evaluate(&config, rules, &record, all)
        }
        Command::Scan {
            rules,
            records,
            threads,
            audit,
        } => commands::scan(&config, rules, &records, threads, audit),
    }
}
