#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;
mod error;

use anyhow::Result;
use cli::Cli;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Used when RUST_LOG is unset or blank
const DEFAULT_LOG_DIRECTIVE: &str = "sentiment_pipeline=info";

fn log_filter(rust_log: Option<&str>) -> Result<EnvFilter> {
    match rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        Some(directives) => Ok(EnvFilter::try_new(directives)?),
        None => Ok(EnvFilter::new(DEFAULT_LOG_DIRECTIVE)),
    }
}

fn main() -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref())?)
        .init();

    let cli = Cli::parse();
    cli.run()
}
