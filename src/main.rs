use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use rankscrape::{config::Cli, config::ScrapeConfig, info_time, process::run};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let start_time = Local::now();
    let config = ScrapeConfig::from(Cli::parse());

    match run(&config).await {
        Ok(summary) => {
            info_time!(start_time, "Full program time:");
            println!(
                "Saved {} rows ({} locked) from {} pages to {}",
                summary.rows(),
                summary.locked_rows,
                summary.pages(),
                summary.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = ?e, "run aborted");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
