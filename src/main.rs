use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use typesort::cli::{Args, run_cli};
use typesort::output::OutputFormatter;

fn main() -> ExitCode {
    let args = Args::parse();

    // Diagnostics only; RUST_LOG=typesort=debug to trace planning decisions
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run_cli(&args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::from(e.exit_code())
        }
    }
}
