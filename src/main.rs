use clap::Parser;
use sortdir::cli::{Cli, report_exit_code, run_cli};
use sortdir::output::OutputFormatter;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v/-q when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run_cli(&cli) {
        Ok(report) => report_exit_code(&report),
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            e.exit_code()
        }
    }
}
