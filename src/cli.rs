//! Command-line interface module for sortdir.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing (`clap`)
//! - Path resolution and run construction
//! - Progress display and per-file results
//! - Exit status selection

use crate::config::{ConfigError, DEFAULT_DATE_FORMAT, DateAttribute, DateFormat};
use crate::file_category::RuleSet;
use crate::file_organizer::OrganizeError;
use crate::output::OutputFormatter;
use crate::run::{FileOutcome, OrganizeMode, OrganizerRun, RunReport};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

/// Name of the target folder created inside the source when none is given.
pub const DEFAULT_TARGET_DIR: &str = "organized";

/// sortdir - move files into folders by type or by date
#[derive(Parser, Debug, Clone)]
#[command(name = "sortdir")]
#[command(version)]
#[command(about = "Move files into subfolders by type or by date", long_about = None)]
pub struct Cli {
    /// Source directory (default: current directory)
    #[arg(default_value = ".")]
    pub source: PathBuf,

    /// Target directory (default: SOURCE/organized)
    #[arg(short, long)]
    pub target: Option<PathBuf>,

    /// Organize by extension category or by file date
    #[arg(short, long, value_enum, default_value_t = ModeArg::Type)]
    pub mode: ModeArg,

    /// Timestamp used in date mode
    #[arg(long, value_enum, default_value_t = DateAttribute::Modified)]
    pub date_attr: DateAttribute,

    /// strftime pattern for date folders (e.g. %Y/%m)
    #[arg(long, default_value = DEFAULT_DATE_FORMAT)]
    pub date_fmt: String,

    /// JSON file with category -> extensions rules (type mode)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show what would be done without moving anything
    #[arg(long)]
    pub dry_run: bool,

    /// Also organize hidden files
    #[arg(long = "no-ignore-hidden", action = clap::ArgAction::SetFalse)]
    pub ignore_hidden: bool,

    /// Stop at the first file that cannot be moved
    #[arg(long)]
    pub fail_fast: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// `--mode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Type,
    Date,
}

impl Cli {
    /// The tracing filter implied by `--verbose` / `--quiet`.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Errors that end a CLI invocation before or during a run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Organize(#[from] OrganizeError),

    #[error("Could not resolve {}: {error}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl CliError {
    /// Exit status for this error.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(2)
    }
}

/// Exit status for a completed run.
pub fn report_exit_code(report: &RunReport) -> ExitCode {
    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

/// Builds the run described by the parsed arguments.
///
/// # Errors
///
/// Fails if a path cannot be made absolute or the date format is invalid.
/// A broken rules file is not an error: the defaults are used instead.
pub fn build_run(cli: &Cli) -> Result<OrganizerRun, CliError> {
    let source = absolute(&expand_home(&cli.source))?;
    let target = match &cli.target {
        Some(target) => absolute(&expand_home(target))?,
        None => source.join(DEFAULT_TARGET_DIR),
    };

    let mode = match cli.mode {
        ModeArg::Type => {
            let config = cli.config.as_deref().map(expand_home);
            OrganizeMode::ByType(RuleSet::load(config.as_deref()))
        }
        ModeArg::Date => OrganizeMode::ByDate {
            attribute: cli.date_attr,
            format: DateFormat::parse(&cli.date_fmt)?,
        },
    };

    Ok(OrganizerRun::new(source, target, mode)
        .dry_run(cli.dry_run)
        .ignore_hidden(cli.ignore_hidden)
        .fail_fast(cli.fail_fast))
}

/// Runs the CLI application with the parsed arguments.
///
/// Prints the run header, one line per file and a summary. Returns the
/// report so the caller can pick the exit status.
///
/// # Examples
///
/// ```no_run
/// use clap::Parser;
/// use sortdir::cli::{Cli, run_cli};
///
/// let cli = Cli::parse_from(["sortdir", "/path/to/downloads", "--dry-run"]);
/// match run_cli(&cli) {
///     Ok(report) => println!("{} files planned", report.planned()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(cli: &Cli) -> Result<RunReport, CliError> {
    let run = build_run(cli)?;
    let scan = run.scan()?;

    if !cli.quiet {
        print_header(&run);
    }

    if scan.files.is_empty() {
        let report = RunReport {
            skipped_hidden: scan.skipped_hidden,
            skipped_dirs: scan.skipped_dirs,
            ..Default::default()
        };
        if !cli.quiet {
            OutputFormatter::info("No files found to organize.");
            print_summary(&run, &report);
        }
        return Ok(report);
    }

    let pb = OutputFormatter::create_progress_bar(scan.files.len() as u64);
    if cli.quiet || run.is_dry_run() {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let report = run.apply(scan, |outcome| {
        pb.suspend(|| print_outcome(&outcome, cli.quiet));
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    if !cli.quiet {
        print_summary(&run, &report);
    }

    Ok(report)
}

fn print_header(run: &OrganizerRun) {
    OutputFormatter::run_header(
        run.source_dir(),
        run.target_dir(),
        run.mode().name(),
        run.is_dry_run(),
    );
}

fn print_outcome(outcome: &FileOutcome<'_>, quiet: bool) {
    match outcome {
        FileOutcome::Done(_) if quiet => {}
        FileOutcome::Done(action) if action.executed => {
            OutputFormatter::moved(&file_label(&action.source_path), &action.resolved_path)
        }
        FileOutcome::Done(action) => {
            OutputFormatter::planned(&action.source_path, &action.resolved_path)
        }
        FileOutcome::Failed(failure) => {
            OutputFormatter::failed(&file_label(&failure.path), &failure.error)
        }
    }
}

fn print_summary(run: &OrganizerRun, report: &RunReport) {
    let counts = report.counts_by_destination(run.target_dir());
    if !counts.is_empty() {
        OutputFormatter::summary_table(&counts, report.actions.len());
    }

    if report.skipped_hidden > 0 {
        OutputFormatter::plain(&format!("Hidden files skipped: {}", report.skipped_hidden));
    }

    if !report.is_clean() {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized. Please review errors above.",
            report.failures.len()
        ));
    }

    if run.is_dry_run() {
        OutputFormatter::success("Dry run complete. No files were modified.");
    }
    OutputFormatter::plain("Done.");
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Replaces a leading `~` with `$HOME`.
fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

fn absolute(path: &Path) -> Result<PathBuf, CliError> {
    std::path::absolute(path).map_err(|error| CliError::Resolve {
        path: path.to_path_buf(),
        error,
    })
}
