//! Terminal output for the command-line front-end.
//!
//! Library code reports through `tracing`; only the CLI prints, and it does
//! so through [`OutputFormatter`] so that every line shares one style:
//! green `✓` for moves, yellow `[DRY RUN]` for planned moves, red `✗` on
//! stderr for failures.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::Path;

/// Styled printing for runs and their summaries.
pub struct OutputFormatter;

impl OutputFormatter {
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Errors go to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints the `Source:` / `Target:` / `Mode:` lines that open a run.
    pub fn run_header(source: &Path, target: &Path, mode: &str, dry_run: bool) {
        println!("{} {}", "Source:".bold(), source.display());
        println!("{} {}", "Target:".bold(), target.display());
        let suffix = if dry_run { " (dry-run)" } else { "" };
        println!("{} {}{}", "Mode:".bold(), mode, suffix);
    }

    /// A file that was moved.
    pub fn moved(file_name: &str, destination: &Path) {
        Self::success(&format!("{} -> {}", file_name, destination.display()));
    }

    /// A move that a dry run would perform.
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use sortdir::output::OutputFormatter;
    /// OutputFormatter::planned(
    ///     Path::new("/in/photo.jpg"),
    ///     Path::new("/in/organized/images/photo.jpg"),
    /// );
    /// ```
    pub fn planned(source: &Path, destination: &Path) {
        let line = format!("[DRY RUN] {} -> {}", source.display(), destination.display());
        println!("{}", line.yellow());
    }

    /// A file that could not be organized.
    pub fn failed(file_name: &str, reason: &dyn std::fmt::Display) {
        Self::error(&format!("{}: {}", file_name, reason));
    }

    /// Progress bar over the files of one run. Draws nothing off a terminal.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        ProgressBar::new(total).with_style(style)
    }

    /// Prints files per destination folder, sorted by folder, then the total.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sortdir::output::OutputFormatter;
    /// use std::collections::HashMap;
    ///
    /// let counts = HashMap::from([
    ///     ("documents".to_string(), 15),
    ///     ("2023/04".to_string(), 8),
    /// ]);
    /// OutputFormatter::summary_table(&counts, 23);
    /// ```
    pub fn summary_table(folder_counts: &HashMap<String, usize>, total_files: usize) {
        let rows = summary_rows(folder_counts);
        let width = rows
            .iter()
            .map(|(folder, _)| folder.chars().count())
            .chain(std::iter::once("Folder".len()))
            .max()
            .unwrap_or_default();
        let rule = "-".repeat(width + 12);

        println!("\n{}", "SUMMARY".bold());
        println!("{:<width$} | {}", "Folder".bold(), "Files".bold());
        println!("{}", rule);
        for (folder, count) in &rows {
            println!("{:<width$} | {} {}", folder, count.to_string().green(), plural(*count));
        }
        println!("{}", rule);
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            plural(total_files)
        );
    }
}

fn summary_rows(folder_counts: &HashMap<String, usize>) -> Vec<(&str, usize)> {
    let mut rows: Vec<_> = folder_counts
        .iter()
        .map(|(folder, count)| (folder.as_str(), *count))
        .collect();
    rows.sort_unstable();
    rows
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}
