//! A single organizer pass over one directory.
//!
//! A run lists the immediate children of the source directory, skips
//! subdirectories (and hidden entries unless told otherwise), picks a
//! destination folder for each remaining file and hands it to the
//! [`Mover`]. Files are handled one at a time in directory-listing order.
//!
//! A file that fails to move is recorded in the [`RunReport`] and the batch
//! continues, unless the run was configured with `fail_fast`.

use crate::config::{DateAttribute, DateFormat};
use crate::file_category::RuleSet;
use crate::file_organizer::{MoveAction, Mover, OrganizeError, OrganizeResult};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A regular file found while scanning the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    path: PathBuf,
}

impl FileEntry {
    /// Wraps a path known to have a file name.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    pub fn file_name(&self) -> &OsStr {
        self.path.file_name().unwrap_or_default()
    }

    /// The dotted extension (`".jpg"`), or an empty string.
    pub fn extension(&self) -> String {
        self.path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }

    /// Names starting with `.` are hidden.
    pub fn is_hidden(&self) -> bool {
        is_hidden_name(self.file_name())
    }
}

fn is_hidden_name(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// How a run chooses each file's destination folder.
#[derive(Debug, Clone)]
pub enum OrganizeMode {
    /// `target/<category>` by extension, `target/others` when unmatched.
    ByType(RuleSet),
    /// `target/<formatted date>` from a file timestamp.
    ByDate {
        attribute: DateAttribute,
        format: DateFormat,
    },
}

impl OrganizeMode {
    pub fn name(&self) -> &'static str {
        match self {
            OrganizeMode::ByType(_) => "type",
            OrganizeMode::ByDate { .. } => "date",
        }
    }
}

/// The files a run will process, plus what it skipped.
#[derive(Debug, Clone, Default)]
pub struct Scan {
    pub files: Vec<FileEntry>,
    pub skipped_hidden: usize,
    pub skipped_dirs: usize,
}

/// A file that could not be organized.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: OrganizeError,
}

/// Per-file progress passed to observers.
#[derive(Debug, Clone, Copy)]
pub enum FileOutcome<'a> {
    /// Moved, or planned in a dry run (see `MoveAction::executed`).
    Done(&'a MoveAction),
    /// Skipped because of an error.
    Failed(&'a FileFailure),
}

/// Summary of a completed run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub actions: Vec<MoveAction>,
    pub failures: Vec<FileFailure>,
    pub skipped_hidden: usize,
    pub skipped_dirs: usize,
}

impl RunReport {
    /// Number of files actually moved.
    pub fn moved(&self) -> usize {
        self.actions.iter().filter(|a| a.executed).count()
    }

    /// Number of moves only planned (dry run).
    pub fn planned(&self) -> usize {
        self.actions.iter().filter(|a| !a.executed).count()
    }

    /// Returns true if no file failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Files handled, successfully or not.
    pub fn total_files(&self) -> usize {
        self.actions.len() + self.failures.len()
    }

    /// Counts files per destination folder, relative to `target_dir`.
    pub fn counts_by_destination(&self, target_dir: &Path) -> HashMap<String, usize> {
        let mut counts = HashMap::new();
        for action in &self.actions {
            let relative = action
                .destination_dir
                .strip_prefix(target_dir)
                .unwrap_or(&action.destination_dir);
            let key = if relative.as_os_str().is_empty() {
                ".".to_string()
            } else {
                relative.display().to_string()
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }
}

/// One organizer invocation: where from, where to, and how.
#[derive(Debug, Clone)]
pub struct OrganizerRun {
    source_dir: PathBuf,
    target_dir: PathBuf,
    mode: OrganizeMode,
    dry_run: bool,
    ignore_hidden: bool,
    fail_fast: bool,
}

impl OrganizerRun {
    /// Creates a run that skips hidden files and moves for real.
    pub fn new(
        source_dir: impl Into<PathBuf>,
        target_dir: impl Into<PathBuf>,
        mode: OrganizeMode,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: target_dir.into(),
            mode,
            dry_run: false,
            ignore_hidden: true,
            fail_fast: false,
        }
    }

    /// Only report planned moves.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Skip entries whose name starts with `.` (default).
    pub fn ignore_hidden(mut self, ignore_hidden: bool) -> Self {
        self.ignore_hidden = ignore_hidden;
        self
    }

    /// Abort on the first per-file error instead of skipping the file.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn mode(&self) -> &OrganizeMode {
        &self.mode
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Validates the source directory and lists the files to process.
    ///
    /// # Errors
    ///
    /// Returns `OrganizeError::InvalidSource` if the source is missing or not
    /// a directory, and `OrganizeError::ScanFailed` if it cannot be listed.
    pub fn scan(&self) -> OrganizeResult<Scan> {
        scan_directory(&self.source_dir, self.ignore_hidden)
    }

    /// Runs the whole pass.
    pub fn execute(&self) -> OrganizeResult<RunReport> {
        self.execute_with(|_| {})
    }

    /// Runs the whole pass, reporting each file to `observer`.
    pub fn execute_with<F>(&self, observer: F) -> OrganizeResult<RunReport>
    where
        F: FnMut(FileOutcome<'_>),
    {
        let scan = self.scan()?;
        self.apply(scan, observer)
    }

    /// Processes an earlier [`scan`](Self::scan) of this run's source.
    pub fn apply<F>(&self, scan: Scan, observer: F) -> OrganizeResult<RunReport>
    where
        F: FnMut(FileOutcome<'_>),
    {
        let mut mover = Mover::new(self.dry_run);
        match &self.mode {
            OrganizeMode::ByType(rules) => process(scan, &mut mover, self.fail_fast, observer, |entry| {
                Ok(type_destination(&self.target_dir, rules, entry))
            }),
            OrganizeMode::ByDate { attribute, format } => {
                process(scan, &mut mover, self.fail_fast, observer, |entry| {
                    date_destination(&self.target_dir, *attribute, format, entry)
                })
            }
        }
    }
}

/// Moves every file in `source_dir` into `target_dir/<category>`.
pub fn organize_by_type(
    source_dir: &Path,
    target_dir: &Path,
    rules: &RuleSet,
    dry_run: bool,
    ignore_hidden: bool,
) -> OrganizeResult<RunReport> {
    let scan = scan_directory(source_dir, ignore_hidden)?;
    process(scan, &mut Mover::new(dry_run), false, |_| {}, |entry| {
        Ok(type_destination(target_dir, rules, entry))
    })
}

/// Moves every file in `source_dir` into `target_dir/<formatted date>`.
pub fn organize_by_date(
    source_dir: &Path,
    target_dir: &Path,
    attribute: DateAttribute,
    format: &DateFormat,
    dry_run: bool,
    ignore_hidden: bool,
) -> OrganizeResult<RunReport> {
    let scan = scan_directory(source_dir, ignore_hidden)?;
    process(scan, &mut Mover::new(dry_run), false, |_| {}, |entry| {
        date_destination(target_dir, attribute, format, entry)
    })
}

fn scan_directory(source_dir: &Path, ignore_hidden: bool) -> OrganizeResult<Scan> {
    if !source_dir.exists() {
        return Err(OrganizeError::InvalidSource {
            path: source_dir.to_path_buf(),
            reason: "does not exist".to_string(),
        });
    }
    if !source_dir.is_dir() {
        return Err(OrganizeError::InvalidSource {
            path: source_dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let entries = fs::read_dir(source_dir).map_err(|error| OrganizeError::ScanFailed {
        path: source_dir.to_path_buf(),
        error,
    })?;

    let mut scan = Scan::default();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(dir = %source_dir.display(), error = %e, "unreadable directory entry");
                continue;
            }
        };

        let path = entry.path();
        if path.is_dir() {
            debug!(path = %path.display(), "skipping directory");
            scan.skipped_dirs += 1;
            continue;
        }
        if ignore_hidden && is_hidden_name(&entry.file_name()) {
            debug!(path = %path.display(), "skipping hidden file");
            scan.skipped_hidden += 1;
            continue;
        }
        scan.files.push(FileEntry::new(path));
    }

    Ok(scan)
}

fn process<O, D>(
    scan: Scan,
    mover: &mut Mover,
    fail_fast: bool,
    mut observer: O,
    destination: D,
) -> OrganizeResult<RunReport>
where
    O: FnMut(FileOutcome<'_>),
    D: Fn(&FileEntry) -> OrganizeResult<PathBuf>,
{
    let mut report = RunReport {
        skipped_hidden: scan.skipped_hidden,
        skipped_dirs: scan.skipped_dirs,
        ..Default::default()
    };

    for entry in scan.files {
        let outcome = destination(&entry).and_then(|dir| mover.relocate(entry.path(), &dir));
        match outcome {
            Ok(action) => {
                observer(FileOutcome::Done(&action));
                report.actions.push(action);
            }
            Err(error) => {
                warn!(file = %entry.path().display(), error = %error, "could not organize file");
                if fail_fast {
                    return Err(error);
                }
                let failure = FileFailure {
                    path: entry.into_path(),
                    error,
                };
                observer(FileOutcome::Failed(&failure));
                report.failures.push(failure);
            }
        }
    }

    Ok(report)
}

fn type_destination(target_dir: &Path, rules: &RuleSet, entry: &FileEntry) -> PathBuf {
    let extension = entry.extension();
    target_dir.join(rules.classify(&extension).dir_name())
}

fn date_destination(
    target_dir: &Path,
    attribute: DateAttribute,
    format: &DateFormat,
    entry: &FileEntry,
) -> OrganizeResult<PathBuf> {
    let timestamp = file_timestamp(entry.path(), attribute).map_err(|error| {
        OrganizeError::MetadataUnavailable {
            path: entry.path().to_path_buf(),
            error,
        }
    })?;
    Ok(target_dir.join(format.subpath(&timestamp)))
}

/// Reads the chosen timestamp of `path` in local time.
pub fn file_timestamp(path: &Path, attribute: DateAttribute) -> io::Result<DateTime<Local>> {
    let metadata = fs::metadata(path)?;
    match attribute {
        DateAttribute::Modified => Ok(DateTime::<Local>::from(metadata.modified()?)),
        DateAttribute::Changed => changed_time(&metadata),
    }
}

#[cfg(unix)]
fn changed_time(metadata: &fs::Metadata) -> io::Result<DateTime<Local>> {
    use std::os::unix::fs::MetadataExt;

    DateTime::from_timestamp(metadata.ctime(), metadata.ctime_nsec() as u32)
        .map(|utc| utc.with_timezone(&Local))
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "ctime out of range"))
}

#[cfg(not(unix))]
fn changed_time(metadata: &fs::Metadata) -> io::Result<DateTime<Local>> {
    Ok(DateTime::<Local>::from(metadata.created()?))
}
