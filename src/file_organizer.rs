/// Collision-safe file moves.
///
/// This module moves a single file into a destination directory. The
/// directory is created on demand, and when the destination name is already
/// taken a numeric suffix is inserted before the extension (`name_1.ext`,
/// `name_2.ext`, ...) until a free name is found. In dry-run mode nothing is
/// created or moved; the resolved destination is only reported.
use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs::{self, FileTimes, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Highest numeric suffix tried before giving up on a file.
pub const DEFAULT_COLLISION_LIMIT: u32 = 10_000;

/// A single planned or executed move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveAction {
    /// The file as it was found in the source directory.
    pub source_path: PathBuf,
    /// The directory the file was sent to.
    pub destination_dir: PathBuf,
    /// The collision-free path inside `destination_dir`.
    pub resolved_path: PathBuf,
    /// False when the move was only planned (dry run).
    pub executed: bool,
}

impl MoveAction {
    /// Returns the new location if the move actually happened.
    pub fn executed_path(&self) -> Option<&Path> {
        self.executed.then_some(self.resolved_path.as_path())
    }

    /// Returns true if `resolved_path` differs from the plain file name.
    pub fn was_renamed(&self) -> bool {
        self.source_path.file_name() != self.resolved_path.file_name()
    }
}

/// Errors that can occur during file organization operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The source directory is missing or not a directory.
    #[error("Invalid source directory {}: {reason}", path.display())]
    InvalidSource { path: PathBuf, reason: String },

    /// The source directory could not be listed.
    #[error("Failed to read directory {}: {error}", path.display())]
    ScanFailed {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    /// Failed to create a destination directory.
    #[error("Failed to create directory {}: {error}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    /// Failed to move a file to its destination.
    #[error("Failed to move {} to {}: {error}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: io::Error,
    },

    /// A file's metadata (timestamps) could not be read.
    #[error("Failed to read metadata of {}: {error}", path.display())]
    MetadataUnavailable {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    /// The path has no file name component.
    #[error("{} has no file name", .0.display())]
    MissingFileName(PathBuf),

    /// Every suffix up to the limit is already taken.
    #[error("No free name for {} in {} after {limit} attempts", name.to_string_lossy(), dir.display())]
    CollisionLimitExceeded {
        dir: PathBuf,
        name: OsString,
        limit: u32,
    },
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Moves files into destination directories without overwriting anything.
///
/// In dry-run mode nothing lands on disk, so the mover remembers the paths it
/// has already planned and treats them as taken for later files.
#[derive(Debug, Clone)]
pub struct Mover {
    dry_run: bool,
    collision_limit: u32,
    planned: HashSet<PathBuf>,
}

impl Mover {
    /// Creates a mover. With `dry_run` set no filesystem change is made.
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            collision_limit: DEFAULT_COLLISION_LIMIT,
            planned: HashSet::new(),
        }
    }

    /// Overrides the highest suffix tried on name collisions.
    pub fn with_collision_limit(mut self, limit: u32) -> Self {
        self.collision_limit = limit;
        self
    }

    /// Moves `file_path` into `destination_dir`.
    ///
    /// The destination directory and its parents are created if needed. If
    /// the file name is taken, a `_N` suffix is inserted before the
    /// extension. In dry-run mode the returned action has `executed == false`
    /// and the filesystem is left untouched.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortdir::file_organizer::Mover;
    /// use std::path::Path;
    ///
    /// let action = Mover::new(false)
    ///     .relocate(Path::new("/tmp/in/photo.jpg"), Path::new("/tmp/out/images"))
    ///     .expect("move failed");
    /// println!("moved to {}", action.resolved_path.display());
    /// ```
    pub fn relocate(&mut self, file_path: &Path, destination_dir: &Path) -> OrganizeResult<MoveAction> {
        let file_name = file_path
            .file_name()
            .ok_or_else(|| OrganizeError::MissingFileName(file_path.to_path_buf()))?;

        if !self.dry_run {
            fs::create_dir_all(destination_dir).map_err(|error| {
                OrganizeError::DirectoryCreationFailed {
                    path: destination_dir.to_path_buf(),
                    error,
                }
            })?;
        }

        let resolved_path = first_free_name(
            destination_dir,
            file_name,
            self.collision_limit,
            &self.planned,
        )?;

        let action = MoveAction {
            source_path: file_path.to_path_buf(),
            destination_dir: destination_dir.to_path_buf(),
            resolved_path,
            executed: !self.dry_run,
        };

        if self.dry_run {
            self.planned.insert(action.resolved_path.clone());
            info!(
                from = %action.source_path.display(),
                to = %action.resolved_path.display(),
                "[DRY-RUN] planned move"
            );
            return Ok(action);
        }

        move_file(&action.source_path, &action.resolved_path)?;
        info!(
            file = %file_name.to_string_lossy(),
            to = %action.resolved_path.display(),
            "moved"
        );
        Ok(action)
    }
}

/// Moves `file_path` into `destination_dir`, returning the new path.
///
/// Returns `Ok(None)` in dry-run mode, where nothing is moved.
pub fn safe_move(
    file_path: &Path,
    destination_dir: &Path,
    dry_run: bool,
) -> OrganizeResult<Option<PathBuf>> {
    let action = Mover::new(dry_run).relocate(file_path, destination_dir)?;
    Ok(action.executed_path().map(Path::to_path_buf))
}

/// Finds the first free name for `file_name` inside `dir`.
///
/// A name is taken if any filesystem entry exists there, including a dangling
/// symlink. Suffixes are tried in order starting at 1; freed numbers are not
/// reused.
pub fn resolve_destination(dir: &Path, file_name: &OsStr, limit: u32) -> OrganizeResult<PathBuf> {
    first_free_name(dir, file_name, limit, &HashSet::new())
}

/// Like [`resolve_destination`], also skipping paths in `claimed`.
fn first_free_name(
    dir: &Path,
    file_name: &OsStr,
    limit: u32,
    claimed: &HashSet<PathBuf>,
) -> OrganizeResult<PathBuf> {
    let is_taken = |path: &Path| claimed.contains(path) || entry_exists(path);

    let candidate = dir.join(file_name);
    if !is_taken(candidate.as_path()) {
        return Ok(candidate);
    }

    let original = Path::new(file_name);
    let stem = original.file_stem().unwrap_or(file_name);
    let extension = original.extension();

    for index in 1..=limit {
        let candidate = dir.join(suffixed_name(stem, index, extension));
        if !is_taken(candidate.as_path()) {
            debug!(
                name = %file_name.to_string_lossy(),
                resolved = %candidate.display(),
                "name collision resolved"
            );
            return Ok(candidate);
        }
    }

    Err(OrganizeError::CollisionLimitExceeded {
        dir: dir.to_path_buf(),
        name: file_name.to_os_string(),
        limit,
    })
}

/// Builds `stem_N.ext` (or `stem_N` when there is no extension).
fn suffixed_name(stem: &OsStr, index: u32, extension: Option<&OsStr>) -> OsString {
    let mut name = stem.to_os_string();
    name.push(format!("_{}", index));
    if let Some(ext) = extension {
        name.push(".");
        name.push(ext);
    }
    name
}

fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Renames `from` to `to`, copying across filesystems when rename can't.
fn move_file(from: &Path, to: &Path) -> OrganizeResult<()> {
    let failure = |error: io::Error| OrganizeError::FileMoveFailure {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error,
    };

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            warn!(
                from = %from.display(),
                to = %to.display(),
                "rename crosses filesystems, falling back to copy+remove"
            );
            copy_then_remove(from, to).map_err(failure)
        }
        Err(e) => Err(failure(e)),
    }
}

fn copy_then_remove(from: &Path, to: &Path) -> io::Result<()> {
    let metadata = fs::metadata(from)?;
    fs::copy(from, to)?;

    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    OpenOptions::new().write(true).open(to)?.set_times(times)?;

    fs::remove_file(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");
        fs::create_dir(&src).expect("Failed to create source directory");
        (temp_dir, src, dst)
    }

    #[test]
    fn test_move_creates_destination_directory() {
        let (_guard, src, dst) = setup();
        let file_path = src.join("test.txt");
        fs::write(&file_path, "hello").expect("Failed to write test file");

        let nested = dst.join("a").join("b");
        let moved = safe_move(&file_path, &nested, false)
            .expect("Failed to move file")
            .expect("Move should have executed");

        assert_eq!(moved, nested.join("test.txt"));
        assert!(moved.exists());
        assert!(!file_path.exists());
    }

    #[test]
    fn test_move_into_existing_directory() {
        let (_guard, src, dst) = setup();
        fs::create_dir_all(&dst).expect("Failed to create destination");
        let file_path = src.join("test.png");
        fs::write(&file_path, "png").expect("Failed to write test file");

        let action = Mover::new(false)
            .relocate(&file_path, &dst)
            .expect("Failed to move file");

        assert!(action.executed);
        assert!(!action.was_renamed());
        assert_eq!(fs::read_to_string(dst.join("test.png")).unwrap(), "png");
    }

    #[test]
    fn test_collision_appends_numeric_suffix() {
        let (_guard, src, dst) = setup();
        let file_path = src.join("test.txt");

        fs::write(&file_path, "hello").unwrap();
        let first = safe_move(&file_path, &dst, false).unwrap().unwrap();

        fs::write(&file_path, "hello2").unwrap();
        let second = safe_move(&file_path, &dst, false).unwrap().unwrap();

        fs::write(&file_path, "hello3").unwrap();
        let third = safe_move(&file_path, &dst, false).unwrap().unwrap();

        assert_eq!(first, dst.join("test.txt"));
        assert_eq!(second, dst.join("test_1.txt"));
        assert_eq!(third, dst.join("test_2.txt"));
        assert_eq!(fs::read_to_string(&first).unwrap(), "hello");
        assert_eq!(fs::read_to_string(&second).unwrap(), "hello2");
        assert_eq!(fs::read_to_string(&third).unwrap(), "hello3");
    }

    #[test]
    fn test_collision_without_extension() {
        let (_guard, _src, dst) = setup();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("README"), "taken").unwrap();

        let resolved =
            resolve_destination(&dst, OsStr::new("README"), DEFAULT_COLLISION_LIMIT).unwrap();
        assert_eq!(resolved, dst.join("README_1"));
    }

    #[test]
    fn test_collision_keeps_only_last_extension() {
        let (_guard, _src, dst) = setup();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("backup.tar.gz"), "taken").unwrap();

        let resolved =
            resolve_destination(&dst, OsStr::new("backup.tar.gz"), DEFAULT_COLLISION_LIMIT)
                .unwrap();
        assert_eq!(resolved, dst.join("backup.tar_1.gz"));
    }

    #[test]
    fn test_collision_limit_is_reported() {
        let (_guard, _src, dst) = setup();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("a.txt"), "").unwrap();
        fs::write(dst.join("a_1.txt"), "").unwrap();
        fs::write(dst.join("a_2.txt"), "").unwrap();

        let result = resolve_destination(&dst, OsStr::new("a.txt"), 2);
        assert!(matches!(
            result,
            Err(OrganizeError::CollisionLimitExceeded { limit: 2, .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_counts_as_taken() {
        let (_guard, _src, dst) = setup();
        fs::create_dir_all(&dst).unwrap();
        std::os::unix::fs::symlink(dst.join("nowhere"), dst.join("link.txt")).unwrap();

        let resolved =
            resolve_destination(&dst, OsStr::new("link.txt"), DEFAULT_COLLISION_LIMIT).unwrap();
        assert_eq!(resolved, dst.join("link_1.txt"));
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let (_guard, src, dst) = setup();
        let file_path = src.join("report.pdf");
        fs::write(&file_path, "pdf").unwrap();

        let action = Mover::new(true)
            .relocate(&file_path, &dst.join("documents"))
            .expect("Dry run should succeed");

        assert!(!action.executed);
        assert_eq!(action.executed_path(), None);
        assert_eq!(action.resolved_path, dst.join("documents").join("report.pdf"));
        assert!(file_path.exists());
        assert!(!dst.exists());
    }

    #[test]
    fn test_dry_run_still_resolves_collisions() {
        let (_guard, src, dst) = setup();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("report.pdf"), "existing").unwrap();
        let file_path = src.join("report.pdf");
        fs::write(&file_path, "new").unwrap();

        assert_eq!(safe_move(&file_path, &dst, true).unwrap(), None);
        let action = Mover::new(true).relocate(&file_path, &dst).unwrap();
        assert_eq!(action.resolved_path, dst.join("report_1.pdf"));
        assert!(action.was_renamed());
        assert!(!dst.join("report_1.pdf").exists());
    }

    #[test]
    fn test_dry_run_treats_planned_paths_as_taken() {
        let (_guard, src, dst) = setup();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("photo.jpg"), "existing").unwrap();
        let first = src.join("photo.jpg");
        let second_dir = src.join("camera");
        fs::create_dir(&second_dir).unwrap();
        let second = second_dir.join("photo.jpg");
        fs::write(&first, "a").unwrap();
        fs::write(&second, "b").unwrap();

        let mut mover = Mover::new(true);
        let a = mover.relocate(&first, &dst).unwrap();
        let b = mover.relocate(&second, &dst).unwrap();

        assert_eq!(a.resolved_path, dst.join("photo_1.jpg"));
        assert_eq!(b.resolved_path, dst.join("photo_2.jpg"));
        assert!(!dst.join("photo_1.jpg").exists());
    }

    #[test]
    fn test_mover_collision_limit_fails_the_file() {
        let (_guard, src, dst) = setup();
        fs::create_dir_all(&dst).unwrap();
        fs::write(dst.join("a.txt"), "").unwrap();
        fs::write(dst.join("a_1.txt"), "").unwrap();
        let file_path = src.join("a.txt");
        fs::write(&file_path, "new").unwrap();

        let result = Mover::new(false)
            .with_collision_limit(1)
            .relocate(&file_path, &dst);

        assert!(matches!(
            result,
            Err(OrganizeError::CollisionLimitExceeded { limit: 1, .. })
        ));
        assert!(file_path.exists());
    }

    #[test]
    fn test_missing_source_file_is_an_error() {
        let (_guard, src, dst) = setup();
        let result = safe_move(&src.join("ghost.txt"), &dst, false);
        assert!(matches!(result, Err(OrganizeError::FileMoveFailure { .. })));
    }

    #[test]
    fn test_copy_then_remove_preserves_content_and_mtime() {
        let (_guard, src, dst) = setup();
        fs::create_dir_all(&dst).unwrap();
        let from = src.join("clip.mp4");
        fs::write(&from, "frames").unwrap();
        let original_mtime = fs::metadata(&from).unwrap().modified().unwrap();

        let to = dst.join("clip.mp4");
        copy_then_remove(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(fs::read_to_string(&to).unwrap(), "frames");
        assert_eq!(fs::metadata(&to).unwrap().modified().unwrap(), original_mtime);
    }
}
