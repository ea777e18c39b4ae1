//! Planning and executing the sort of a source folder into type folders.
//!
//! Work happens in two phases. [`FileOrganizer::build_plans`] enumerates the
//! source, classifies every file and returns one [`OperationPlan`] per file
//! that is not already where it belongs, without touching the filesystem.
//! [`execute_plans`] then applies the plans in order, picking a free name for
//! each destination right before the file is moved or copied.

use crate::config::{CompiledFilters, ConfigError};
use crate::type_label::TypeLabel;
use filetime::FileTime;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Upper bound (exclusive) of the `_N` suffix tried when a destination is taken.
pub const MAX_CONFLICT_SUFFIX: u32 = 10_000;

/// Errors that can occur while planning or executing an organization run.
#[derive(Debug, thiserror::Error)]
pub enum OrganizeError {
    #[error("source does not exist: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("source is not a directory: {}", .path.display())]
    SourceNotADirectory { path: PathBuf },

    #[error(
        "--recursive requires --dest outside the source directory (to avoid re-sorting moved files): {} is inside {}",
        .destination.display(),
        .source_dir.display()
    )]
    DestinationInsideSource {
        destination: PathBuf,
        source_dir: PathBuf,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to read directory {}: {error}", .path.display())]
    ReadDirFailed {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("Failed to create directory {}: {error}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("Failed to move {} to {}: {error}", .from.display(), .to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("Failed to copy {} to {}: {error}", .from.display(), .to.display())]
    FileCopyFailure {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("Unable to find a free filename for: {}", .path.display())]
    ConflictExhausted { path: PathBuf },
}

impl OrganizeError {
    /// True for errors raised before anything on disk was changed because the
    /// input itself is unusable.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound { .. }
                | Self::SourceNotADirectory { .. }
                | Self::DestinationInsideSource { .. }
                | Self::Config(_)
        )
    }

    /// Process exit code for this error: 2 for validation, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.is_validation() { 2 } else { 1 }
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// What to do with a file once its destination is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Move,
    Copy,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Move => "MOVE",
            Action::Copy => "COPY",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single planned move or copy.
///
/// `destination` is the literal target; the name actually used may get a
/// `_N` suffix at execution time if it is taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationPlan {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub action: Action,
    pub label: TypeLabel,
}

/// Outcome of [`execute_plans`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExecutionReport {
    /// Plans processed, or that would have been in a dry run.
    pub processed: usize,
    /// Processed plans per type label.
    pub by_label: HashMap<String, usize>,
}

impl ExecutionReport {
    fn record(&mut self, label: &TypeLabel) {
        self.processed += 1;
        *self.by_label.entry(label.to_string()).or_insert(0) += 1;
    }
}

/// Sorts the files of a source folder into `<dest_root>/<type label>/`.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use typesort::file_organizer::{Action, FileOrganizer, execute_plans};
///
/// let organizer = FileOrganizer::new(Path::new("/home/me/Downloads"), Path::new("/home/me/Sorted"))?
///     .recursive(true)
///     .action(Action::Copy);
/// let plans = organizer.build_plans()?;
/// let report = execute_plans(plans, false, |plan, dest| {
///     println!("{}: {} -> {}", plan.action, plan.source.display(), dest.display());
/// })?;
/// println!("{} file(s)", report.processed);
/// # Ok::<(), typesort::file_organizer::OrganizeError>(())
/// ```
#[derive(Debug)]
pub struct FileOrganizer {
    source_dir: PathBuf,
    dest_root: PathBuf,
    recursive: bool,
    action: Action,
    filters: CompiledFilters,
}

impl FileOrganizer {
    /// Validates the source directory and resolves both roots.
    ///
    /// The destination root does not need to exist yet.
    pub fn new(source_dir: &Path, dest_root: &Path) -> OrganizeResult<Self> {
        match fs::metadata(source_dir) {
            Ok(metadata) if metadata.is_dir() => {}
            Ok(_) => {
                return Err(OrganizeError::SourceNotADirectory {
                    path: source_dir.to_path_buf(),
                });
            }
            Err(_) => {
                return Err(OrganizeError::SourceNotFound {
                    path: source_dir.to_path_buf(),
                });
            }
        }

        Ok(Self {
            source_dir: resolve_path(source_dir),
            dest_root: resolve_path(dest_root),
            recursive: false,
            action: Action::Move,
            filters: CompiledFilters::default(),
        })
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    pub fn filters(mut self, filters: CompiledFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Builds one plan per file that is not already in its type folder.
    ///
    /// Fails with [`OrganizeError::DestinationInsideSource`] in recursive mode
    /// when the destination root is the source or lies below it.
    pub fn build_plans(&self) -> OrganizeResult<Vec<OperationPlan>> {
        if self.recursive && self.dest_root.starts_with(&self.source_dir) {
            return Err(OrganizeError::DestinationInsideSource {
                destination: self.dest_root.clone(),
                source_dir: self.source_dir.clone(),
            });
        }

        let mut plans = Vec::new();
        for file_path in self.collect_source_files()? {
            let Some(file_name) = file_path.file_name() else {
                continue;
            };
            let label = TypeLabel::for_path(&file_path);
            let dest_dir = self.dest_root.join(&label);
            let destination = dest_dir.join(file_name);

            // Only the immediate parent is compared.
            let current_dir = resolve_path(&file_path).parent().map(Path::to_path_buf);
            if current_dir.as_deref() == Some(resolve_path(&dest_dir).as_path()) {
                tracing::debug!(file = %file_path.display(), label = %label, "already organized, skipping");
                continue;
            }

            plans.push(OperationPlan {
                source: file_path,
                destination,
                action: self.action,
                label,
            });
        }

        tracing::debug!(count = plans.len(), "planned operations");
        Ok(plans)
    }

    /// Lists the files to organize, sorted by path.
    ///
    /// Regular files and symbolic links are returned; anything that is or
    /// points to a directory is not. The recursive walk never follows
    /// directory symlinks.
    pub fn collect_source_files(&self) -> OrganizeResult<Vec<PathBuf>> {
        let mut files = if self.recursive {
            self.walk_source_tree()
        } else {
            self.list_source_dir()?
        };

        files.retain(|path| {
            if self.filters.is_config_file(path) {
                tracing::debug!(file = %path.display(), "skipping loaded configuration file");
                return false;
            }
            let relative = path.strip_prefix(&self.source_dir).unwrap_or(path);
            let included = self.filters.should_include(relative);
            if !included {
                tracing::debug!(file = %path.display(), "excluded by filters");
            }
            included
        });
        files.sort();
        Ok(files)
    }

    fn list_source_dir(&self) -> OrganizeResult<Vec<PathBuf>> {
        let entries =
            fs::read_dir(&self.source_dir).map_err(|error| OrganizeError::ReadDirFailed {
                path: self.source_dir.clone(),
                error,
            })?;

        let mut files = Vec::new();
        for entry in entries {
            let Some(entry) = skip_unreadable(entry) else {
                continue;
            };
            let Some(file_type) = skip_unreadable(entry.file_type()) else {
                continue;
            };
            let path = entry.path();
            if (file_type.is_file() || file_type.is_symlink()) && !path.is_dir() {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn walk_source_tree(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.source_dir).min_depth(1).follow_links(false) {
            let Some(entry) = skip_unreadable(entry) else {
                continue;
            };

            let file_type = entry.file_type();
            if file_type.is_file() || (file_type.is_symlink() && !entry.path().is_dir()) {
                files.push(entry.into_path());
            }
        }
        files
    }
}

/// Logs and drops a per-entry enumeration error.
fn skip_unreadable<T, E: fmt::Display>(result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(%error, "skipping unreadable entry");
            None
        }
    }
}

/// Applies plans in order and reports each one through `on_operation`.
///
/// `on_operation` receives the plan and the final, conflict-free destination
/// before anything is changed. With `dry_run` set, directories are not
/// created and files are not touched, but every other step runs the same way.
///
/// The first failure aborts the batch. Operations already applied stay.
pub fn execute_plans<F>(
    plans: Vec<OperationPlan>,
    dry_run: bool,
    mut on_operation: F,
) -> OrganizeResult<ExecutionReport>
where
    F: FnMut(&OperationPlan, &Path),
{
    let mut report = ExecutionReport::default();

    for plan in plans {
        if let Some(dest_dir) = plan.destination.parent() {
            ensure_dir(dest_dir, dry_run)?;
        }
        let final_destination = unique_destination_path(&plan.destination)?;
        on_operation(&plan, &final_destination);

        if !dry_run {
            apply(&plan, &final_destination)?;
            tracing::debug!(
                action = %plan.action,
                from = %plan.source.display(),
                to = %final_destination.display(),
                "applied"
            );
        }
        report.record(&plan.label);
    }

    Ok(report)
}

/// Returns `destination` if it is free, otherwise the first free
/// `stem_N.ext` sibling for N in `1..MAX_CONFLICT_SUFFIX`.
///
/// # Examples
///
/// ```
/// use std::fs;
/// use typesort::file_organizer::unique_destination_path;
///
/// let dir = tempfile::tempdir()?;
/// let taken = dir.path().join("cat.jpg");
/// fs::write(&taken, b"meow")?;
///
/// let free = unique_destination_path(&taken)?;
/// assert_eq!(free, dir.path().join("cat_1.jpg"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn unique_destination_path(destination: &Path) -> OrganizeResult<PathBuf> {
    unique_destination_path_within(destination, MAX_CONFLICT_SUFFIX)
}

fn unique_destination_path_within(destination: &Path, limit: u32) -> OrganizeResult<PathBuf> {
    if !is_taken(destination) {
        return Ok(destination.to_path_buf());
    }

    let (stem, suffix) = split_file_name(destination);
    let parent = destination.parent().unwrap_or_else(|| Path::new(""));

    for i in 1..limit {
        let mut candidate_name = stem.to_os_string();
        candidate_name.push(format!("_{i}"));
        if let Some(ext) = suffix {
            candidate_name.push(".");
            candidate_name.push(ext);
        }
        let candidate = parent.join(candidate_name);
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }

    Err(OrganizeError::ConflictExhausted {
        path: destination.to_path_buf(),
    })
}

/// Stem and suffix of the final component, split at the last dot without
/// re-encoding the name. `.bashrc` and `file.` have no suffix.
fn split_file_name(path: &Path) -> (&OsStr, Option<&OsStr>) {
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) if !ext.is_empty() => (stem, Some(ext)),
        _ => (path.file_name().unwrap_or_default(), None),
    }
}

/// A dangling symlink still occupies its name.
fn is_taken(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn ensure_dir(path: &Path, dry_run: bool) -> OrganizeResult<()> {
    if dry_run {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|error| OrganizeError::DirectoryCreationFailed {
        path: path.to_path_buf(),
        error,
    })
}

fn apply(plan: &OperationPlan, destination: &Path) -> OrganizeResult<()> {
    match plan.action {
        Action::Move => {
            move_file(&plan.source, destination).map_err(|error| OrganizeError::FileMoveFailure {
                from: plan.source.clone(),
                to: destination.to_path_buf(),
                error,
            })
        }
        Action::Copy => copy_with_metadata(&plan.source, destination).map_err(|error| {
            OrganizeError::FileCopyFailure {
                from: plan.source.clone(),
                to: destination.to_path_buf(),
                error,
            }
        }),
    }
}

/// Renames, falling back to copy and delete across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(error) if error.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(from = %from.display(), "rename crosses devices, copying instead");
            if fs::symlink_metadata(from)?.file_type().is_symlink() {
                relink(from, to)?;
            } else {
                copy_with_metadata(from, to)?;
            }
            fs::remove_file(from)
        }
        result => result,
    }
}

#[cfg(unix)]
fn relink(from: &Path, to: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(from)?, to)
}

#[cfg(not(unix))]
fn relink(from: &Path, to: &Path) -> io::Result<()> {
    copy_with_metadata(from, to)
}

/// Copies contents and permissions, then access and modification times.
fn copy_with_metadata(from: &Path, to: &Path) -> io::Result<()> {
    fs::copy(from, to)?;

    let metadata = fs::metadata(from)?;
    let accessed = FileTime::from_last_access_time(&metadata);
    let modified = FileTime::from_last_modification_time(&metadata);
    if let Err(error) = filetime::set_file_times(to, accessed, modified) {
        tracing::warn!(file = %to.display(), %error, "could not preserve timestamps");
    }
    Ok(())
}

/// Absolute, symlink-free form of `path`, which need not exist.
///
/// Missing trailing components are applied to the canonical form of the
/// longest existing ancestor, with `..` stepping up from it. A result that
/// stepped up is resolved again since it may now name existing links.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }

    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut base = absolute.clone();
    let mut missing: Vec<OsString> = Vec::new();
    while let Some(last) = base.components().next_back().map(|c| c.as_os_str().to_owned()) {
        if !base.pop() {
            break;
        }
        missing.push(last);
        if let Ok(mut resolved) = fs::canonicalize(&base) {
            let mut stepped_up = false;
            for part in missing.iter().rev() {
                if part == ".." {
                    resolved.pop();
                    stepped_up = true;
                } else if part != "." {
                    resolved.push(part);
                }
            }
            return if stepped_up { resolve_path(&resolved) } else { resolved };
        }
    }
    absolute
}
