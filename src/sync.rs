use crate::config::CompareConfig;
use crate::diff::{self, DiffResult};
use crate::error::Error;
use crate::prune;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Move,
    Copy,
    Remove,
    Update,
    RemoveFolder,
    PruneScan,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Operation::Move => "move",
            Operation::Copy => "copy",
            Operation::Remove => "remove",
            Operation::Update => "update",
            Operation::RemoveFolder => "remove folder",
            Operation::PruneScan => "empty folder scan",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub struct Failure {
    pub operation: Operation,
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of one apply pass. Counts are operations performed, or planned
/// in dry-run mode.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub dry: bool,
    pub moved: usize,
    pub added: usize,
    pub removed: usize,
    pub changed: usize,
    pub folders_removed: usize,
    pub failures: Vec<Failure>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, operation: Operation, path: &Path, result: Result<(), Error>) -> bool {
        match result {
            Ok(()) => true,
            Err(err) => {
                error!("Failed to {} '{}': {}", operation, path.display(), err);
                self.failures.push(Failure {
                    operation,
                    path: path.to_path_buf(),
                    error: err,
                });
                false
            }
        }
    }

    fn log_summary(&self) {
        let prefix = if self.dry { "[dry run] " } else { "" };
        info!(
            "{}{} moved, {} added, {} removed, {} changed, {} empty folders deleted",
            prefix, self.moved, self.added, self.removed, self.changed, self.folders_removed,
        );
        if !self.is_clean() {
            warn!("{} operations failed:", self.failures.len());
            for failure in &self.failures {
                warn!("  {} '{}': {}", failure.operation, failure.path.display(), failure.error);
            }
        }
    }
}

/// Apply `diff` to its destination tree.
///
/// Operations run in a fixed order (moves, additions, removals, changes)
/// followed by removal of folders left empty. Every operation is attempted
/// even when an earlier one failed; failures are collected in the report.
/// Nothing is touched when `config.dry` is set.
pub fn apply(diff: &DiffResult, config: &CompareConfig) -> ApplyReport {
    let mut report = ApplyReport {
        dry: config.dry,
        ..ApplyReport::default()
    };

    if !diff.is_changed() {
        return report;
    }

    for pair in &diff.moved {
        let from = &pair.origin.full_path;
        let to = &pair.dest_path;
        info!("[Moved] Move from '{}' to '{}'.", from.display(), to.display());
        if config.dry || report.record(Operation::Move, to, move_file(from, to)) {
            report.moved += 1;
        }
    }

    for pair in &diff.added {
        let from = &pair.origin.full_path;
        let to = &pair.dest_path;
        info!("[Added] Copy from '{}' to '{}'.", from.display(), to.display());
        if config.dry || report.record(Operation::Copy, to, copy_file(from, to)) {
            report.added += 1;
        }
    }

    for entry in &diff.removed {
        let path = &entry.full_path;
        info!("[Removed] Remove file '{}'.", path.display());
        if config.dry || report.record(Operation::Remove, path, remove_file(path)) {
            report.removed += 1;
        }
    }

    for pair in &diff.changed {
        let from = &pair.origin.full_path;
        let to = &pair.dest.full_path;
        info!(
            "[Changes][{}] Copy from '{}' to '{}'.",
            pair.kind,
            from.display(),
            to.display()
        );
        if config.dry || report.record(Operation::Update, to, copy_file(from, to)) {
            report.changed += 1;
        }
    }

    match prune::empty_folders(&diff.dest_root, &config.exclude) {
        Ok(folders) => {
            for folder in folders {
                info!(
                    "[Delete empty folder][level:{}] Delete '{}'.",
                    folder.level,
                    folder.path.display()
                );
                if config.dry {
                    continue;
                }
                let result = fs::remove_dir(&folder.path)
                    .map_err(|err| Error::from_io(&folder.path, err));
                if report.record(Operation::RemoveFolder, &folder.path, result) {
                    report.folders_removed += 1;
                }
            }
        }
        Err(err) => {
            report.record(Operation::PruneScan, &diff.dest_root, Err(err));
        }
    }

    report.log_summary();
    report
}

/// Diff `origin` against `dest` and apply the result in one call.
pub fn sync(origin: &Path, dest: &Path, config: &CompareConfig) -> Result<ApplyReport, Error> {
    let diff = diff::diff_trees(origin, dest, config)?;
    Ok(apply(&diff, config))
}

fn create_parent(path: &Path) -> Result<(), Error> {
    match path.parent() {
        Some(parent) if !parent.is_dir() => {
            fs::create_dir_all(parent).map_err(|err| Error::from_io(parent, err))
        }
        _ => Ok(()),
    }
}

fn move_file(from: &Path, to: &Path) -> Result<(), Error> {
    create_parent(to)?;
    fs::rename(from, to).map_err(|err| Error::from_io(from, err))
}

fn remove_file(path: &Path) -> Result<(), Error> {
    fs::remove_file(path).map_err(|err| Error::from_io(path, err))
}

/// Copy `from` over `to`, keeping the source modification time so that
/// date comparison sees both copies as equal on the next scan.
fn copy_file(from: &Path, to: &Path) -> Result<(), Error> {
    create_parent(to)?;
    fs::copy(from, to).map_err(|err| Error::from_io(from, err))?;
    let modified = fs::metadata(from)
        .and_then(|metadata| metadata.modified())
        .map_err(|err| Error::from_io(from, err))?;
    File::options()
        .write(true)
        .open(to)
        .and_then(|file| file.set_modified(modified))
        .map_err(|err| Error::from_io(to, err))
}
