use crate::config::ExcludeSet;
use crate::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Recursive listing of the regular files under `root`.
///
/// Directories are descended into but not returned. Any file or directory
/// whose base name is excluded is skipped together with everything below
/// it. Symlinks are neither followed nor returned.
pub fn enumerate_files(root: &Path, exclude: &ExcludeSet) -> Result<Vec<PathBuf>, Error> {
    let metadata = fs::metadata(root).map_err(|err| Error::from_io(root, err))?;
    if !metadata.is_dir() {
        return Err(Error::Other(format!(
            "'{}' is not a directory",
            root.display()
        )));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !exclude.matches(entry.file_name()));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
