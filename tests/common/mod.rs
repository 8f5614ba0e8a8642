#![allow(dead_code)]

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Every fixture file gets this modification time so that trees written
/// separately compare equal by date.
pub const FIXED_MTIME_SECS: u64 = 1_700_000_000;

pub fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    write_file_at(root, rel, content, FIXED_MTIME_SECS)
}

pub fn write_file_at(root: &Path, rel: &str, content: &str, mtime_secs: u64) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs))
        .unwrap();
    path
}

/// Relative paths of every file and directory under `root`, with contents.
pub fn snapshot(root: &Path) -> Vec<(String, Option<Vec<u8>>)> {
    let mut items = Vec::new();
    collect(root, root, &mut items);
    items.sort();
    items
}

fn collect(root: &Path, dir: &Path, items: &mut Vec<(String, Option<Vec<u8>>)>) {
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        let rel = path
            .strip_prefix(root)
            .unwrap()
            .to_string_lossy()
            .replace('\\', "/");
        if path.is_dir() {
            items.push((rel, None));
            collect(root, &path, items);
        } else {
            items.push((rel, Some(fs::read(&path).unwrap())));
        }
    }
}

pub fn rel_paths<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Vec<String> {
    let mut out: Vec<String> = paths
        .into_iter()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .collect();
    out.sort();
    out
}
