use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// One regular file found under a scanned root.
///
/// `relative_path` identifies the file inside its tree. `full_path` is only
/// meaningful for the root it was scanned from. File bytes are shared, so
/// cloning an entry into a diff result does not copy them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub full_path: PathBuf,
    pub relative_path: PathBuf,
    pub size: Option<u64>,
    pub modified: Option<SystemTime>,
    pub content: Option<Arc<[u8]>>,
}

impl Entry {
    pub fn new(root: &Path, relative_path: PathBuf) -> Self {
        Self {
            full_path: root.join(&relative_path),
            relative_path,
            size: None,
            modified: None,
            content: None,
        }
    }

    /// Location of this entry's relative path under another root.
    pub fn rebased(&self, root: &Path) -> PathBuf {
        root.join(&self.relative_path)
    }
}
