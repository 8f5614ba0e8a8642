mod inspect;
mod walk;

pub use inspect::{inspect_entries, inspect_entry};
pub use walk::enumerate_files;

use crate::config::CompareConfig;
use crate::error::Error;
use crate::model::Entry;
use std::path::Path;

/// Enumerate and inspect every file under `root`.
pub fn scan_tree(root: &Path, config: &CompareConfig) -> Result<Vec<Entry>, Error> {
    let paths = enumerate_files(root, &config.exclude)?;
    inspect_entries(root, paths, config)
}
