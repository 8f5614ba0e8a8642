use crate::config::CompareConfig;
use crate::error::Error;
use crate::hasher;
use crate::model::Entry;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Attach the attributes the active comparisons need to each path.
///
/// Runs in parallel; the output keeps the order of `paths`.
pub fn inspect_entries(
    root: &Path,
    paths: Vec<PathBuf>,
    config: &CompareConfig,
) -> Result<Vec<Entry>, Error> {
    paths
        .into_par_iter()
        .map(|path| inspect_entry(root, path, config))
        .collect()
}

pub fn inspect_entry(root: &Path, path: PathBuf, config: &CompareConfig) -> Result<Entry, Error> {
    let relative_path = path
        .strip_prefix(root)
        .map_err(|_| {
            Error::Other(format!(
                "'{}' is not inside '{}'",
                path.display(),
                root.display()
            ))
        })?
        .to_path_buf();

    let mut entry = Entry {
        full_path: path,
        relative_path,
        size: None,
        modified: None,
        content: None,
    };

    if config.compare_size || config.compare_date {
        let metadata =
            fs::metadata(&entry.full_path).map_err(|err| Error::from_io(&entry.full_path, err))?;
        if config.compare_size {
            entry.size = Some(metadata.len());
        }
        if config.compare_date {
            entry.modified = Some(
                metadata
                    .modified()
                    .map_err(|err| Error::from_io(&entry.full_path, err))?,
            );
        }
    }

    if config.compare_content {
        entry.content = Some(
            hasher::read_full_file(&entry.full_path)
                .map_err(|err| Error::from_io(&entry.full_path, err))?
                .into(),
        );
    }

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_follow_config_flags() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let file = root.join("a.txt");
        fs::write(&file, "hello").unwrap();

        let config = CompareConfig {
            compare_date: false,
            compare_size: true,
            compare_content: false,
            ..CompareConfig::default()
        };
        let entry = inspect_entry(root, file.clone(), &config).unwrap();
        assert_eq!(entry.relative_path, PathBuf::from("a.txt"));
        assert_eq!(entry.size, Some(5));
        assert!(entry.modified.is_none());
        assert!(entry.content.is_none());

        let entry = inspect_entry(root, file, &CompareConfig::default()).unwrap();
        assert!(entry.modified.is_some());
        assert_eq!(entry.content.as_deref(), Some(&b"hello"[..]));
    }

    #[test]
    fn test_order_is_preserved() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let paths: Vec<PathBuf> = (0..20)
            .map(|i| {
                let p = root.join(format!("f{:02}.txt", i));
                fs::write(&p, i.to_string()).unwrap();
                p
            })
            .collect();

        let entries = inspect_entries(root, paths.clone(), &CompareConfig::default()).unwrap();
        let full: Vec<PathBuf> = entries.into_iter().map(|e| e.full_path).collect();
        assert_eq!(full, paths);
    }
}
