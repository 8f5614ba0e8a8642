use crate::config::CompareConfig;
use crate::error::Error;
use crate::hasher::hash_data;
use crate::model::Entry;
use crate::scanner;
use ahash::AHashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::debug;

/// The criterion that classified a file present on both sides as changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Date,
    Size,
    Content,
}

/// Comparators in precedence order. The first enabled one alone decides.
const COMPARATORS: [ChangeKind; 3] = [ChangeKind::Date, ChangeKind::Size, ChangeKind::Content];

impl ChangeKind {
    fn is_enabled(self, config: &CompareConfig) -> bool {
        match self {
            ChangeKind::Date => config.compare_date,
            ChangeKind::Size => config.compare_size,
            ChangeKind::Content => config.compare_content,
        }
    }

    fn differs(self, origin: &Entry, dest: &Entry) -> bool {
        match self {
            ChangeKind::Date => origin.modified != dest.modified,
            ChangeKind::Size => origin.size != dest.size,
            ChangeKind::Content => origin.content != dest.content,
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangeKind::Date => "date",
            ChangeKind::Size => "size",
            ChangeKind::Content => "content",
        };
        f.write_str(label)
    }
}

/// Decide whether `dest` is out of date relative to `origin`.
pub fn classify_change(origin: &Entry, dest: &Entry, config: &CompareConfig) -> Option<ChangeKind> {
    let kind = COMPARATORS
        .into_iter()
        .find(|kind| kind.is_enabled(config))?;
    kind.differs(origin, dest).then_some(kind)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedPair {
    pub origin: Entry,
    pub dest_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePair {
    pub kind: ChangeKind,
    pub origin: Entry,
    pub dest: Entry,
}

/// A destination file that reappears in the origin under another name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovedPair {
    /// The destination file at its current (stale) location.
    pub origin: Entry,
    /// The origin file it matched byte for byte.
    pub source: Entry,
    /// Where the file has to end up in the destination tree.
    pub dest_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    pub origin_root: PathBuf,
    pub dest_root: PathBuf,
    pub origin_entries: Vec<Entry>,
    pub dest_entries: Vec<Entry>,
    pub added: Vec<AddedPair>,
    pub removed: Vec<Entry>,
    pub changed: Vec<ChangePair>,
    pub moved: Vec<MovedPair>,
}

impl DiffResult {
    pub fn is_changed(&self) -> bool {
        !(self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
            && self.moved.is_empty())
    }
}

/// Scan both roots and classify every relative path.
pub fn diff_trees(
    origin_root: &Path,
    dest_root: &Path,
    config: &CompareConfig,
) -> Result<DiffResult, Error> {
    let scan_start = Instant::now();
    let origin_entries = scanner::scan_tree(origin_root, config)?;
    let dest_entries = scanner::scan_tree(dest_root, config)?;
    let scan_duration = scan_start.elapsed();

    let result = classify(origin_root, dest_root, origin_entries, dest_entries, config);
    debug!(
        "Compared {} origin and {} destination files in {:.2}s: \
         {} added, {} removed, {} changed, {} moved",
        result.origin_entries.len(),
        result.dest_entries.len(),
        scan_duration.as_secs_f64(),
        result.added.len(),
        result.removed.len(),
        result.changed.len(),
        result.moved.len(),
    );

    Ok(result)
}

/// Classify already inspected entries of two trees.
pub fn classify(
    origin_root: &Path,
    dest_root: &Path,
    origin_entries: Vec<Entry>,
    dest_entries: Vec<Entry>,
    config: &CompareConfig,
) -> DiffResult {
    let mut added = Vec::new();
    let mut removed = Vec::new();
    let mut changed = Vec::new();

    {
        let origin_index: AHashMap<&Path, &Entry> = origin_entries
            .iter()
            .map(|e| (e.relative_path.as_path(), e))
            .collect();
        let dest_index: AHashMap<&Path, &Entry> = dest_entries
            .iter()
            .map(|e| (e.relative_path.as_path(), e))
            .collect();

        for entry in &origin_entries {
            match dest_index.get(entry.relative_path.as_path()) {
                None => added.push(AddedPair {
                    origin: entry.clone(),
                    dest_path: entry.rebased(dest_root),
                }),
                Some(dest) => {
                    if let Some(kind) = classify_change(entry, dest, config) {
                        changed.push(ChangePair {
                            kind,
                            origin: entry.clone(),
                            dest: (*dest).clone(),
                        });
                    }
                }
            }
        }

        for entry in &dest_entries {
            if !origin_index.contains_key(entry.relative_path.as_path()) {
                removed.push(entry.clone());
            }
        }
    }

    let mut moved = Vec::new();
    if config.compare_content {
        (added, removed, moved) = pair_moves(added, removed);
    }

    DiffResult {
        origin_root: origin_root.to_path_buf(),
        dest_root: dest_root.to_path_buf(),
        origin_entries,
        dest_entries,
        added,
        removed,
        changed,
        moved,
    }
}

/// Turn added/removed pairs with identical bytes into moves.
///
/// Added entries are visited in relative path order and each takes the
/// removed candidate with the smallest relative path among those with the
/// same content. A removed entry is claimed at most once, and never by an
/// added entry whose path is nested inside it or contains it: such a rename
/// cannot happen before the blocking file or directory is gone.
fn pair_moves(
    mut added: Vec<AddedPair>,
    removed: Vec<Entry>,
) -> (Vec<AddedPair>, Vec<Entry>, Vec<MovedPair>) {
    if added.is_empty() || removed.is_empty() {
        return (added, removed, Vec::new());
    }

    let mut order: Vec<usize> = (0..removed.len()).collect();
    order.sort_by(|&a, &b| removed[a].relative_path.cmp(&removed[b].relative_path));

    let mut by_hash: AHashMap<u64, Vec<usize>> = AHashMap::new();
    for idx in order {
        if let Some(content) = &removed[idx].content {
            by_hash.entry(hash_data(content)).or_default().push(idx);
        }
    }

    let mut slots: Vec<Option<Entry>> = removed.into_iter().map(Some).collect();
    let mut remaining = Vec::new();
    let mut moved = Vec::new();

    added.sort_by(|a, b| a.origin.relative_path.cmp(&b.origin.relative_path));
    for pair in added {
        let found = pair.origin.content.as_deref().and_then(|content| {
            by_hash.get(&hash_data(content))?.iter().copied().find(|&idx| {
                slots[idx].as_ref().is_some_and(|e| {
                    e.content.as_deref() == Some(content)
                        && !is_nested(&e.relative_path, &pair.origin.relative_path)
                })
            })
        });

        match found.and_then(|idx| slots[idx].take()) {
            Some(origin) => moved.push(MovedPair {
                origin,
                source: pair.origin,
                dest_path: pair.dest_path,
            }),
            None => remaining.push(pair),
        }
    }

    let removed = slots.into_iter().flatten().collect();
    (remaining, removed, moved)
}

fn is_nested(a: &Path, b: &Path) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn entry(root: &str, rel: &str, size: u64, secs: u64, content: &str) -> Entry {
        Entry {
            size: Some(size),
            modified: Some(SystemTime::UNIX_EPOCH + Duration::from_secs(secs)),
            content: Some(content.as_bytes().into()),
            ..Entry::new(Path::new(root), PathBuf::from(rel))
        }
    }

    fn config(date: bool, size: bool, content: bool) -> CompareConfig {
        CompareConfig {
            compare_date: date,
            compare_size: size,
            compare_content: content,
            ..CompareConfig::default()
        }
    }

    fn classify_all(origin: Vec<Entry>, dest: Vec<Entry>) -> DiffResult {
        let config = config(true, true, true);
        classify(Path::new("/o"), Path::new("/d"), origin, dest, &config)
    }

    #[test]
    fn test_date_alone_decides_when_enabled() {
        let origin = entry("/o", "a", 1, 10, "x");
        let dest = entry("/d", "a", 2, 10, "yy");
        // Size and content differ but the dates match.
        assert_eq!(classify_change(&origin, &dest, &config(true, true, true)), None);

        let dest = entry("/d", "a", 1, 11, "x");
        assert_eq!(
            classify_change(&origin, &dest, &config(true, true, true)),
            Some(ChangeKind::Date)
        );
    }

    #[test]
    fn test_size_then_content_precedence() {
        let origin = entry("/o", "a", 3, 10, "abc");
        let same_size = entry("/d", "a", 3, 99, "xyz");
        assert_eq!(classify_change(&origin, &same_size, &config(false, true, true)), None);
        assert_eq!(
            classify_change(&origin, &same_size, &config(false, false, true)),
            Some(ChangeKind::Content)
        );

        let other_size = entry("/d", "a", 4, 10, "abcd");
        assert_eq!(
            classify_change(&origin, &other_size, &config(false, true, false)),
            Some(ChangeKind::Size)
        );
    }

    #[test]
    fn test_nothing_enabled_means_unchanged() {
        let origin = entry("/o", "a", 3, 10, "abc");
        let dest = entry("/d", "a", 4, 11, "abcd");
        assert_eq!(classify_change(&origin, &dest, &config(false, false, false)), None);
    }

    #[test]
    fn test_classify_added_removed_changed() {
        let origin = vec![
            entry("/o", "same", 1, 1, "s"),
            entry("/o", "new", 1, 1, "n"),
            entry("/o", "edit", 1, 2, "e"),
        ];
        let dest = vec![
            entry("/d", "same", 1, 1, "s"),
            entry("/d", "old", 1, 1, "o"),
            entry("/d", "edit", 1, 1, "e"),
        ];

        let result = classify_all(origin, dest);
        assert!(result.is_changed());
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.added[0].dest_path, Path::new("/d").join("new"));
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].relative_path, PathBuf::from("old"));
        assert_eq!(result.changed.len(), 1);
        assert_eq!(result.changed[0].kind, ChangeKind::Date);
        assert!(result.moved.is_empty());
    }

    #[test]
    fn test_move_tie_break_prefers_smallest_relative_path() {
        let origin = vec![entry("/o", "m", 1, 1, "dup")];
        let dest = vec![entry("/d", "z", 1, 1, "dup"), entry("/d", "b", 1, 1, "dup")];

        let result = classify_all(origin, dest);
        assert_eq!(result.moved.len(), 1);
        assert_eq!(result.moved[0].origin.relative_path, PathBuf::from("b"));
        assert_eq!(result.moved[0].dest_path, Path::new("/d").join("m"));
        assert_eq!(result.removed.len(), 1);
        assert_eq!(result.removed[0].relative_path, PathBuf::from("z"));
        assert!(result.added.is_empty());
    }

    #[test]
    fn test_removed_entry_claimed_once() {
        let origin = vec![entry("/o", "a", 1, 1, "dup"), entry("/o", "b", 1, 1, "dup")];
        let dest = vec![entry("/d", "c", 1, 1, "dup")];

        let result = classify_all(origin, dest);
        assert_eq!(result.moved.len(), 1);
        assert_eq!(result.moved[0].source.relative_path, PathBuf::from("a"));
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.added[0].origin.relative_path, PathBuf::from("b"));
        assert!(result.removed.is_empty());
    }

    #[test]
    fn test_nested_paths_are_never_paired() {
        // File "notes" became the directory "notes" holding the same bytes.
        let origin = vec![entry("/o", "notes/todo", 4, 1, "same")];
        let dest = vec![entry("/d", "notes", 4, 1, "same")];
        let result = classify_all(origin, dest);
        assert!(result.moved.is_empty());
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.removed.len(), 1);

        // And back: a directory collapsed into a file of the same name.
        let origin = vec![entry("/o", "notes", 4, 1, "same")];
        let dest = vec![entry("/d", "notes/todo", 4, 1, "same")];
        let result = classify_all(origin, dest);
        assert!(result.moved.is_empty());
        assert_eq!(result.added.len(), 1);
        assert_eq!(result.removed.len(), 1);
    }

    #[test]
    fn test_nested_candidate_skipped_for_next_match() {
        let origin = vec![entry("/o", "notes/todo", 4, 1, "same")];
        let dest = vec![entry("/d", "notes", 4, 1, "same"), entry("/d", "zz", 4, 1, "same")];
        let result = classify_all(origin, dest);
        assert_eq!(result.moved.len(), 1);
        assert_eq!(result.moved[0].origin.relative_path, PathBuf::from("zz"));
        assert_eq!(result.removed[0].relative_path, PathBuf::from("notes"));
    }

    #[test]
    fn test_classified_entries_share_file_bytes() {
        let origin = vec![entry("/o", "new", 1, 1, "n"), entry("/o", "edit", 1, 2, "e")];
        let dest = vec![entry("/d", "old", 1, 1, "o"), entry("/d", "edit", 1, 1, "e")];

        let result = classify_all(origin, dest);
        let shared = |a: &Entry, b: &Entry| match (&a.content, &b.content) {
            (Some(a), Some(b)) => std::sync::Arc::ptr_eq(a, b),
            _ => false,
        };
        let scanned = |entries: &[Entry], rel: &str| {
            entries.iter().find(|e| e.relative_path == Path::new(rel)).cloned().unwrap()
        };

        assert!(shared(&result.added[0].origin, &scanned(&result.origin_entries, "new")));
        assert!(shared(&result.removed[0], &scanned(&result.dest_entries, "old")));
        assert!(shared(&result.changed[0].origin, &scanned(&result.origin_entries, "edit")));
        assert!(shared(&result.changed[0].dest, &scanned(&result.dest_entries, "edit")));
    }

    #[test]
    fn test_change_kind_labels() {
        assert_eq!(ChangeKind::Date.to_string(), "date");
        assert_eq!(ChangeKind::Size.to_string(), "size");
        assert_eq!(ChangeKind::Content.to_string(), "content");
    }
}
