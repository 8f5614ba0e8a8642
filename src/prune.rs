use crate::config::ExcludeSet;
use crate::error::Error;
use ahash::AHashMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Snapshot of one directory, built bottom-up from a live scan.
///
/// `num_entries` counts every direct child, excluded ones included, and
/// `num_dir_entries` counts the direct children that are directories.
/// Excluded directories are counted but never descended into, so they do
/// not appear in `subfolders`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub path: PathBuf,
    pub name: String,
    pub level: usize,
    pub subfolders: Vec<FolderNode>,
    pub num_entries: usize,
    pub num_dir_entries: usize,
}

impl FolderNode {
    pub fn is_empty(&self) -> bool {
        self.num_entries == 0
    }
}

/// A directory that can be removed once everything deeper is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptyFolder {
    pub path: PathBuf,
    pub level: usize,
}

pub fn build_folder_tree(root: &Path, exclude: &ExcludeSet) -> Result<FolderNode, Error> {
    build_node(root, String::new(), 0, exclude)
}

fn build_node(
    path: &Path,
    name: String,
    level: usize,
    exclude: &ExcludeSet,
) -> Result<FolderNode, Error> {
    let mut num_entries = 0;
    let mut dirs = Vec::new();

    for entry in fs::read_dir(path).map_err(|err| Error::from_io(path, err))? {
        let entry = entry.map_err(|err| Error::from_io(path, err))?;
        num_entries += 1;
        let file_type = entry
            .file_type()
            .map_err(|err| Error::from_io(&entry.path(), err))?;
        if file_type.is_dir() {
            dirs.push((entry.path(), entry.file_name()));
        }
    }

    let num_dir_entries = dirs.len();
    dirs.sort();

    let subfolders = dirs
        .into_iter()
        .filter(|(_, dir_name)| !exclude.matches(dir_name))
        .map(|(dir_path, dir_name)| {
            build_node(
                &dir_path,
                dir_name.to_string_lossy().into_owned(),
                level + 1,
                exclude,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FolderNode {
        path: path.to_path_buf(),
        name,
        level,
        subfolders,
        num_entries,
        num_dir_entries,
    })
}

/// Bottom-up marking pass. Returns the decision for every node by path.
///
/// The root is never marked, nor is a folder with an excluded name. Any
/// other folder is marked when it holds nothing, or when it holds only
/// directories and every one of them is a marked subfolder.
pub fn mark_for_deletion(tree: &FolderNode, exclude: &ExcludeSet) -> AHashMap<PathBuf, bool> {
    let mut marks = AHashMap::new();
    mark_node(tree, exclude, &mut marks);
    marks
}

fn mark_node(node: &FolderNode, exclude: &ExcludeSet, marks: &mut AHashMap<PathBuf, bool>) -> bool {
    let subfolder_marks: Vec<bool> = node
        .subfolders
        .iter()
        .map(|subfolder| mark_node(subfolder, exclude, marks))
        .collect();

    let only_marked_dirs = node.num_entries == node.num_dir_entries
        && node.subfolders.len() == node.num_dir_entries
        && subfolder_marks.iter().all(|marked| *marked);

    let marked = node.level != 0
        && !exclude.matches(OsStr::new(&node.name))
        && (node.is_empty() || only_marked_dirs);

    marks.insert(node.path.clone(), marked);
    marked
}

/// Directories under `root` that are safe to delete, deepest first.
pub fn empty_folders(root: &Path, exclude: &ExcludeSet) -> Result<Vec<EmptyFolder>, Error> {
    let tree = build_folder_tree(root, exclude)?;
    let marks = mark_for_deletion(&tree, exclude);

    let mut folders = Vec::new();
    collect_marked(&tree, &marks, &mut folders);
    folders.sort_by(|a, b| b.level.cmp(&a.level));
    Ok(folders)
}

fn collect_marked(
    node: &FolderNode,
    marks: &AHashMap<PathBuf, bool>,
    folders: &mut Vec<EmptyFolder>,
) {
    if marks.get(&node.path).copied().unwrap_or(false) {
        folders.push(EmptyFolder {
            path: node.path.clone(),
            level: node.level,
        });
    }
    for subfolder in &node.subfolders {
        collect_marked(subfolder, marks, folders);
    }
}
