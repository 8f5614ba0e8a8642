pub mod config;
pub mod diff;
pub mod error;
pub mod hasher;
pub mod model;
pub mod poller;
pub mod prune;
pub mod scanner;
pub mod sync;
pub mod vcs;

pub use crate::config::{AppConfig, CompareConfig, ExcludeSet, ScanErrorPolicy};
pub use diff::{diff_trees, ChangeKind, DiffResult};
pub use error::Error;
pub use model::Entry;
pub use poller::{LoopState, Poller, TickOutcome};
pub use prune::{empty_folders, EmptyFolder, FolderNode};
pub use sync::{apply, sync, ApplyReport};
pub use vcs::{GitCli, VersionControl};
