use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Path '{}' does not exist", .0.display())]
    NotFound(PathBuf),

    #[error("Access denied to '{}'", .0.display())]
    AccessDenied(PathBuf),

    #[error("Directory walk error: {0}")]
    Walk(walkdir::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Classify an IO error raised while touching `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Error::AccessDenied(path.to_path_buf()),
            _ => Error::Io(io::Error::new(
                err.kind(),
                format!("{}: {}", path.display(), err),
            )),
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf);
        match (path, err.io_error().map(io::Error::kind)) {
            (Some(path), Some(io::ErrorKind::NotFound)) => Error::NotFound(path),
            (Some(path), Some(io::ErrorKind::PermissionDenied)) => Error::AccessDenied(path),
            _ => Error::Walk(err),
        }
    }
}
