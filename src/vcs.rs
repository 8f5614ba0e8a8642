use crate::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, info};

pub const AUTHOR_NAME: &str = "autosave";
pub const AUTHOR_EMAIL: &str = "autosave@localhost";
pub const BRANCH: &str = "autosave";
pub const BLANK_SLATE_MESSAGE: &str = "blank slate";
pub const BLANK_SLATE_TAG: &str = "blank-slate";

/// Snapshot operations run against the destination repository.
///
/// Implementations report their own failures; nothing is returned to the
/// caller and a failed command leaves the loop running.
pub trait VersionControl {
    fn init(&mut self);
    fn config(&mut self, key: &str, value: &str);
    fn checkout_new_branch(&mut self, branch: &str);
    fn commit(&mut self, message: &str, allow_empty: bool);
    fn tag(&mut self, name: &str);
    fn add(&mut self, pathspec: &str);
    fn rm(&mut self, pathspec: &str, force: bool, recursive: bool);
    fn clean(&mut self, force: bool, directories: bool, no_ignore: bool);
}

/// `git` invoked as a child process inside the repository directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    work_dir: PathBuf,
}

impl GitCli {
    pub fn new(work_dir: &Path) -> Self {
        Self::with_program("git", work_dir)
    }

    pub fn with_program(program: &str, work_dir: &Path) -> Self {
        Self {
            program: program.to_string(),
            work_dir: work_dir.to_path_buf(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Run one command. Returns whether it exited successfully.
    pub fn run(&self, args: &[&str]) -> bool {
        info!("$ {} {}", self.program, args.join(" "));

        let output = match Command::new(&self.program)
            .args(args)
            .current_dir(&self.work_dir)
            .output()
        {
            Ok(output) => output,
            Err(err) => {
                error!("Failed to run {}: {}", self.program, err);
                return false;
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            error!(
                "Command failed ({}): {}{}",
                output.status,
                stderr.trim(),
                stdout.trim()
            );
            return false;
        }

        debug!("{}", String::from_utf8_lossy(&output.stdout).trim());
        true
    }
}

pub fn commit_args(message: &str, allow_empty: bool) -> Vec<&str> {
    let mut args = vec!["commit", "-m", message];
    if allow_empty {
        args.push("--allow-empty");
    }
    args
}

pub fn rm_args(pathspec: &str, force: bool, recursive: bool) -> Vec<&str> {
    let mut args = vec!["rm"];
    if force {
        args.push("-f");
    }
    if recursive {
        args.push("-r");
    }
    args.push(pathspec);
    args
}

pub fn clean_args(force: bool, directories: bool, no_ignore: bool) -> Vec<&'static str> {
    let mut args = vec!["clean"];
    if force {
        args.push("-f");
    }
    if directories {
        args.push("-d");
    }
    if no_ignore {
        args.push("-x");
    }
    args
}

impl VersionControl for GitCli {
    fn init(&mut self) {
        self.run(&["init"]);
    }

    fn config(&mut self, key: &str, value: &str) {
        self.run(&["config", key, value]);
    }

    fn checkout_new_branch(&mut self, branch: &str) {
        self.run(&["checkout", "-b", branch]);
    }

    fn commit(&mut self, message: &str, allow_empty: bool) {
        self.run(&commit_args(message, allow_empty));
    }

    fn tag(&mut self, name: &str) {
        self.run(&["tag", name]);
    }

    fn add(&mut self, pathspec: &str) {
        self.run(&["add", pathspec]);
    }

    fn rm(&mut self, pathspec: &str, force: bool, recursive: bool) {
        self.run(&rm_args(pathspec, force, recursive));
    }

    fn clean(&mut self, force: bool, directories: bool, no_ignore: bool) {
        self.run(&clean_args(force, directories, no_ignore));
    }
}

/// Make sure `dest` exists and is a repository with the blank-slate commit.
///
/// An existing `.git` directory is left untouched.
pub fn bootstrap<V: VersionControl>(dest: &Path, vcs: &mut V) -> Result<(), Error> {
    if !dest.exists() {
        fs::create_dir_all(dest).map_err(|err| Error::from_io(dest, err))?;
    }

    if dest.join(".git").exists() {
        debug!("Repository '{}' already initialized", dest.display());
        return Ok(());
    }

    vcs.init();
    vcs.config("user.name", AUTHOR_NAME);
    vcs.config("user.email", AUTHOR_EMAIL);
    vcs.checkout_new_branch(BRANCH);
    vcs.commit(BLANK_SLATE_MESSAGE, true);
    vcs.tag(BLANK_SLATE_TAG);
    Ok(())
}
