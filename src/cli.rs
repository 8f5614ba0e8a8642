use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "autosave", version)]
#[command(about = "Autosave changes in a directory in a git repository.", long_about = None)]
pub struct Cli {
    /// Path to watch changes.
    pub path: PathBuf,

    /// Repository name to be created.
    #[arg(value_parser = parse_repo_name)]
    pub repo: String,

    /// Time in seconds to check if files changed.
    #[arg(short, long, default_value_t = 60, value_parser = clap::value_parser!(u64).range(1..))]
    pub duration: u64,
}

fn parse_repo_name(value: &str) -> Result<String, String> {
    if value.contains('/') || value.contains('\\') {
        return Err("repository name does not support path separators.".to_string());
    }
    Ok(value.to_string())
}
