mod cli;
mod logging;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use anyhow::{anyhow, Context};
use autosave::config::{load_configuration, AppConfig};
use autosave::vcs::{self, GitCli};
use autosave::Poller;
use clap::Parser;
use cli::Cli;
use colored::*;
use dotenv::dotenv;
use tracing::{error, info};

const REPOSITORIES_FOLDER: &str = "repos";
const LOG_FILE_NAME: &str = "log.txt";

fn main() {
    dotenv().ok();

    let args = Cli::parse();
    let install_dir = install_dir().unwrap_or_else(|_| PathBuf::from("."));

    let guard = logging::init_logger(&install_dir.join(LOG_FILE_NAME));

    info!("{}", env::args().collect::<Vec<_>>().join(" "));
    info!("{:#?}", args);

    let code = match run(args, &install_dir) {
        Ok(()) => 0,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("{} {:#}", "error:".red().bold(), err);
            1
        }
    };

    drop(guard);
    process::exit(code);
}

fn run(args: Cli, install_dir: &Path) -> anyhow::Result<()> {
    let app_config = load_configuration().context("Error loading configuration")?;
    info!("{:#?}", app_config);

    let input_dir = fs::canonicalize(&args.path)
        .ok()
        .filter(|p| p.is_dir())
        .ok_or_else(|| {
            anyhow!(
                "Input directory '{}' could not be resolved.",
                args.path.display()
            )
        })?;
    let output_dir = repositories_dir(&app_config, install_dir).join(&args.repo);

    info!("Input directory: '{}'", input_dir.display());
    info!("Output directory: '{}'", output_dir.display());

    let mut git = GitCli::new(&output_dir);
    vcs::bootstrap(&output_dir, &mut git)
        .with_context(|| format!("Error preparing repository '{}'", output_dir.display()))?;

    let mut poller = Poller::new(
        &input_dir,
        &output_dir,
        app_config.compare_config(),
        Duration::from_secs(args.duration),
        git,
    )
    .with_scan_error_policy(app_config.scan_errors);

    poller.run()?;
    Ok(())
}

fn install_dir() -> std::io::Result<PathBuf> {
    let exe = env::current_exe()?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

fn repositories_dir(config: &AppConfig, install_dir: &Path) -> PathBuf {
    config
        .repos_dir
        .clone()
        .unwrap_or_else(|| install_dir.join(REPOSITORIES_FOLDER))
}
