use config::{Config, ConfigError, Environment, File as ConfigFile};
use glob::Pattern;
use serde::Deserialize;
use std::ffi::OsStr;
use std::path::PathBuf;
use tracing::error;

/// Names skipped at any depth when nothing else is configured.
pub const DEFAULT_EXCLUDE: [&str; 2] = [".git", "node_modules"];

/// What a tick does when scanning a tree fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanErrorPolicy {
    /// Log the error and try again on the next tick.
    #[default]
    Retry,
    /// Stop polling and hand the error back to the caller.
    Abort,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,
    #[serde(default = "default_true")]
    pub compare_date: bool,
    #[serde(default = "default_true")]
    pub compare_size: bool,
    #[serde(default = "default_true")]
    pub compare_content: bool,
    #[serde(default)]
    pub dry: bool,
    #[serde(default)]
    pub scan_errors: ScanErrorPolicy,
    /// Parent directory of the per-name repositories. Defaults to `repos`
    /// next to the executable.
    #[serde(default)]
    pub repos_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            compare_date: true,
            compare_size: true,
            compare_content: true,
            dry: false,
            scan_errors: ScanErrorPolicy::default(),
            repos_dir: None,
        }
    }
}

impl AppConfig {
    pub fn compare_config(&self) -> CompareConfig {
        CompareConfig {
            exclude: ExcludeSet::new(&self.exclude),
            compare_date: self.compare_date,
            compare_size: self.compare_size,
            compare_content: self.compare_content,
            dry: self.dry,
        }
    }
}

fn default_exclude() -> Vec<String> {
    DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect()
}

fn default_true() -> bool {
    true
}

/// Load `Autosave.toml` (optional) and `AUTOSAVE_*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Autosave").required(false))
        .add_source(
            Environment::with_prefix("AUTOSAVE")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("exclude"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Options threaded through every scan, diff and apply call.
///
/// Only one of the three comparisons decides whether a file changed: date
/// when enabled, otherwise size, otherwise content. Content is still loaded
/// whenever `compare_content` is set since move detection needs it.
#[derive(Debug, Clone)]
pub struct CompareConfig {
    pub exclude: ExcludeSet,
    pub compare_date: bool,
    pub compare_size: bool,
    pub compare_content: bool,
    pub dry: bool,
}

impl Default for CompareConfig {
    fn default() -> Self {
        AppConfig::default().compare_config()
    }
}

/// Base names excluded from enumeration and pruning.
///
/// Plain entries match a name exactly; entries with glob metacharacters
/// are matched as patterns.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
    names: Vec<String>,
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    pub fn new<S: AsRef<str>>(entries: &[S]) -> Self {
        let mut set = ExcludeSet::default();
        for entry in entries {
            let entry = entry.as_ref();
            if !entry.contains(['*', '?', '[']) {
                set.names.push(entry.to_string());
                continue;
            }
            match Pattern::new(entry) {
                Ok(pattern) => set.patterns.push(pattern),
                Err(e) => error!("Invalid exclude pattern '{}': {}", entry, e),
            }
        }
        set
    }

    pub fn matches(&self, name: &OsStr) -> bool {
        if self.is_empty() {
            return false;
        }
        let name = name.to_string_lossy();
        self.names.iter().any(|n| *n == name) || self.patterns.iter().any(|p| p.matches(&name))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.patterns.is_empty()
    }
}
