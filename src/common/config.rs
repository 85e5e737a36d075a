use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::common::errors::{Result, RmappError};
use crate::finder::matcher::TokenRunPolicy;
use crate::finder::walker::SizeMode;

/// Global rmapp configuration, read from `~/.rmapp/config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// How sizes are reported and accounted
    #[serde(default)]
    pub size_mode: SizeMode,

    /// Where multi-word application names are searched as token runs
    #[serde(default)]
    pub token_runs: TokenRunPolicy,

    /// Skip shallow vendor directories that share the bundle domain but do not match
    #[serde(default = "default_prune_domain_dirs")]
    pub prune_domain_dirs: bool,

    /// Directory depth searched below most roots
    #[serde(default = "default_standard_depth")]
    pub standard_depth: usize,

    /// Directory depth searched below ~/Library/Preferences
    #[serde(default = "default_preferences_depth")]
    pub preferences_depth: usize,

    /// Additional roots to scan, `~` is expanded
    #[serde(default)]
    pub extra_roots: Vec<String>,

    /// Matches containing any of these substrings are never removed
    #[serde(default)]
    pub exclude_paths: Vec<String>,

    /// Also write debug logs to ~/.rmapp/logs
    #[serde(default)]
    pub log_to_file: bool,
}

fn default_prune_domain_dirs() -> bool {
    true
}
fn default_standard_depth() -> usize {
    1
}
fn default_preferences_depth() -> usize {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size_mode: SizeMode::default(),
            token_runs: TokenRunPolicy::default(),
            prune_domain_dirs: default_prune_domain_dirs(),
            standard_depth: default_standard_depth(),
            preferences_depth: default_preferences_depth(),
            extra_roots: Vec::new(),
            exclude_paths: Vec::new(),
            log_to_file: false,
        }
    }
}

impl Config {
    /// Get the rmapp data directory (~/.rmapp)
    pub fn data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".rmapp")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    /// Get the logs directory
    pub fn logs_dir() -> PathBuf {
        Self::data_dir().join("logs")
    }

    /// Load config from the default location, or defaults if there is none
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents =
            std::fs::read_to_string(path).map_err(|e| RmappError::from_io(path, e))?;
        toml::from_str(&contents).map_err(|e| RmappError::ConfigError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Extra roots with `~` expanded against `home`
    pub fn expanded_extra_roots(&self, home: &Path) -> Vec<PathBuf> {
        self.extra_roots
            .iter()
            .map(|root| match root.strip_prefix('~') {
                Some(rest) => home.join(rest.trim_start_matches('/')),
                None => PathBuf::from(root),
            })
            .collect()
    }

    /// Check if a path should be excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.display().to_string();
        self.exclude_paths.iter().any(|p| path_str.contains(p))
    }
}
