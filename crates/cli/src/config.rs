//! Configuration management for the CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fallback when neither flag, env var nor config file names a URL
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Fallback artifact directory
pub const DEFAULT_ARTIFACT_DIR: &str = "artifacts";

/// CLI configuration, read from `~/.config/diet/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// API endpoint URL
    pub api_url: Option<String>,
    /// Directory holding the pipeline artifacts
    pub artifact_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default location; a missing file is empty config
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// Flag or env value wins over the file, then the built-in default
    pub fn resolve_api_url(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn resolve_artifact_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.artifact_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR))
    }

    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("diet").join("config.json"))
    }
}
