//! Server configuration

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration, read from an optional `diet.toml` and `DIET_*` env vars
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Name reported in structured logs
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Port for the recommendation, health and metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Labeled dataset written by the clustering pipeline
    #[serde(default = "default_dataset_path")]
    pub dataset_path: PathBuf,

    /// Fixed seed for meal sampling; entropy-seeded when unset
    #[serde(default)]
    pub sampling_seed: Option<u64>,
}

fn default_service_name() -> String {
    "diet-server".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("artifacts/clustered_food_data.csv")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            api_port: default_api_port(),
            dataset_path: default_dataset_path(),
            sampling_seed: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `diet.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("diet")
    }

    pub fn load_from(file_stem: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(config::Environment::with_prefix("DIET"))
            .build()
            .context("Failed to read server configuration")?;

        config
            .try_deserialize()
            .context("Invalid server configuration")
    }
}
