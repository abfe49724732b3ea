use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::ethereum::abi::AbiSource;

pub const ABI_DIR_ENV: &str = "CONTRACT_SCHEMA_ABI_DIR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub abi: AbiConfig,
    #[serde(default)]
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbiConfig {
    /// Directory holding `<address>.json` ABI files
    pub abi_dir: PathBuf,
}

/// Names of the events and methods to map; empty means all of them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub methods: Vec<String>,
}

impl Default for AbiConfig {
    fn default() -> Self {
        Self {
            abi_dir: AbiSource::default().abi_dir,
        }
    }
}

impl From<&AbiConfig> for AbiSource {
    fn from(config: &AbiConfig) -> Self {
        Self {
            abi_dir: config.abi_dir.clone(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    anyhow!("Failed to create config directory {:?}: {}", parent, e)
                })?;
            }
        }

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {:?}: {}", path, e))?;

        Ok(())
    }

    /// Load configuration with fallback to default
    pub async fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Self {
        let mut config = match path {
            Some(path) => match Self::load_from_file(path).await {
                Ok(config) => {
                    tracing::info!("Loaded configuration from file");
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to load config file, using defaults: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        };

        if let Ok(abi_dir) = std::env::var(ABI_DIR_ENV) {
            config.apply_abi_dir(abi_dir);
        }
        config
    }

    fn apply_abi_dir(&mut self, abi_dir: String) {
        tracing::debug!("Using {} for ABI directory: {}", ABI_DIR_ENV, abi_dir);
        self.abi.abi_dir = PathBuf::from(abi_dir);
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("contract-schema").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# Contract schema configuration file

[abi]
# Directory of ABI files named after the lowercased contract address,
# e.g. 0x742d35cc6435c9c1c72c5e7b18bab7e1db7a5d6e.json
abi_dir = "./abis"

# Events and methods to map. Leave a list empty to map every entry.
[schema]
events = ["Transfer", "Approval"]
methods = []

# Environment variables that can be used:
# CONTRACT_SCHEMA_ABI_DIR - overrides abi.abi_dir
"#;
        sample_config.to_string()
    }
}
