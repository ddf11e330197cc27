use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::{deserialize_duration, serialize_duration};

const CONFIG_FILE_NAME: &str = "argocd-endpoint.toml";

fn default_max_concurrent_reconciles() -> usize {
    2
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Controller tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Maximum number of endpoints reconciled at the same time.
    pub max_concurrent_reconciles: usize,

    /// How often `run` sweeps all endpoints.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub poll_interval: Duration,

    /// Per-request timeout for calls to Argo CD.
    #[serde(
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub http_timeout: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_reconciles: default_max_concurrent_reconciles(),
            poll_interval: default_poll_interval(),
            http_timeout: default_http_timeout(),
        }
    }
}

/// Contents of `argocd-endpoint.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store directory. Relative paths are resolved from the config file
    /// location; unset means the config file's own directory.
    pub data_dir: Option<PathBuf>,

    pub controller: ControllerConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    pub controller: ControllerConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./argocd-endpoint.toml` if it exists in current directory
/// 2. `~/.local/share/argocd-endpoint/argocd-endpoint.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from(CONFIG_FILE_NAME);
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("argocd-endpoint").join(CONFIG_FILE_NAME);
    }

    local_config
}

impl ResolvedConfig {
    /// Load and resolve config from a file path.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;

        Ok(Self {
            data_dir: config.resolve_data_dir(config_dir),
            controller: config.controller,
        })
    }

    /// Render the effective settings as a TOML document that `load` accepts.
    pub fn to_toml(&self) -> Result<String> {
        let config = Config {
            data_dir: Some(self.data_dir.clone()),
            controller: self.controller.clone(),
        };
        toml::to_string_pretty(&config).context("Failed to serialize config")
    }

    /// Load config, falling back to defaults when the file does not exist.
    ///
    /// Without a file, the file's intended directory becomes the data dir.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };

        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?;

        Ok(Self {
            data_dir: config_dir.to_path_buf(),
            controller: ControllerConfig::default(),
        })
    }
}
