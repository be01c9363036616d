use crate::constants::{dirs, env, files};
use crate::errors::ConfigError;
use crate::pricing::PriceTable;
use crate::reconcile::AttemptOrdering;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub platform: PlatformConfig,
    pub pricing: PricingConfig,
    pub reconcile: ReconcileConfig,
    pub logging: LoggingConfig,
    pub poll: PollConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub concurrency: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.firecloud.org/api".to_string(),
            timeout_secs: 60,
            max_retries: 3,
            backoff_base_ms: 500,
            concurrency: 8,
            access_token: None,
        }
    }
}

impl PlatformConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Token from the environment, falling back to the configuration file.
    pub fn resolved_access_token(&self) -> Option<String> {
        std::env::var(env::ACCESS_TOKEN)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| self.access_token.clone())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    pub attempt_ordering: AttemptOrdering,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub max_files: usize,
    pub max_age_days: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            max_files: 20,
            max_age_days: 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub initial_interval_secs: u64,
    pub max_interval_secs: u64,
    pub max_polls: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_interval_secs: 10,
            max_interval_secs: 300,
            max_polls: 120,
        }
    }
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.platform.base_url.trim().is_empty() {
            return Err(ConfigError::General(
                "[platform] base_url must not be empty".to_string(),
            ));
        }
        if self.platform.concurrency == 0 {
            return Err(ConfigError::General(
                "[platform] concurrency must be at least 1".to_string(),
            ));
        }
        if self.poll.initial_interval_secs > self.poll.max_interval_secs {
            return Err(ConfigError::General(format!(
                "[poll] initial_interval_secs ({}) exceeds max_interval_secs ({})",
                self.poll.initial_interval_secs, self.poll.max_interval_secs
            )));
        }
        Ok(())
    }

    /// The configured price table, or the embedded default when none is set.
    pub fn price_table(&self) -> Result<PriceTable, ConfigError> {
        match &self.pricing.table {
            Some(raw) => {
                let expanded = shellexpand::full(raw)
                    .map_err(|e| ConfigError::General(format!("Cannot expand '{}': {}", raw, e)))?;
                PriceTable::load_from_path(Path::new(expanded.as_ref()))
            }
            None => PriceTable::embedded(),
        }
    }
}

pub fn config_dir() -> Result<PathBuf, ConfigError> {
    xdg::BaseDirectories::with_prefix(dirs::RECKON)
        .get_config_home()
        .ok_or(ConfigError::XdgDirectoryNotFound("config"))
}

pub fn cache_dir() -> Result<PathBuf, ConfigError> {
    xdg::BaseDirectories::with_prefix(dirs::RECKON)
        .get_cache_home()
        .ok_or(ConfigError::XdgDirectoryNotFound("cache"))
}

pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_dir()?.join(files::CONFIG);
    if !path.exists() {
        tracing::debug!("No configuration at {}; using defaults", path.display());
        return Ok(Config::default());
    }
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let content = fs_err::read_to_string(path).map_err(|e| ConfigError::PathIo {
        path: path.to_path_buf(),
        source: e,
    })?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}
