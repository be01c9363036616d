use crate::errors::{ConfigError, DomainError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

const EMBEDDED_TABLE: &str = include_str!("../prices/default.toml");

static CORE_SUFFIX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"-(\d+)$").ok());

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MachinePrice {
    pub preemptible: f64,
    pub standard: f64,
}

/// Versioned hourly price table, keyed by machine class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    pub version: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub machines: BTreeMap<String, MachinePrice>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl PriceTable {
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::parse(EMBEDDED_TABLE, Path::new("<embedded>"))
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs_err::read_to_string(path).map_err(|e| ConfigError::PathIo {
            path: path.to_path_buf(),
            source: e,
        })?;
        let table = Self::parse(&content, path)?;
        tracing::info!(
            "Loaded price table '{}' ({} machine classes) from {}",
            table.version,
            table.machines.len(),
            path.display()
        );
        Ok(table)
    }

    fn parse(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        let table: PriceTable = toml::from_str(content)?;
        if table.machines.is_empty() {
            return Err(ConfigError::InvalidPriceTable {
                path: origin.to_path_buf(),
                reason: "no machine classes defined".to_string(),
            });
        }
        if let Some((name, _)) = table
            .machines
            .iter()
            .find(|(_, p)| p.preemptible < 0.0 || p.standard < 0.0)
        {
            return Err(ConfigError::InvalidPriceTable {
                path: origin.to_path_buf(),
                reason: format!("negative price for '{}'", name),
            });
        }
        Ok(table)
    }

    pub fn hourly_rate(&self, machine_class: &str, preemptible: bool) -> Result<f64, DomainError> {
        self.machines
            .get(machine_class)
            .map(|p| if preemptible { p.preemptible } else { p.standard })
            .ok_or_else(|| DomainError::MissingPriceEntry {
                machine_class: machine_class.to_string(),
                preemptible,
            })
    }
}

/// Core count encoded in a machine class name: the trailing number, or 1 for shared-core classes.
pub fn core_count(machine_class: &str) -> Option<u32> {
    if machine_class.contains("-small") || machine_class.contains("-micro") {
        return Some(1);
    }
    CORE_SUFFIX
        .as_ref()?
        .captures(machine_class)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
