use crate::metaheuristic::acs::Params;
use crate::rng::{os_random_seed, rng64};

use oorandom::Rand64;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("config is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("config is not valid RON: {0}")]
    Ron(#[from] ron::de::Error),
    #[error("unsupported config format `{0}`, expected yaml, yml or ron")]
    UnsupportedFormat(String),
    #[error("invalid search parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// A search configuration as read from disk.
///
/// Leaving out the seed makes every run draw a fresh one from the OS.
#[derive(Clone, Deserialize, Serialize, Debug, PartialEq)]
pub struct SearchConfig {
    #[serde(default)]
    pub seed: Option<u64>,
    pub search: Params,
}

impl SearchConfig {
    pub fn new(seed: Option<u64>, search: Params) -> Self {
        SearchConfig { seed, search }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = serde_yaml::from_str(yaml)?;
        config.search.validate()?;
        Ok(config)
    }

    pub fn from_ron_str(ron: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = ron::de::from_str(ron)?;
        config.search.validate()?;
        Ok(config)
    }

    /// Loads a config, choosing the format by file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let content = fs::read_to_string(path)?;

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "ron" => Self::from_ron_str(&content),
            _ => Err(ConfigError::UnsupportedFormat(extension)),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
            .unwrap_or_else(|| (os_random_seed() >> 64) as u64)
    }

    /// Pins the seed, so the resolved config can be stored next to its results.
    pub fn to_fixed(&self) -> SearchConfig {
        SearchConfig {
            seed: Some(self.seed()),
            search: self.search,
        }
    }

    pub fn rng(&self) -> Rand64 {
        rng64(self.seed() as u128)
    }
}
