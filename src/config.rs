//! Runtime configuration
//!
//! Settings come from an optional JSON file, then environment variables
//! override individual fields:
//!
//! - `GTV_HASH_ALGORITHM`: `blake3` or `sha256`
//! - `GTV_POLL_ATTEMPTS`: confirmation polls before giving up
//! - `GTV_POLL_DELAY_MS`: delay between polls

use crate::confirm::PollConfig;
use crate::digest::HashAlgorithm;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const ENV_HASH_ALGORITHM: &str = "GTV_HASH_ALGORITHM";
pub const ENV_POLL_ATTEMPTS: &str = "GTV_POLL_ATTEMPTS";
pub const ENV_POLL_DELAY_MS: &str = "GTV_POLL_DELAY_MS";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Digest used for every tree hash
    pub hash_algorithm: HashAlgorithm,
    pub poll: PollConfig,
}

impl Config {
    /// Read a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Read a config file, falling back to defaults if it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Ok(())
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Override fields from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override fields from `lookup`, which maps a variable name to its value
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(algorithm) = lookup(ENV_HASH_ALGORITHM) {
            self.hash_algorithm = algorithm.parse()?;
        }
        if let Some(attempts) = lookup(ENV_POLL_ATTEMPTS) {
            self.poll.max_attempts = parse_number(ENV_POLL_ATTEMPTS, &attempts)?;
        }
        if let Some(delay) = lookup(ENV_POLL_DELAY_MS) {
            self.poll.delay_ms = parse_number(ENV_POLL_DELAY_MS, &delay)?;
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a non-negative integer, got {:?}", name, value)))
}
