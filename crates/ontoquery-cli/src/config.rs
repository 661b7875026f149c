//! CLI configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use ontoquery_core::TraversalConfig;
use serde::{Deserialize, Serialize};

/// Overrides the configuration directory
pub const HOME_ENV: &str = "ONTOQUERY_HOME";

/// Get default configuration directory
pub fn config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ontoquery")
}

pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Configuration for the CLI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dataset loaded when `--dataset` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_limit: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_total_limit: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout_ms: Option<u64>,
}

const KEYS: &[&str] = &[
    "dataset",
    "batch_size",
    "max_concurrency",
    "default_limit",
    "default_total_limit",
    "call_timeout_ms",
];

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> anyhow::Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid value for {}: {} (expected a number)", key, value))
}

impl Config {
    pub fn keys() -> &'static [&'static str] {
        KEYS
    }

    /// Load from the default path; a missing file yields the defaults
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_file_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Value of `key`, `None` when unset; unknown keys are an error
    pub fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(match key {
            "dataset" => self.dataset.as_ref().map(|p| p.display().to_string()),
            "batch_size" => self.batch_size.map(|v| v.to_string()),
            "max_concurrency" => self.max_concurrency.map(|v| v.to_string()),
            "default_limit" => self.default_limit.map(|v| v.to_string()),
            "default_total_limit" => self.default_total_limit.map(|v| v.to_string()),
            "call_timeout_ms" => self.call_timeout_ms.map(|v| v.to_string()),
            _ => anyhow::bail!("Unknown config key: {} (available: {})", key, KEYS.join(", ")),
        })
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "dataset" => self.dataset = Some(PathBuf::from(value)),
            "batch_size" => self.batch_size = Some(parse_number(key, value)?),
            "max_concurrency" => self.max_concurrency = Some(parse_number(key, value)?),
            "default_limit" => self.default_limit = Some(parse_number(key, value)?),
            "default_total_limit" => self.default_total_limit = Some(parse_number(key, value)?),
            "call_timeout_ms" => self.call_timeout_ms = Some(parse_number(key, value)?),
            _ => anyhow::bail!("Unknown config key: {} (available: {})", key, KEYS.join(", ")),
        }
        Ok(())
    }

    /// Clear `key`; returns whether it was set
    pub fn unset(&mut self, key: &str) -> anyhow::Result<bool> {
        let was_set = self.get(key)?.is_some();
        match key {
            "dataset" => self.dataset = None,
            "batch_size" => self.batch_size = None,
            "max_concurrency" => self.max_concurrency = None,
            "default_limit" => self.default_limit = None,
            "default_total_limit" => self.default_total_limit = None,
            _ => self.call_timeout_ms = None,
        }
        Ok(was_set)
    }

    /// Traversal settings with unset keys left at their defaults
    pub fn traversal(&self) -> TraversalConfig {
        let mut config = TraversalConfig::default();
        if let Some(v) = self.batch_size {
            config = config.with_batch_size(v);
        }
        if let Some(v) = self.max_concurrency {
            config = config.with_max_concurrency(v);
        }
        if let Some(v) = self.default_limit {
            config = config.with_default_limit(v);
        }
        if let Some(v) = self.default_total_limit {
            config = config.with_default_total_limit(v);
        }
        if let Some(ms) = self.call_timeout_ms {
            config = config.with_call_timeout(Duration::from_millis(ms));
        }
        config
    }
}
