//! Configuration for the Sentinel engine.
//!
//! Loads settings from /etc/sentinel/config.toml or uses defaults. All
//! thresholds are named fields so tests can override them directly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/sentinel/config.toml";

/// Remote resolver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Whether the remote tier is consulted at all.
    #[serde(default = "default_llm_enabled")]
    pub enabled: bool,

    /// OpenAI-compatible chat-completions endpoint.
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Model used for plan generation.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Environment variable holding the API key, if the endpoint needs one.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Round-trip timeout. The resolver must never hang the loop.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_enabled() -> bool {
    true
}

fn default_llm_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_llm_timeout() -> u64 {
    10
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_llm_enabled(),
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

/// Duplicate/rate-limit guard thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Window within which a repeated identical action is a duplicate.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f64,

    /// Near-duplicates tolerated before the global block trips.
    #[serde(default = "default_max_repeats")]
    pub max_repeats: u32,

    /// Length of the global block once tripped.
    #[serde(default = "default_block_secs")]
    pub block_secs: f64,

    /// Ledger ring-buffer capacity.
    #[serde(default = "default_history")]
    pub history: usize,
}

fn default_cooldown_secs() -> f64 {
    5.0
}

fn default_max_repeats() -> u32 {
    2
}

fn default_block_secs() -> f64 {
    30.0
}

fn default_history() -> usize {
    50
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            max_repeats: default_max_repeats(),
            block_secs: default_block_secs(),
            history: default_history(),
        }
    }
}

impl GuardConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_secs)
    }

    pub fn block_duration(&self) -> Duration {
        Duration::from_secs_f64(self.block_secs)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentinelConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub guard: GuardConfig,
}

impl SentinelConfig {
    /// Load from a path, falling back to defaults when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from the default location.
    pub fn load_default() -> Result<Self> {
        Self::load(Path::new(CONFIG_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let config = SentinelConfig::default();
        assert!(config.llm.enabled);
        assert_eq!(config.guard.max_repeats, 2);
        assert_eq!(config.guard.cooldown(), Duration::from_secs(5));
        assert_eq!(config.guard.history, 50);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = SentinelConfig::load(Path::new("/nonexistent/sentinel.toml")).unwrap();
        assert_eq!(config.guard.max_repeats, GuardConfig::default().max_repeats);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[guard]\ncooldown_secs = 1.5").unwrap();

        let config = SentinelConfig::load(file.path()).unwrap();
        assert_eq!(config.guard.cooldown_secs, 1.5);
        assert_eq!(config.guard.max_repeats, 2);
        assert!(config.llm.enabled);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "guard = \"not a table\"").unwrap();
        assert!(SentinelConfig::load(file.path()).is_err());
    }
}
