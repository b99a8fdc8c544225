//! Configuration stored in ~/.chasedesk/config.json
//!
//! Every field has a serde default, so a missing file or a partial file both
//! yield a usable config. `CHASEDESK_CONFIG` points at an alternative file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_ENV: &str = "CHASEDESK_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Case collection file. Defaults to ~/.chasedesk/db.json.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Completion service settings (OpenAI-compatible chat completions).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CompletionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "openai/gpt-oss-120b".to_string()
}

fn default_api_key_env() -> String {
    "GROQ_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Agent cycle tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Chance per cycle that a client still hasn't signed and gets a reminder.
    #[serde(default = "default_half")]
    pub reminder_probability: f64,
    /// Chance per cycle that a provider acknowledges the LOA.
    #[serde(default = "default_half")]
    pub acknowledgement_probability: f64,
    /// SLA quoted in the provider acknowledgement entry.
    #[serde(default = "default_sla_days")]
    pub provider_sla_days: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            reminder_probability: default_half(),
            acknowledgement_probability: default_half(),
            provider_sla_days: default_sla_days(),
        }
    }
}

fn default_half() -> f64 {
    0.5
}

fn default_sla_days() -> u32 {
    15
}

/// Root of chasedesk state (~/.chasedesk).
pub fn state_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
    Ok(home.join(".chasedesk"))
}

/// Config file path, honouring `CHASEDESK_CONFIG`.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    match std::env::var(CONFIG_ENV) {
        Ok(p) if !p.trim().is_empty() => Ok(PathBuf::from(p)),
        _ => Ok(state_dir()?.join("config.json")),
    }
}

/// Load config from the default location. A missing file yields defaults.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Resolved case store path.
    pub fn resolved_store_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.store_path {
            Some(p) if !p.trim().is_empty() => Ok(PathBuf::from(p)),
            _ => Ok(state_dir()?.join("db.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = load_config_from(&dir.path().join("config.json")).expect("load");
        assert_eq!(config.completion.model, "openai/gpt-oss-120b");
        assert_eq!(config.completion.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.agent, AgentConfig::default());
        assert_eq!(config.agent.provider_sla_days, 15);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"storePath":"/tmp/cases.json","agent":{"reminderProbability":0.25}}"#,
        )
        .unwrap();

        let config = load_config_from(&path).expect("load");
        assert_eq!(
            config.resolved_store_path().unwrap(),
            PathBuf::from("/tmp/cases.json")
        );
        assert_eq!(config.agent.reminder_probability, 0.25);
        assert_eq!(config.agent.acknowledgement_probability, 0.5);
        assert_eq!(config.completion.timeout_secs, 60);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_timeout_never_zero() {
        let config = CompletionConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }
}
