//! Configuration management for focus-coach.
//!
//! Tunables come from YAML files in standard locations; the three API secrets
//! come from the process environment and are required at startup.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingSecret(&'static str),
}

/// API credentials, sourced from the environment once at startup.
///
/// Never logged: the Debug impl redacts every field.
#[derive(Clone)]
pub struct Secrets {
    pub openai_api_key: String,
    pub playht_api_key: String,
    pub playht_user_id: String,
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            playht_api_key: require_env("PLAYHT_API_KEY")?,
            playht_user_id: require_env("PLAYHT_USER_ID")?,
        })
    }
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_api_key", &"[REDACTED]")
            .field("playht_api_key", &"[REDACTED]")
            .field("playht_user_id", &"[REDACTED]")
            .finish()
    }
}

fn require_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingSecret(name)),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CoachConfig {
    pub model: String,
    pub api_base: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub history_size: usize,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            api_base: "https://api.openai.com/v1".into(),
            max_tokens: 150,
            temperature: 0.7,
            history_size: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub endpoint: String,
    pub voice: String,
    pub voice_guidance: f64,
    pub text_guidance: f64,
    pub speed: f64,
    pub sample_rate: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.play.ht/api/v2/tts/stream".into(),
            voice: "s3://voice-cloning-zero-shot/cebaa3cf-d1d5-4625-ba20-03dcca3b379f/sargesaad/manifest.json".into(),
            voice_guidance: 6.0,
            text_guidance: 0.0,
            speed: 1.2,
            sample_rate: 20000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub poll_interval_ms: u64,
    pub error_backoff_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            error_backoff_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub coach: CoachConfig,
    pub speech: SpeechConfig,
    pub watcher: WatcherConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./focus-coach.yaml
    /// 2. ~/.config/focus-coach/config.yaml
    /// 3. /etc/focus-coach/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("focus-coach.yaml")),
                dirs::home_dir().map(|h| h.join(".config/focus-coach/config.yaml")),
                Some(PathBuf::from("/etc/focus-coach/config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match serde_yml::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }
}
