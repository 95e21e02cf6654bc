//! Configuration for the Portrait bot
//!
//! Settings come from a TOML file, then environment variables override the
//! secrets and the few values operators commonly change per deployment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Result, error::ConfigError};

pub use crate::db::DatabaseConfig;

pub const TOKEN_ENV: &str = "TELEGRAM_TOKEN";
pub const MODEL_ENV: &str = "PORTRAIT_MODEL";
pub const DB_PATH_ENV: &str = "PORTRAIT_DB_PATH";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortraitConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Messaging transport settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token; usually supplied through `TELEGRAM_TOKEN`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    /// Base of referral links; derived from the bot username when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_base: Option<String>,

    /// Long-poll timeout for getUpdates
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_poll_timeout() -> u64 {
    30
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            link_base: None,
            poll_timeout_secs: default_poll_timeout(),
            api_url: default_api_url(),
        }
    }
}

impl TelegramConfig {
    /// The token, or a configuration error naming where to set it
    pub fn require_token(&self) -> Result<&str> {
        if self.token.trim().is_empty() {
            return Err(CoreError::missing_setting("telegram.token", TOKEN_ENV));
        }
        Ok(&self.token)
    }
}

/// Text-generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Give up on a portrait after this long; 0 waits forever
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_temperature() -> f64 {
    0.8
}

fn default_max_tokens() -> u32 {
    500
}

fn default_timeout() -> u64 {
    120
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ModelConfig {
    /// The generation deadline, if any
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl PortraitConfig {
    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(token) = lookup(TOKEN_ENV) {
            self.telegram.token = token;
        }
        if let Some(model) = lookup(MODEL_ENV) {
            self.model.model = model;
        }
        if let Some(path) = lookup(DB_PATH_ENV) {
            self.database = DatabaseConfig::Embedded { path };
        }
    }
}

/// Load configuration from a TOML file
pub async fn load_config(path: &Path) -> Result<PortraitConfig> {
    let content =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CoreError::ConfigurationError {
                config_path: path.display().to_string(),
                field: "file".to_string(),
                expected: "readable TOML file".to_string(),
                cause: ConfigError::Io(e.to_string()),
            })?;

    toml::from_str(&content).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "content".to_string(),
        expected: "valid TOML configuration".to_string(),
        cause: ConfigError::TomlParse(e.to_string()),
    })
}

/// Save configuration to a TOML file
pub async fn save_config(config: &PortraitConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::ConfigurationError {
                    config_path: parent.display().to_string(),
                    field: "directory".to_string(),
                    expected: "writable directory".to_string(),
                    cause: ConfigError::Io(e.to_string()),
                })?;
        }
    }

    let content = toml::to_string_pretty(config).map_err(|e| CoreError::ConfigurationError {
        config_path: path.display().to_string(),
        field: "serialization".to_string(),
        expected: "serializable config structure".to_string(),
        cause: ConfigError::TomlSerialize(e.to_string()),
    })?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| CoreError::ConfigurationError {
            config_path: path.display().to_string(),
            field: "file".to_string(),
            expected: "writable file location".to_string(),
            cause: ConfigError::Io(e.to_string()),
        })
}

/// Standard configuration file locations, in priority order
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("portrait.toml")];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("portrait").join("config.toml"));
    }

    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".portrait").join("config.toml"));
    }

    paths
}

/// Load configuration from standard locations, falling back to defaults
pub async fn load_config_from_standard_locations() -> Result<PortraitConfig> {
    for path in config_paths() {
        if path.exists() {
            tracing::info!("Loading config from {}", path.display());
            return load_config(&path).await;
        }
    }

    tracing::info!("No config file found, using defaults");
    Ok(PortraitConfig::default())
}
