//! Configuration management for docchat.
//!
//! Configuration is loaded from an optional JSON file at
//! `~/.docchat/config.json`, then overridden by environment variables.
//!
//! # Environment Variable Mapping
//!
//! - `BOT_TOKEN` → telegram.bot_token
//! - `GROQ_API_KEY` → completion.api_key
//! - `PORT` → server.port
//! - `DOCCHAT_MODEL` → completion.model
//! - `DOCCHAT_LOG_LEVEL` → observability.log_level
//! - `DOCCHAT_LOG_FORMAT` → observability.log_format

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".docchat"),
        |dirs| dirs.home_dir().join(".docchat"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Server Configuration
// ============================================================================

/// HTTP server configuration (liveness probe endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP listener.
    #[serde(default = "default_bind_address")]
    pub bind: String,

    /// Port for the HTTP listener.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind_address(),
            port: default_port(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".into()
}

const fn default_port() -> u16 {
    8080
}

// ============================================================================
// Telegram Configuration
// ============================================================================

/// Telegram bot configuration.
///
/// The bot token comes from the `BOT_TOKEN` environment variable unless set
/// in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token.
    #[serde(default)]
    pub bot_token: String,

    /// Long-poll timeout in seconds for `getUpdates`.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

const fn default_poll_timeout_secs() -> u64 {
    30
}

// ============================================================================
// Completion Configuration
// ============================================================================

/// Completion API (Groq) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// API key for the completion endpoint.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_completion_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Nucleus sampling parameter.
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Maximum completion tokens per request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: i64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_completion_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_completion_base_url() -> String {
    "https://api.groq.com/openai".into()
}

fn default_model() -> String {
    "mistral-saba-24b".into()
}

const fn default_temperature() -> f64 {
    0.5
}

const fn default_top_p() -> f64 {
    1.0
}

const fn default_max_tokens() -> i64 {
    1024
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format: "json" or "pretty".
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}

fn default_log_format() -> String {
    "pretty".into()
}

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration for the docchat service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,

    #[serde(default)]
    pub completion: CompletionConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default file path and environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from a specific file path, then apply environment
    /// overrides. A missing file is not an error; defaults are used.
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Read configuration from a file without environment overrides.
    pub fn from_file(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Apply environment variable overrides on top of file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            self.completion.api_key = key;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(model) = std::env::var("DOCCHAT_MODEL") {
            self.completion.model = model;
        }
        if let Ok(level) = std::env::var("DOCCHAT_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("DOCCHAT_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }

    /// Validate that required credentials are present.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.is_empty() {
            bail!("Telegram bot token not configured (set BOT_TOKEN)");
        }
        if self.completion.api_key.is_empty() {
            bail!("Completion API key not configured (set GROQ_API_KEY)");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.completion.model, "mistral-saba-24b");
        assert_eq!(config.completion.base_url, "https://api.groq.com/openai");
        assert_eq!(config.completion.max_tokens, 1024);
        assert_eq!(config.telegram.poll_timeout_secs, 30);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let config = Config::from_file(PathBuf::from("/nonexistent/docchat.json")).unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"server": {{"port": 9000}}, "completion": {{"model": "llama-3.1-70b-versatile"}}}}"#
        )
        .unwrap();

        let config = Config::from_file(file.path().to_path_buf()).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.completion.model, "llama-3.1-70b-versatile");
        // Untouched sections keep their defaults
        assert_eq!(config.completion.temperature, 0.5);
    }

    #[test]
    fn validate_requires_credentials() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.telegram.bot_token = "123:ABC".into();
        config.completion.api_key = "gsk_test".into();
        assert!(config.validate().is_ok());
    }
}
