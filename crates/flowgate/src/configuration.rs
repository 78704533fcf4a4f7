use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 30.0;

/// The agents YAML document (`FLOWGATE_CONFIG_PATH`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Configuration {
    pub version: Option<String>,
    pub agents: Vec<AgentConfig>,
}

/// One configured agent: a route segment mapped to a flow run endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub route: String,
    pub name: String,
    pub url: String,
    pub timeout_seconds: Option<f64>,
}

impl AgentConfig {
    /// Per-agent timeout, falling back to the process default. Non-positive
    /// or non-finite overrides fall back too rather than aborting startup.
    pub fn timeout(&self, default: Duration) -> Duration {
        match self.timeout_seconds {
            Some(secs) if secs.is_finite() && secs > 0.0 => Duration::from_secs_f64(secs),
            _ => default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Environment-derived settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub environment: Environment,
    pub api_key: String,
    pub default_timeout: Duration,
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("LANGFLOW_API_KEY environment variable is required")]
    MissingApiKey,
    #[error("DEFAULT_REQUEST_TIMEOUT must be a positive number of seconds, got '{0}'")]
    BadTimeout(String),
}

impl Settings {
    /// Read settings from the environment. A missing or empty API key is an
    /// error: the process must refuse to start half-configured.
    pub fn from_env() -> Result<Self, SettingsError> {
        let api_key = env::var("LANGFLOW_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(SettingsError::MissingApiKey)?;

        let default_timeout = match env::var("DEFAULT_REQUEST_TIMEOUT") {
            Ok(raw) => {
                let secs: f64 = raw
                    .parse()
                    .map_err(|_| SettingsError::BadTimeout(raw.clone()))?;
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(SettingsError::BadTimeout(raw));
                }
                Duration::from_secs_f64(secs)
            }
            Err(_) => Duration::from_secs_f64(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let environment =
            parse_environment(&env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()));

        Ok(Self {
            environment,
            api_key,
            default_timeout,
            log_level,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Masked form of the API key, safe for development diagnostics. The
    /// full key must never be logged.
    pub fn masked_api_key(&self) -> String {
        mask_key(&self.api_key)
    }
}

pub fn parse_environment(raw: &str) -> Environment {
    match raw.to_ascii_lowercase().as_str() {
        "production" | "prod" => Environment::Production,
        _ => Environment::Development,
    }
}

/// Keep the first 8 and last 4 characters, enough to tell keys apart
/// without revealing one. Short or non-ASCII keys collapse to `***`.
pub fn mask_key(key: &str) -> String {
    if key.len() > 12 && key.is_ascii() {
        format!("{}...{}", &key[..8], &key[key.len() - 4..])
    } else {
        "***".to_string()
    }
}
