use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::{defaults, envconfig::EnvConfig, validate};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub auth: Option<AuthConfig>,
    pub seed: SeedConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        <Self as EnvConfig>::from_env()
    }

    /// The signing secret is mandatory; a missing `auth` section is fatal.
    pub fn require_auth(&self) -> Result<&AuthConfig> {
        self.auth
            .as_ref()
            .context("APP_AUTH__SECRET_KEY must be set before the server can start")
    }
}

impl EnvConfig for AppConfig {
    fn validate(&self) -> Result<()> {
        validate::validate(self)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneralConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            host: defaults::DEFAULT_HOST.to_string(),
            port: defaults::DEFAULT_PORT as u16,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub rust_log: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            rust_log: defaults::DEFAULT_RUST_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_idle: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: defaults::DEFAULT_DATABASE_URL.to_string(),
            max_connections: defaults::DEFAULT_DB_MAX_CONNECTIONS as u32,
            min_idle: defaults::DEFAULT_DB_MIN_IDLE as u32,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub secret_key: String,
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
    #[serde(default = "default_remember_ttl_secs")]
    pub remember_ttl_secs: u64,
    #[serde(default = "default_reset_ttl_secs")]
    pub reset_ttl_secs: u64,
    #[serde(default = "default_reset_base_url")]
    pub reset_base_url: String,
}

impl AuthConfig {
    pub fn with_secret(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            session_ttl_secs: default_session_ttl_secs(),
            remember_ttl_secs: default_remember_ttl_secs(),
            reset_ttl_secs: default_reset_ttl_secs(),
            reset_base_url: default_reset_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeedConfig {
    pub demo_data: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            demo_data: defaults::DEFAULT_SEED_DEMO_DATA,
        }
    }
}

fn default_session_ttl_secs() -> u64 {
    defaults::DEFAULT_SESSION_TTL_SECS as u64
}

fn default_remember_ttl_secs() -> u64 {
    defaults::DEFAULT_REMEMBER_TTL_SECS as u64
}

fn default_reset_ttl_secs() -> u64 {
    defaults::DEFAULT_RESET_TTL_SECS as u64
}

fn default_reset_base_url() -> String {
    defaults::DEFAULT_RESET_BASE_URL.to_string()
}
