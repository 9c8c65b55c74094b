//! Configuration management

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::warn;
use validator::Validate;

use crate::constants::{
    DEFAULT_COOKIE_NAME, DEFAULT_LEASE_KEY_PREFIX, DEFAULT_LOG_LEVEL,
    DEFAULT_REGENERATE_AFTER_SECS, DEFAULT_SESSION_DURATION_SECS, DEFAULT_SESSION_KEY_PREFIX,
    DEFAULT_SWEEP_INTERVAL_SECS,
};
use crate::error::AppError;

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    pub app: AppSettings,
    pub log: LogSettings,
    #[validate(nested)]
    pub redis: RedisSettings,
    #[validate(nested)]
    pub store: StoreSettings,
    #[validate(nested)]
    pub session: SessionSettings,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct AppSettings {
    pub env: String,
    pub host: String,
    pub port: u16,
    #[validate(length(min = 1))]
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
    /// `json` or `pretty`
    pub format: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: "json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct RedisSettings {
    #[validate(length(min = 1))]
    pub url: String,
    #[validate(range(min = 1))]
    pub max_connections: u32,
    pub key_prefix: String,
    pub lease_prefix: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone, Validate)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    #[validate(range(min = 1))]
    pub sweep_interval_secs: u64,
}

/// Session lifecycle settings. Durations are whole seconds.
#[derive(Debug, Deserialize, Clone, Validate)]
pub struct SessionSettings {
    #[validate(length(min = 1))]
    pub cookie_name: String,
    pub secure: bool,
    #[validate(range(min = 1))]
    pub session_duration_secs: u64,
    #[validate(range(min = 1))]
    pub regenerate_after_secs: u64,
    #[serde(default)]
    pub rotation_lease_ms: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            secure: false,
            session_duration_secs: DEFAULT_SESSION_DURATION_SECS,
            regenerate_after_secs: DEFAULT_REGENERATE_AFTER_SECS,
            rotation_lease_ms: None,
        }
    }
}

impl SessionSettings {
    /// Rotation can only happen before natural expiry when the threshold
    /// is not longer than the TTL.
    pub fn rotation_reachable(&self) -> bool {
        self.regenerate_after_secs <= self.session_duration_secs
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::default().separator("__").try_parsing(true))
            .build()?;
        let config: AppConfig = config.try_deserialize()?;
        config.validate_all()?;
        Ok(config)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.host", "127.0.0.1")?
            .set_default("app.port", 8080)?
            .set_default("app.name", "session-server")?
            .set_default("log.level", DEFAULT_LOG_LEVEL)?
            .set_default("log.format", "json")?
            .set_default("redis.url", "redis://127.0.0.1:6379")?
            .set_default("redis.max_connections", 16)?
            .set_default("redis.key_prefix", DEFAULT_SESSION_KEY_PREFIX)?
            .set_default("redis.lease_prefix", DEFAULT_LEASE_KEY_PREFIX)?
            .set_default("store.backend", "memory")?
            .set_default("store.sweep_interval_secs", DEFAULT_SWEEP_INTERVAL_SECS)?
            .set_default("session.cookie_name", DEFAULT_COOKIE_NAME)?
            .set_default("session.secure", false)?
            .set_default("session.session_duration_secs", DEFAULT_SESSION_DURATION_SECS)?
            .set_default("session.regenerate_after_secs", DEFAULT_REGENERATE_AFTER_SECS)
    }

    pub fn validate_all(&self) -> Result<(), AppError> {
        self.validate()?;
        if !self.session.rotation_reachable() {
            warn!(
                regenerate_after_secs = self.session.regenerate_after_secs,
                session_duration_secs = self.session.session_duration_secs,
                "regenerate_after exceeds session_duration; sessions will expire before rotation"
            );
        }
        Ok(())
    }
}
