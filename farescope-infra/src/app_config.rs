use serde::Deserialize;
use std::env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid setting {0}: {1}")]
    Invalid(&'static str, String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub auth_url: String,
    pub flights_url: String,
    pub locations_url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_search_timeout")]
    pub search_timeout_seconds: u64,
    #[serde(default = "default_location_timeout")]
    pub location_timeout_seconds: u64,
    #[serde(default = "default_safety_margin")]
    pub token_safety_margin_seconds: u64,
    #[serde(default = "default_page_limit")]
    pub location_page_limit: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LookupConfig {
    #[serde(default = "default_debounce")]
    pub debounce_millis: u64,
    #[serde(default = "default_min_keyword")]
    pub min_keyword_length: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            debounce_millis: default_debounce(),
            min_keyword_length: default_min_keyword(),
        }
    }
}

fn default_search_timeout() -> u64 { 30 }
fn default_location_timeout() -> u64 { 10 }
fn default_safety_margin() -> u64 { 60 }
fn default_page_limit() -> u32 { 10 }
fn default_debounce() -> u64 { 300 }
fn default_min_keyword() -> usize { 2 }

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Checked-in defaults
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked local overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `FARESCOPE__UPSTREAM__CLIENT_ID=abc` sets `upstream.client_id`
            .add_source(config::Environment::with_prefix("FARESCOPE").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a config from a single TOML document, without files or environment.
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let upstream = &self.upstream;
        if upstream.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("upstream.client_id"));
        }
        if upstream.client_secret.trim().is_empty() {
            return Err(ConfigError::Missing("upstream.client_secret"));
        }
        if upstream.search_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("upstream.search_timeout_seconds", "must be positive".into()));
        }
        if upstream.location_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("upstream.location_timeout_seconds", "must be positive".into()));
        }
        if self.lookup.min_keyword_length == 0 {
            return Err(ConfigError::Invalid("lookup.min_keyword_length", "must be positive".into()));
        }
        Ok(())
    }
}
