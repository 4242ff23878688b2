//! Configuration management for the emulator.
//!
//! Values are layered with the `config` crate: built-in defaults, an
//! optional YAML file, `EMULATOR__SECTION__KEY` environment variables and
//! finally the flat `MINUTE_LIMIT`, `DAILY_LIMIT` and `BASE_URL` variables
//! understood by earlier deployments of the emulator.

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::ratelimit::Limits;

/// Main configuration for the emulator service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmulatorConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Upstream Notify API configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Mock handling configuration
    #[serde(default)]
    pub mock: MockConfig,
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind the server to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind the server to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Reload limits when the config file changes
    #[serde(default)]
    pub reload: bool,

    /// How often the config file is polled when reload is enabled
    #[serde(default = "default_reload_interval")]
    pub reload_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            reload: false,
            reload_interval_secs: default_reload_interval(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_reload_interval() -> u64 {
    2
}

/// Admission caps applied per caller identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Requests admitted per rolling 60 seconds
    #[serde(default = "default_minute_limit")]
    pub minute_limit: u64,

    /// Requests admitted per UTC calendar day
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            minute_limit: default_minute_limit(),
            daily_limit: default_daily_limit(),
        }
    }
}

// https://docs.notifications.service.gov.uk/rest-api.html#rate-limits
fn default_minute_limit() -> u64 {
    3_000
}

// https://docs.notifications.service.gov.uk/rest-api.html#daily-limits
fn default_daily_limit() -> u64 {
    250_000
}

impl From<&LimitsConfig> for Limits {
    fn from(config: &LimitsConfig) -> Self {
        Limits {
            per_minute: config.minute_limit,
            per_day: config.daily_limit,
        }
    }
}

/// Upstream Notify API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the real API, also used in mock response URIs
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for forwarded requests in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

// https://docs.notifications.service.gov.uk/rest-api.html#base-url
fn default_base_url() -> String {
    "https://api.notifications.service.gov.uk".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl UpstreamConfig {
    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Get the forwarding timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Mock handling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockConfig {
    /// Substring of `email_address` that marks a request for mocking
    #[serde(default = "default_test_marker")]
    pub test_marker: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            test_marker: default_test_marker(),
        }
    }
}

fn default_test_marker() -> String {
    "test-ratelimit".to_string()
}

impl EmulatorConfig {
    /// Load configuration from defaults, an optional file and the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Load configuration, resolving the flat legacy variables through `env`.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml));
        }

        let config = builder
            .add_source(Environment::with_prefix("EMULATOR").separator("__"))
            .set_override_option("limits.minute_limit", env("MINUTE_LIMIT"))?
            .set_override_option("limits.daily_limit", env("DAILY_LIMIT"))?
            .set_override_option("upstream.base_url", env("BASE_URL"))?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Address the HTTP server binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
