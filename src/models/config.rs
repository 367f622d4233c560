//! Panel configuration.
//!
//! Layered from `config/default`, an optional `config/<APP_ENV>` profile and
//! `APP_*` variables, with `API_PORT`/`HTTP_PORT` applied last. The
//! [`DegradationPolicy`] decides what startup does without a database.

use std::env;
use std::path::PathBuf;

use config::{Config, ConfigError, Value};
use serde::{Deserialize, Serialize};

/// Deployment environment. Anything other than `development` is treated as
/// production.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    #[serde(other)]
    Production,
}

/// What happens when the database cannot be reached at startup.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DegradationPolicy {
    /// Bind only the fallback console and keep the process alive.
    #[default]
    ServeFallback,
    /// Bind nothing and exit with a non-zero status.
    Abort,
}

/// How much of the configuration is handed to rendered views.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigExposure {
    #[default]
    Full,
    Redacted,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
/// Process-wide configuration, loaded once and passed to every component.
pub struct ServerConfig {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default = "default_address")]
    pub address: String,
    pub api_port: u16,
    pub http_port: u16,
    pub theme: String,
    pub database_url: String,
    #[serde(default)]
    pub expose_config: ConfigExposure,
    #[serde(default)]
    pub on_database_failure: DegradationPolicy,
    #[serde(default = "default_views_dir")]
    pub views_dir: PathBuf,
    #[serde(default = "default_fallback_dir")]
    pub fallback_dir: PathBuf,
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,
    #[serde(default)]
    pub workers: Option<usize>,
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_views_dir() -> PathBuf {
    PathBuf::from("www/views")
}

fn default_fallback_dir() -> PathBuf {
    PathBuf::from("www/fallback")
}

fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl ServerConfig {
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    /// Serializes the configuration for view rendering, honoring
    /// [`ConfigExposure`].
    pub fn render_snapshot(&self) -> serde_json::Value {
        let mut snapshot = serde_json::to_value(self).unwrap_or_default();
        if self.expose_config == ConfigExposure::Redacted {
            if let Some(fields) = snapshot.as_object_mut() {
                fields.remove("database_url");
            }
        }
        snapshot
    }
}

/// Port overrides taken from `API_PORT` and `HTTP_PORT`.
#[derive(Clone, Debug, Default)]
pub struct PortOverrides {
    pub api_port: Option<String>,
    pub http_port: Option<String>,
}

impl PortOverrides {
    pub fn from_env() -> Self {
        Self {
            api_port: env::var("API_PORT").ok(),
            http_port: env::var("HTTP_PORT").ok(),
        }
    }
}

fn parse_port(name: &str, value: Option<&str>) -> Result<Option<i64>, ConfigError> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<u16>()
                .map(i64::from)
                .map_err(|e| ConfigError::Message(format!("{name} must be a port number: {e}")))
        })
        .transpose()
}

/// Alternative spellings of a field. A field's own key always wins over its
/// aliases.
const KEY_ALIASES: [(&str, &[&str]); 3] = [
    ("api_port", &["apiPort", "apiport"]),
    ("http_port", &["httpPort", "httpport"]),
    ("database_url", &["mongo.address", "mongo._address"]),
];

/// Loads `<config_dir>/default`, the optional `<config_dir>/<app_env>`
/// profile and `APP_*` environment variables, then applies port overrides.
pub fn load_server_config(
    config_dir: &str,
    app_env: &str,
    overrides: &PortOverrides,
) -> Result<ServerConfig, ConfigError> {
    let api_port = parse_port("API_PORT", overrides.api_port.as_deref())?;
    let http_port = parse_port("HTTP_PORT", overrides.http_port.as_deref())?;

    let layered = Config::builder()
        .add_source(config::File::with_name(&format!("{config_dir}/default")))
        .add_source(config::File::with_name(&format!("{config_dir}/{app_env}")).required(false))
        .add_source(config::Environment::with_prefix("APP"));

    let sources = layered.clone().build()?;
    let mut builder = layered;
    for (field, aliases) in KEY_ALIASES {
        if let Some(value) = aliases.iter().find_map(|key| sources.get::<Value>(key).ok()) {
            builder = builder.set_default(field, value)?;
        }
    }

    builder
        .set_override_option("api_port", api_port)?
        .set_override_option("http_port", http_port)?
        .build()?
        .try_deserialize::<ServerConfig>()
}
