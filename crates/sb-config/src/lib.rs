//! # sb-config
//!
//! Layered settings for the proxy server and the client crates.
//!
//! Precedence, lowest first: built-in defaults, an optional TOML file
//! (`schoolboard.toml` or `$SCHOOLBOARD_CONFIG`), the legacy `API_BASE_URL`
//! variable, then `SCHOOLBOARD__<SECTION>__<KEY>` variables.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "schoolboard.toml";
pub const CONFIG_PATH_VAR: &str = "SCHOOLBOARD_CONFIG";
pub const LEGACY_BASE_URL_VAR: &str = "API_BASE_URL";
const ENV_PREFIX: &str = "SCHOOLBOARD";
const ENV_BASE_URL_VAR: &str = "SCHOOLBOARD__UPSTREAM__BASE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub upstream: UpstreamSettings,
    pub proxy: ProxySettings,
    pub client: ClientSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// The REST backend the proxy forwards to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpstreamSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl UpstreamSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProxySettings {
    /// Empty allows every endpoint path.
    pub allowed_prefixes: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Through the same-origin `/api/proxy` route.
    Proxy,
    /// Straight to the upstream base URL.
    Direct,
}

/// How the client crates reach the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientSettings {
    pub route: RouteMode,
    pub proxy_origin: String,
    pub proxy_path: String,
    pub timeout_secs: u64,
}

impl Settings {
    /// Loads `.env`, the config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env");
        }
        let file = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut builder = base_builder()?
            .add_source(File::with_name(&file).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("proxy.allowed_prefixes")
                    .try_parsing(true),
            );

        if std::env::var(ENV_BASE_URL_VAR).is_err() {
            builder = builder
                .set_override_option("upstream.base_url", std::env::var(LEGACY_BASE_URL_VAR).ok())?;
        }

        Self::finish(builder)
    }

    /// Defaults plus one required TOML file; ignores the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let builder = base_builder()?.add_source(File::from(path).format(FileFormat::Toml));
        Self::finish(builder)
    }

    /// Built-in defaults only.
    pub fn defaults() -> Result<Self, ConfigError> {
        Self::finish(base_builder()?)
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_http_url("upstream.base_url", &self.upstream.base_url)?;
        if self.client.route == RouteMode::Proxy {
            validate_http_url("client.proxy_origin", &self.client.proxy_origin)?;
        }
        if self.upstream.timeout_secs == 0 || self.upstream.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid("upstream timeouts must be non-zero".into()));
        }
        if self.client.timeout_secs == 0 {
            return Err(ConfigError::Invalid("client.timeout_secs must be non-zero".into()));
        }
        if !self.client.proxy_path.starts_with('/') {
            return Err(ConfigError::Invalid("client.proxy_path must start with '/'".into()));
        }
        if let Some(bad) = self.proxy.allowed_prefixes.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::Invalid(format!(
                "proxy.allowed_prefixes entry {bad:?} must start with '/'"
            )));
        }
        Ok(())
    }

    /// Base URL the client transport should target for the configured route.
    pub fn client_base_url(&self) -> &str {
        match self.client.route {
            RouteMode::Proxy => &self.client.proxy_origin,
            RouteMode::Direct => &self.upstream.base_url,
        }
    }

    pub fn client_timeout(&self) -> Duration {
        Duration::from_secs(self.client.timeout_secs)
    }
}

fn base_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 3000)?
        .set_default("upstream.base_url", "http://localhost:8000")?
        .set_default("upstream.timeout_secs", 15)?
        .set_default("upstream.connect_timeout_secs", 5)?
        .set_default("proxy.allowed_prefixes", Vec::<String>::new())?
        .set_default("client.route", "proxy")?
        .set_default("client.proxy_origin", "http://127.0.0.1:3000")?
        .set_default("client.proxy_path", "/api/proxy")?
        .set_default("client.timeout_secs", 15)?)
}

fn validate_http_url(key: &str, raw: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ConfigError::Invalid(format!("{key} {raw:?} is not a valid URL: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid(format!(
            "{key} must use http or https, got {other:?}"
        ))),
    }
}
