//! HTTP request shim.
//!
//! Every backend call goes through [`HttpShim::request`]: default JSON
//! headers, a hard timeout around the transport, optional rewriting through
//! the same-origin proxy, and normalization of non-2xx answers into
//! [`ForumError::Http`].

use crate::endpoint::encode_component;
use sb_config::{RouteMode, Settings};
use sb_core::{
    default_headers, merge_headers, ForumError, Method, OutboundRequest, Result, Transport,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_PROXY_PATH: &str = "/api/proxy";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRoute {
    /// The transport's base URL is the backend itself.
    Direct,
    /// The transport's base URL is the proxy origin; endpoints are wrapped
    /// as `<path>?endpoint=<encoded>`.
    Proxy { path: String },
}

impl Default for ApiRoute {
    fn default() -> Self {
        Self::Proxy {
            path: DEFAULT_PROXY_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShimConfig {
    pub route: ApiRoute,
    pub timeout: Duration,
}

impl Default for ShimConfig {
    fn default() -> Self {
        Self {
            route: ApiRoute::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ShimConfig {
    pub fn direct() -> Self {
        Self {
            route: ApiRoute::Direct,
            ..Self::default()
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let route = match settings.client.route {
            RouteMode::Direct => ApiRoute::Direct,
            RouteMode::Proxy => ApiRoute::Proxy {
                path: settings.client.proxy_path.clone(),
            },
        };
        Self {
            route,
            timeout: settings.client_timeout(),
        }
    }
}

/// Options bag for one request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::Post,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

pub struct HttpShim {
    transport: Arc<dyn Transport>,
    config: ShimConfig,
}

impl HttpShim {
    pub fn new(transport: Arc<dyn Transport>, config: ShimConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    /// Path actually sent to the transport for `endpoint`.
    pub fn resolve(&self, endpoint: &str) -> String {
        match &self.config.route {
            ApiRoute::Direct => endpoint.to_string(),
            ApiRoute::Proxy { path } => format!("{path}?endpoint={}", encode_component(endpoint)),
        }
    }

    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        let request = OutboundRequest {
            method: options.method,
            path: self.resolve(endpoint),
            headers: merge_headers(default_headers(), &options.headers),
            body: options.body,
        };
        let method = request.method;

        debug!(%method, endpoint, base_url = %self.transport.base_url(), "Making API request");
        let started = Instant::now();

        let response = match tokio::time::timeout(self.config.timeout, self.transport.send(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                error!(%method, endpoint, error = %err, "API request failed");
                return Err(err);
            }
            Err(_) => {
                warn!(%method, endpoint, timeout_ms = self.config.timeout.as_millis() as u64, "API request timed out");
                return Err(ForumError::Timeout {
                    after: self.config.timeout,
                });
            }
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        if !response.is_success() {
            let message = error_message(response.status, &response.body);
            error!(%method, endpoint, status = response.status, elapsed_ms, %message, "API error");
            return Err(ForumError::Http {
                status: response.status,
                message,
            });
        }

        let value: Value = serde_json::from_str(&response.body).map_err(|e| {
            ForumError::InvalidResponse(format!("{endpoint} returned non-JSON body: {e}"))
        })?;
        debug!(%method, endpoint, status = response.status, elapsed_ms, "API response");
        Ok(value)
    }
}

/// Message of a JSON error body (`message`, `error` or `detail`), or a
/// generic one naming the status when the body is not JSON.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error", "detail"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| format!("HTTP error! status: {status}"))
}
