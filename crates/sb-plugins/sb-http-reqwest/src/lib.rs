//! # sb-http-reqwest
//!
//! `reqwest` implementation of `Transport`. Used by the proxy to reach the
//! backend and by native clients to reach the proxy.

use async_trait::async_trait;
use sb_core::{ForumError, Method, OutboundRequest, RawResponse, Result, Transport};
use std::time::Duration;
use tracing::trace;

#[derive(Debug, Clone, Copy)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    config: TransportConfig,
}

impl ReqwestTransport {
    pub fn new(base_url: &str, config: TransportConfig) -> Result<Self> {
        let parsed = url::Url::parse(base_url)
            .map_err(|e| ForumError::Internal(format!("invalid base URL {base_url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ForumError::Internal(format!(
                "base URL {base_url:?} must be http or https"
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ForumError::Internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        })
    }

    fn classify(&self, err: reqwest::Error) -> ForumError {
        if err.is_timeout() {
            ForumError::Timeout {
                after: self.config.timeout,
            }
        } else {
            ForumError::Network {
                base_url: self.base_url.clone(),
                reason: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        };
        trace!(%url, %method, "sending");

        let mut builder = self.client.request(method, &url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.classify(e))?;
        Ok(RawResponse::new(status, body))
    }

    fn base_url(&self) -> String {
        self.base_url.clone()
    }
}
