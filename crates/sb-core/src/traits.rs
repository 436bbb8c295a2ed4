//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the client crates
//! or the proxy binary.

use crate::error::Result;
use crate::http::{OutboundRequest, RawResponse};
use async_trait::async_trait;

#[cfg(feature = "testing")]
use mockall::automock;

/// Moves one request to a base URL and back.
///
/// Implementations return `Ok` for every HTTP status and only fail for
/// transport problems (`Network`, `Timeout`).
#[cfg_attr(feature = "testing", automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<RawResponse>;

    /// Base URL requests are resolved against; used in error messages.
    fn base_url(&self) -> String;
}

/// Key/value persistence for the client session (the local-storage analog).
/// Reads are synchronous, like the browser API it stands in for.
#[cfg_attr(feature = "testing", automock)]
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Human confirmation and blocking alerts around mutations.
#[cfg_attr(feature = "testing", automock)]
pub trait Prompt: Send + Sync {
    /// Returns true when the user accepts.
    fn confirm(&self, message: &str) -> bool;
    fn alert(&self, message: &str);
}

/// Accepts every confirmation and drops alerts. Suitable for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Prompt for AutoConfirm {
    fn confirm(&self, _message: &str) -> bool {
        true
    }

    fn alert(&self, _message: &str) {}
}
