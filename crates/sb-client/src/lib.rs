//! # sb-client
//!
//! Typed client for the forum backend: the request shim, the read fallback
//! policy and one method per REST endpoint on [`ForumClient`].

pub mod api;
pub mod client;
pub mod endpoint;
pub mod fallback;
pub mod shim;

pub use api::*;
pub use client::ForumClient;
pub use endpoint::Endpoint;
pub use fallback::{DataSource, Degradable, ReadFallback, ReadPolicy};
pub use shim::{ApiRoute, HttpShim, RequestOptions, ShimConfig};
