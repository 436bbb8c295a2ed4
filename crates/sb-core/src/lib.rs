//! schoolboard/crates/sb-core/src/lib.rs
//!
//! Domain models, the visibility policy and the port traits shared by the
//! schoolboard client crates and the proxy.

pub mod envelope;
pub mod error;
pub mod http;
pub mod language;
pub mod models;
pub mod moderation;
pub mod traits;
pub mod visibility;

// Re-exporting for easier access in other crates
pub use envelope::*;
pub use error::*;
pub use http::*;
pub use models::*;
pub use moderation::*;
pub use traits::*;
pub use visibility::*;
