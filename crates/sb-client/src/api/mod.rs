//! One method per backend endpoint, grouped by resource.

pub mod auth;
pub mod classes;
pub mod moderation;
pub mod posts;
pub mod replies;
pub mod students;

pub use auth::{LoginKind, SignUp};
pub use classes::ClassListing;
pub use moderation::PendingContent;
pub use posts::{PostDetail, UploadAck};
