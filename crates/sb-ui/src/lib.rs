//! # sb-ui
//!
//! Page controllers for the forum: session and role derivation, the
//! moderation workflow, navigation and the askama templates they render.

pub mod moderation;
pub mod navigation;
pub mod pages;
pub mod session;
pub mod templates;

pub use moderation::ModerationWorkflow;
pub use navigation::{navigation, NavItem};
pub use session::{Access, Redirect, Session, SessionProvider, SessionState};

/// Result of a confirmed action. `Cancelled` means the user declined and
/// nothing was sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Done(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Done(value) => Outcome::Done(f(value)),
            Self::Cancelled => Outcome::Cancelled,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
