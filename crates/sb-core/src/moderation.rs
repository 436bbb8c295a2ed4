//! Moderation state of a post or reply.
//!
//! The backend stores one `validated` bit, so "never reviewed" and
//! "blocked" share the `Pending` representation here.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentState {
    Pending,
    Validated,
}

impl ContentState {
    pub fn from_validated(validated: bool) -> Self {
        if validated {
            Self::Validated
        } else {
            Self::Pending
        }
    }

    pub fn is_validated(self) -> bool {
        self == Self::Validated
    }

    /// Both actions are idempotent.
    pub fn apply(self, action: ModerationAction) -> Self {
        match action {
            ModerationAction::Validate => Self::Validated,
            ModerationAction::Block => Self::Pending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationAction {
    Validate,
    Block,
}

impl ModerationAction {
    pub fn verb(self) -> &'static str {
        match self {
            Self::Validate => "validate",
            Self::Block => "block",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Validate => "validated",
            Self::Block => "blocked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModerationTarget {
    Post(i64),
    Reply(i64),
}

impl ModerationTarget {
    pub fn id(self) -> i64 {
        match self {
            Self::Post(id) | Self::Reply(id) => id,
        }
    }

    pub fn kind(self) -> &'static str {
        match self {
            Self::Post(_) => "post",
            Self::Reply(_) => "reply",
        }
    }

    /// Body key carrying the id, e.g. `post_id`.
    pub fn id_field(self) -> &'static str {
        match self {
            Self::Post(_) => "post_id",
            Self::Reply(_) => "reply_id",
        }
    }

    /// Backend endpoint for `action` on this target, e.g. `/block-reply`.
    pub fn endpoint(self, action: ModerationAction) -> String {
        format!("/{}-{}", action.verb(), self.kind())
    }
}

impl fmt::Display for ModerationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.kind(), self.id())
    }
}
