//! # Visibility policy
//!
//! Pure functions of viewer role and content flags. Decides which posts and
//! replies a viewer sees and how their author is labelled.
//!
//! Two properties hold together:
//! * an ordinary viewer can never recover the author of an anonymous item;
//!   the presented views do not carry the raw id at all;
//! * staff always see the author, with an explicit `(Anon)` marker.

use crate::models::{Post, Reply, Role};
use crate::moderation::ContentState;
use std::fmt;

/// Label the backend substitutes for masked authors.
pub const ANONYMOUS: &str = "Anonymous";

/// The flags the policy looks at.
pub trait Moderated {
    fn author_id(&self) -> &str;
    fn is_anonymous(&self) -> bool;
    fn is_validated(&self) -> bool;
}

impl Moderated for Post {
    fn author_id(&self) -> &str {
        &self.author_id
    }
    fn is_anonymous(&self) -> bool {
        self.anonymous
    }
    fn is_validated(&self) -> bool {
        self.validated
    }
}

impl Moderated for Reply {
    fn author_id(&self) -> &str {
        &self.author_id
    }
    fn is_anonymous(&self) -> bool {
        self.anonymous
    }
    fn is_validated(&self) -> bool {
        self.validated
    }
}

/// Who is looking. The pending toggle only sticks for staff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    user_id: Option<String>,
    role: Role,
    show_pending: bool,
}

impl Viewer {
    pub fn new(user_id: Option<String>, role: Role) -> Self {
        Self {
            user_id,
            role,
            show_pending: false,
        }
    }

    /// Logged-out visitor.
    pub fn guest() -> Self {
        Self::new(None, Role::Student)
    }

    /// Requests for a student are dropped.
    pub fn with_show_pending(mut self, enabled: bool) -> Self {
        self.show_pending = enabled && self.role.is_staff();
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Whether the "show pending" control exists at all for this viewer.
    pub fn toggle_available(&self) -> bool {
        self.role.is_staff()
    }

    pub fn show_pending(&self) -> bool {
        self.show_pending
    }

    pub fn is_author(&self, author_id: &str) -> bool {
        self.user_id.as_deref() == Some(author_id)
    }
}

/// How an author is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorLabel {
    Named(String),
    Anonymous,
    /// Staff-only view of an anonymous author.
    Disclosed(String),
}

impl fmt::Display for AuthorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(id) => f.write_str(id),
            Self::Anonymous => f.write_str(ANONYMOUS),
            Self::Disclosed(id) => write!(f, "{id} (Anon)"),
        }
    }
}

pub fn is_visible(viewer: &Viewer, item: &impl Moderated) -> bool {
    item.is_validated() || viewer.is_author(item.author_id()) || viewer.show_pending()
}

pub fn author_label(viewer: &Viewer, item: &impl Moderated) -> AuthorLabel {
    let author = item.author_id();
    if !item.is_anonymous() {
        return AuthorLabel::Named(author.to_string());
    }
    // A backend that already masked the id leaves nothing to disclose.
    if viewer.role().is_staff() && author != ANONYMOUS {
        AuthorLabel::Disclosed(author.to_string())
    } else {
        AuthorLabel::Anonymous
    }
}

/// A reply ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyView {
    pub reply_id: i64,
    pub parent_post_id: i64,
    pub content: String,
    pub upload_time: String,
    pub author: AuthorLabel,
    pub pending: bool,
}

/// A post ready for rendering, with its visible replies.
#[derive(Debug, Clone, PartialEq)]
pub struct PostView {
    pub post_id: i64,
    pub title: String,
    pub content: String,
    pub category: String,
    pub upload_time: String,
    pub author: AuthorLabel,
    pub pending: bool,
    pub replies: Vec<ReplyView>,
}

pub fn present_reply(viewer: &Viewer, reply: &Reply) -> ReplyView {
    ReplyView {
        reply_id: reply.reply_id,
        parent_post_id: reply.parent_post_id,
        content: reply.content.clone(),
        upload_time: reply.upload_time.clone(),
        author: author_label(viewer, reply),
        pending: !reply.validated,
    }
}

pub fn present_replies(viewer: &Viewer, replies: &[Reply]) -> Vec<ReplyView> {
    present_replies_owned(viewer, replies, |_| false)
}

/// Like [`present_replies`], with `owned` vouching for replies the viewer
/// wrote whose author the backend has already masked.
pub fn present_replies_owned(
    viewer: &Viewer,
    replies: &[Reply],
    owned: impl Fn(&Reply) -> bool,
) -> Vec<ReplyView> {
    replies
        .iter()
        .filter(|reply| is_visible(viewer, *reply) || owned(reply))
        .map(|reply| present_reply(viewer, reply))
        .collect()
}

pub fn present_post(viewer: &Viewer, post: &Post) -> PostView {
    present_post_owned(viewer, post, |_| false)
}

/// Presents `post` itself unfiltered, for callers whose backend already
/// decided the viewer may see it. Replies still go through the policy.
pub fn present_post_owned(
    viewer: &Viewer,
    post: &Post,
    owned: impl Fn(&Reply) -> bool,
) -> PostView {
    PostView {
        post_id: post.post_id,
        title: post.title.clone(),
        content: post.content.clone(),
        category: post.category.clone(),
        upload_time: post.upload_time.clone(),
        author: author_label(viewer, post),
        pending: !post.validated,
        replies: present_replies_owned(viewer, &post.replies, owned),
    }
}

impl PostView {
    pub fn state(&self) -> ContentState {
        ContentState::from_validated(!self.pending)
    }
}

impl ReplyView {
    pub fn state(&self) -> ContentState {
        ContentState::from_validated(!self.pending)
    }
}

pub fn present_posts(viewer: &Viewer, posts: &[Post]) -> Vec<PostView> {
    posts
        .iter()
        .filter(|post| is_visible(viewer, *post))
        .map(|post| present_post(viewer, post))
        .collect()
}
