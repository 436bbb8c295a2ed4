use crate::navigation::NavItem;
use askama::Template;
use sb_core::{ForumError, PostView, ReplyView, Result};

#[derive(Template)]
#[template(path = "feed.html")]
pub struct FeedTemplate<'a> {
    pub title: &'a str,
    pub nav: &'a [NavItem],
    pub posts: &'a [PostView],
    pub show_pending_toggle: bool,
    pub show_pending: bool,
    pub degraded: bool,
}

#[derive(Template)]
#[template(path = "post.html")]
pub struct PostTemplate<'a> {
    pub title: &'a str,
    pub nav: &'a [NavItem],
    pub post: &'a PostView,
    pub can_moderate: bool,
}

#[derive(Template)]
#[template(path = "pending.html")]
pub struct PendingTemplate<'a> {
    pub title: &'a str,
    pub nav: &'a [NavItem],
    pub posts: &'a [PostView],
    pub replies: &'a [ReplyView],
    pub degraded: bool,
}

/// Renders `template`, folding askama errors into the crate error.
pub fn render(template: &impl Template) -> Result<String> {
    template
        .render()
        .map_err(|e| ForumError::Internal(format!("template rendering failed: {e}")))
}
