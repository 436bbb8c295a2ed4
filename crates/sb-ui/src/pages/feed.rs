//! Home and category feeds.
//!
//! Every load takes a generation number. A load that finishes after a newer
//! one has started is dropped, so a slow response for an old toggle state
//! never overwrites a fresher list.

use crate::navigation::{navigation, NavItem};
use crate::session::Session;
use crate::templates::{render, FeedTemplate};
use sb_client::{DataSource, ForumClient};
use sb_core::{present_posts, PostView, Result, Role, Viewer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub generation: u64,
    pub category: Option<String>,
    pub posts: Vec<PostView>,
    pub source: DataSource,
    pub show_pending_toggle: bool,
    pub show_pending: bool,
    pub role: Role,
}

pub struct FeedPage {
    client: Arc<ForumClient>,
    generation: AtomicU64,
    current: Mutex<Option<FeedSnapshot>>,
}

impl FeedPage {
    pub fn new(client: Arc<ForumClient>) -> Self {
        Self {
            client,
            generation: AtomicU64::new(0),
            current: Mutex::new(None),
        }
    }

    /// Fetches the feed. Returns `None` when a newer load superseded this one.
    pub async fn load(
        &self,
        session: Option<&Session>,
        category: Option<&str>,
        show_pending: bool,
    ) -> Result<Option<FeedSnapshot>> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let viewer = session
            .map(|s| s.viewer(show_pending))
            .unwrap_or_else(Viewer::guest);
        let requester = session.map(Session::requester);
        let pending_flag = requester.map(|_| viewer.show_pending());

        let list = match category {
            Some(category) => {
                self.client
                    .posts_by_category(category, requester, pending_flag)
                    .await?
            }
            None => self.client.post_list(requester, pending_flag).await?,
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "dropping superseded feed load");
            return Ok(None);
        }

        let snapshot = FeedSnapshot {
            generation,
            category: category.map(str::to_string),
            posts: present_posts(&viewer, &list.data),
            source: list.source,
            show_pending_toggle: viewer.toggle_available(),
            show_pending: viewer.show_pending(),
            role: viewer.role(),
        };
        if let Ok(mut current) = self.current.lock() {
            *current = Some(snapshot.clone());
        }
        Ok(Some(snapshot))
    }

    /// Latest applied snapshot.
    pub fn current(&self) -> Option<FeedSnapshot> {
        self.current.lock().ok().and_then(|c| c.clone())
    }

    pub fn render(&self, snapshot: &FeedSnapshot) -> Result<String> {
        let nav: Vec<NavItem> = navigation(snapshot.role);
        let title = snapshot.category.as_deref().unwrap_or("Home");
        render(&FeedTemplate {
            title,
            nav: &nav,
            posts: &snapshot.posts,
            show_pending_toggle: snapshot.show_pending_toggle,
            show_pending: snapshot.show_pending,
            degraded: snapshot.source != DataSource::Live,
        })
    }
}
