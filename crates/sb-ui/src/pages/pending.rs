use crate::moderation::ModerationWorkflow;
use crate::navigation::navigation;
use crate::session::Session;
use crate::templates::{render, PendingTemplate};
use crate::Outcome;
use sb_client::{Degradable, ForumClient, PendingContent};
use sb_core::{present_posts, present_replies, ModerationTarget, PostView, Prompt, ReplyView, Result, Role};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct PendingSnapshot {
    pub posts: Vec<PostView>,
    pub replies: Vec<ReplyView>,
    pub role: Role,
    /// Built from a cached or empty queue after a failed refresh.
    pub degraded: bool,
}

impl PendingSnapshot {
    fn from_content(session: &Session, content: &PendingContent, degraded: bool) -> Self {
        let viewer = session.viewer(true);
        Self {
            posts: present_posts(&viewer, &content.posts),
            replies: present_replies(&viewer, &content.replies),
            role: viewer.role(),
            degraded,
        }
    }

    fn from_refresh(session: &Session, pending: &Degradable<PendingContent>) -> Self {
        Self::from_content(session, &pending.data, pending.is_degraded())
    }
}

/// Moderation queue for teachers and admins.
pub struct PendingPage {
    workflow: ModerationWorkflow,
}

impl PendingPage {
    pub fn new(client: Arc<ForumClient>, prompt: Arc<dyn Prompt>) -> Self {
        Self {
            workflow: ModerationWorkflow::new(client, prompt),
        }
    }

    pub async fn load(&self, session: &Session) -> Result<PendingSnapshot> {
        let content = self.workflow.load_pending(session).await?;
        Ok(PendingSnapshot::from_content(session, &content, false))
    }

    pub async fn validate(
        &self,
        session: &Session,
        target: ModerationTarget,
    ) -> Result<Outcome<PendingSnapshot>> {
        Ok(self
            .workflow
            .validate(session, target)
            .await?
            .map(|pending| PendingSnapshot::from_refresh(session, &pending)))
    }

    pub async fn block(
        &self,
        session: &Session,
        target: ModerationTarget,
    ) -> Result<Outcome<PendingSnapshot>> {
        Ok(self
            .workflow
            .block(session, target)
            .await?
            .map(|pending| PendingSnapshot::from_refresh(session, &pending)))
    }

    pub fn render(&self, snapshot: &PendingSnapshot) -> Result<String> {
        let nav = navigation(snapshot.role);
        render(&PendingTemplate {
            title: "Pending Posts",
            nav: &nav,
            posts: &snapshot.posts,
            replies: &snapshot.replies,
            degraded: snapshot.degraded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::test_support::{post_json, reply_json, staff, student};
    use sb_client::ShimConfig;
    use sb_core::{AutoConfirm, ForumError, MockTransport, OutboundRequest, RawResponse};
    use serde_json::json;

    fn page(transport: MockTransport) -> PendingPage {
        let client = ForumClient::new(Arc::new(transport), ShimConfig::direct());
        PendingPage::new(Arc::new(client), Arc::new(AutoConfirm))
    }

    #[tokio::test]
    async fn queue_renders_disclosed_authors() {
        let mut transport = MockTransport::new();
        transport
            .expect_base_url()
            .return_const("http://localhost:8000".to_string());
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path == "/pending-content?requester_school_id=7001")
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({
                        "status": "success",
                        "posts": [post_json(5, "secret-author-77", true, false)],
                        "replies": [reply_json(2, 9, "jdoe", false, false)]
                    }),
                ))
            });

        let page = page(transport);
        let snapshot = page.load(&staff()).await.unwrap();
        assert_eq!(snapshot.posts.len(), 1);
        assert_eq!(snapshot.replies.len(), 1);
        let html = page.render(&snapshot).unwrap();
        assert!(html.contains("secret-author-77 (Anon)"));
        assert!(html.contains("/pending-posts/post/5/validate"));
        assert!(html.contains("/pending-posts/post/5/block"));
        assert!(html.contains("/pending-posts/reply/2/validate"));
        assert!(html.contains("/pending-posts/reply/2/block"));
    }

    #[tokio::test]
    async fn students_cannot_open_the_queue() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let err = page(transport).load(&student()).await.unwrap_err();
        assert!(matches!(err, ForumError::Authorization(_)));
    }

    #[tokio::test]
    async fn validated_item_leaves_the_queue() {
        let mut transport = MockTransport::new();
        transport
            .expect_base_url()
            .return_const("http://localhost:8000".to_string());
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path == "/validate-reply")
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"status": "success", "message": "Reply validated successfully"}),
                ))
            });
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path.starts_with("/pending-content"))
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"status": "success", "posts": [], "replies": []}),
                ))
            });

        let outcome = page(transport)
            .validate(&staff(), ModerationTarget::Reply(2))
            .await
            .unwrap();
        match outcome {
            Outcome::Done(snapshot) => {
                assert!(snapshot.replies.is_empty());
                assert!(!snapshot.degraded);
            }
            Outcome::Cancelled => panic!("auto-confirm never cancels"),
        }
    }
}
