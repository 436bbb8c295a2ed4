use crate::moderation::ModerationWorkflow;
use crate::navigation::navigation;
use crate::session::Session;
use crate::templates::{render, PostTemplate};
use crate::Outcome;
use sb_client::ForumClient;
use sb_core::language::ensure_english_only;
use sb_core::{
    present_post_owned, ContentState, ModerationAction, ModerationTarget, NewReply, PostView,
    Prompt, Reply, Result, Role, Viewer, ANONYMOUS,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct PostSnapshot {
    pub post: PostView,
    pub can_moderate: bool,
    pub role: Role,
}

impl PostSnapshot {
    /// Moderation state of the post or one of its listed replies.
    pub fn state_of(&self, target: ModerationTarget) -> Option<ContentState> {
        match target {
            ModerationTarget::Post(id) => (self.post.post_id == id).then(|| self.post.state()),
            ModerationTarget::Reply(id) => self
                .post
                .replies
                .iter()
                .find(|r| r.reply_id == id)
                .map(|r| r.state()),
        }
    }
}

/// A post with its replies. Staff see pending replies, marked as such.
///
/// The backend answers `/get-post` only when the requester may see the post,
/// so the post itself is not filtered again here.
pub struct PostPage {
    client: Arc<ForumClient>,
    prompt: Arc<dyn Prompt>,
    workflow: ModerationWorkflow,
    /// Anonymous replies sent from this page, by post id. The backend masks
    /// their author, so this is the only way to recognise them as ours.
    authored: Mutex<HashMap<i64, Vec<String>>>,
}

impl PostPage {
    pub fn new(client: Arc<ForumClient>, prompt: Arc<dyn Prompt>) -> Self {
        let workflow = ModerationWorkflow::new(client.clone(), prompt.clone());
        Self {
            client,
            prompt,
            workflow,
            authored: Mutex::new(HashMap::new()),
        }
    }

    pub async fn load(&self, session: Option<&Session>, post_id: i64) -> Result<PostSnapshot> {
        let viewer = session
            .map(|s| s.viewer(s.is_staff()))
            .unwrap_or_else(Viewer::guest);
        let requester = session.map(Session::requester);

        let (detail, replies) = tokio::join!(
            self.client.get_post(post_id, requester),
            self.client.post_replies(post_id, requester),
        );
        let mut post = detail?.post;
        post.replies = replies?;

        let authored = self
            .authored
            .lock()
            .ok()
            .and_then(|map| map.get(&post_id).cloned())
            .unwrap_or_default();
        let owned = |reply: &Reply| {
            session.is_some()
                && reply.anonymous
                && reply.author_id == ANONYMOUS
                && authored.contains(&reply.content)
        };

        Ok(PostSnapshot {
            post: present_post_owned(&viewer, &post, owned),
            can_moderate: viewer.role().is_staff(),
            role: viewer.role(),
        })
    }

    /// Language filter, confirmation, submit, then reload.
    pub async fn submit_reply(
        &self,
        session: &Session,
        post_id: i64,
        content: &str,
        anonymous: bool,
    ) -> Result<Outcome<PostSnapshot>> {
        if let Err(err) = ensure_english_only("Reply", content) {
            self.prompt.alert(&err.user_message());
            return Err(err);
        }
        if !self.prompt.confirm("Post this reply?") {
            return Ok(Outcome::Cancelled);
        }

        let reply = NewReply::new(post_id, session.user().user_id.clone(), content, anonymous);
        if let Err(err) = self.client.post_reply(&reply).await {
            warn!(post_id, error = %err, "reply failed");
            self.prompt.alert(&err.user_message());
            return Err(err);
        }
        if anonymous {
            if let Ok(mut authored) = self.authored.lock() {
                authored.entry(post_id).or_default().push(reply.content.clone());
            }
        }
        self.load(Some(session), post_id).await.map(Outcome::Done)
    }

    /// Validates or blocks the post or one of its replies, then reloads the
    /// detail view.
    pub async fn moderate(
        &self,
        session: &Session,
        action: ModerationAction,
        target: ModerationTarget,
        post_id: i64,
    ) -> Result<Outcome<PostSnapshot>> {
        if self.workflow.apply(session, action, target).await?.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }
        let snapshot = self.load(Some(session), post_id).await?;

        let expected = ContentState::Pending.apply(action);
        match snapshot.state_of(target) {
            Some(state) if state != expected => {
                warn!(%target, ?state, ?expected, "backend state differs after moderation");
            }
            Some(_) => debug!(%target, ?expected, "moderation reflected"),
            None => debug!(%target, "moderated item not listed after reload"),
        }
        Ok(Outcome::Done(snapshot))
    }

    pub fn render(&self, snapshot: &PostSnapshot) -> Result<String> {
        let nav = navigation(snapshot.role);
        render(&PostTemplate {
            title: &snapshot.post.title,
            nav: &nav,
            post: &snapshot.post,
            can_moderate: snapshot.can_moderate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::test_support::{post_json, reply_json, staff, student};
    use sb_client::ShimConfig;
    use sb_core::{ForumError, MockPrompt, MockTransport, OutboundRequest, RawResponse};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn backend(post: Value, replies: Value) -> MockTransport {
        let mut transport = MockTransport::new();
        transport
            .expect_base_url()
            .return_const("http://localhost:8000".to_string());
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path.starts_with("/get-post?"))
            .returning(move |_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"status": "success", "post": post.clone(), "is_admin": false}),
                ))
            });
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path.starts_with("/get-post-replies?"))
            .returning(move |_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"status": "success", "replies": replies.clone()}),
                ))
            });
        transport
    }

    fn page(transport: MockTransport, prompt: MockPrompt) -> PostPage {
        let client = ForumClient::new(Arc::new(transport), ShimConfig::direct());
        PostPage::new(Arc::new(client), Arc::new(prompt))
    }

    #[tokio::test]
    async fn students_never_see_anonymous_reply_authors() {
        let transport = backend(
            post_json(9, "mkim", false, true),
            json!([
                reply_json(1, 9, "secret-author-77", true, true),
                reply_json(2, 9, "someone-else", false, false),
            ]),
        );
        let page = page(transport, MockPrompt::new());

        let snapshot = page.load(Some(&student()), 9).await.unwrap();
        assert_eq!(snapshot.post.replies.len(), 1);
        assert!(!snapshot.can_moderate);
        let html = page.render(&snapshot).unwrap();
        assert!(!html.contains("secret-author-77"));
        assert!(!html.contains("Validate"));
    }

    #[tokio::test]
    async fn staff_see_pending_replies_and_disclosed_authors() {
        let transport = backend(
            post_json(9, "mkim", false, true),
            json!([
                reply_json(1, 9, "secret-author-77", true, true),
                reply_json(2, 9, "someone-else", false, false),
            ]),
        );
        let page = page(transport, MockPrompt::new());

        let snapshot = page.load(Some(&staff()), 9).await.unwrap();
        assert_eq!(snapshot.post.replies.len(), 2);
        let html = page.render(&snapshot).unwrap();
        assert!(html.contains("secret-author-77 (Anon)"));
    }

    #[tokio::test]
    async fn hidden_post_is_reported_as_the_backend_says() {
        let mut transport = MockTransport::new();
        transport
            .expect_base_url()
            .return_const("http://localhost:8000".to_string());
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path.starts_with("/get-post?"))
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"status": "error", "message": "Post not found"}),
                ))
            });
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path.starts_with("/get-post-replies?"))
            .returning(|_| Ok(RawResponse::json(200, &json!({"status": "success", "replies": []}))));

        let err = page(transport, MockPrompt::new())
            .load(Some(&student()), 9)
            .await
            .unwrap_err();
        assert_eq!(err, ForumError::Rejected("Post not found".into()));
    }

    #[tokio::test]
    async fn authors_open_their_own_pending_anonymous_post() {
        let transport = backend(post_json(9, ANONYMOUS, true, false), json!([]));
        let snapshot = page(transport, MockPrompt::new())
            .load(Some(&student()), 9)
            .await
            .unwrap();
        assert!(snapshot.post.pending);
        assert_eq!(snapshot.post.author.to_string(), "Anonymous");
    }

    #[tokio::test]
    async fn own_anonymous_reply_stays_visible_while_pending() {
        let mut transport = MockTransport::new();
        transport
            .expect_base_url()
            .return_const("http://localhost:8000".to_string());
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path == "/post-reply")
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"status": "success", "message": "Reply posted successfully!"}),
                ))
            });
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path.starts_with("/get-post?"))
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"status": "success", "post": post_json(9, "mkim", false, true), "is_admin": false}),
                ))
            });
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path.starts_with("/get-post-replies?"))
            .returning(|_| {
                let mut mine = reply_json(1, 9, ANONYMOUS, true, false);
                mine["content"] = json!("Thanks!");
                let theirs = reply_json(2, 9, ANONYMOUS, true, false);
                Ok(RawResponse::json(
                    200,
                    &json!({"status": "success", "replies": [mine, theirs]}),
                ))
            });
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().times(1).return_const(true);

        let outcome = page(transport, prompt)
            .submit_reply(&student(), 9, "Thanks!", true)
            .await
            .unwrap();
        match outcome {
            Outcome::Done(snapshot) => {
                assert_eq!(snapshot.post.replies.len(), 1);
                assert_eq!(snapshot.post.replies[0].reply_id, 1);
                assert!(snapshot.post.replies[0].pending);
            }
            Outcome::Cancelled => panic!("the reply was confirmed"),
        }
    }

    /// Backend whose post 9 flips its `validated` bit on moderation calls.
    fn moderated_backend(validated: bool, moderation_calls: usize) -> MockTransport {
        let state = Arc::new(AtomicBool::new(validated));
        let mut transport = MockTransport::new();
        transport
            .expect_base_url()
            .return_const("http://localhost:8000".to_string());
        let flip = state.clone();
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path == "/block-post" || req.path == "/validate-post")
            .times(moderation_calls)
            .returning(move |req| {
                flip.store(req.path == "/validate-post", Ordering::SeqCst);
                Ok(RawResponse::json(200, &json!({"status": "success", "message": "ok"})))
            });
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path.starts_with("/pending-content"))
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"status": "success", "posts": [], "replies": []}),
                ))
            });
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path.starts_with("/get-post?"))
            .returning(move |_| {
                let post = post_json(9, "jdoe", false, state.load(Ordering::SeqCst));
                Ok(RawResponse::json(
                    200,
                    &json!({"status": "success", "post": post, "is_admin": false}),
                ))
            });
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path.starts_with("/get-post-replies?"))
            .returning(|_| Ok(RawResponse::json(200, &json!({"status": "success", "replies": []}))));
        transport
    }

    #[tokio::test]
    async fn blocking_a_validated_post_returns_it_pending() {
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().times(1).return_const(true);
        let page = page(moderated_backend(true, 1), prompt);

        let before = page.load(Some(&staff()), 9).await.unwrap();
        assert_eq!(before.state_of(ModerationTarget::Post(9)), Some(ContentState::Validated));

        let outcome = page
            .moderate(&staff(), ModerationAction::Block, ModerationTarget::Post(9), 9)
            .await
            .unwrap();
        match outcome {
            Outcome::Done(snapshot) => {
                assert!(snapshot.post.pending);
                assert_eq!(snapshot.state_of(ModerationTarget::Post(9)), Some(ContentState::Pending));
            }
            Outcome::Cancelled => panic!("the block was confirmed"),
        }
    }

    #[tokio::test]
    async fn validating_twice_leaves_the_post_validated() {
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().times(2).return_const(true);
        let page = page(moderated_backend(false, 2), prompt);

        for _ in 0..2 {
            let outcome = page
                .moderate(&staff(), ModerationAction::Validate, ModerationTarget::Post(9), 9)
                .await
                .unwrap();
            match outcome {
                Outcome::Done(snapshot) => {
                    assert!(!snapshot.post.pending);
                    assert_eq!(
                        snapshot.state_of(ModerationTarget::Post(9)),
                        Some(ContentState::Validated)
                    );
                }
                Outcome::Cancelled => panic!("the validation was confirmed"),
            }
        }
    }

    #[tokio::test]
    async fn korean_reply_alerts_without_prompting_or_sending() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().times(0);
        prompt.expect_alert().times(1).return_const(());

        let err = page(transport, prompt)
            .submit_reply(&student(), 9, "감사합니다", false)
            .await
            .unwrap_err();
        assert!(matches!(err, ForumError::Validation(_)));
    }

    #[tokio::test]
    async fn declined_reply_is_not_sent() {
        let mut transport = MockTransport::new();
        transport.expect_send().times(0);
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().times(1).return_const(false);

        let outcome = page(transport, prompt)
            .submit_reply(&student(), 9, "Thanks!", false)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
    }

    #[tokio::test]
    async fn rejected_reply_alerts_backend_message() {
        let mut transport = MockTransport::new();
        transport
            .expect_base_url()
            .return_const("http://localhost:8000".to_string());
        transport
            .expect_send()
            .withf(|req: &OutboundRequest| req.path == "/post-reply")
            .times(1)
            .returning(|_| {
                Ok(RawResponse::json(
                    200,
                    &json!({"status": "error", "message": "Parent post not found"}),
                ))
            });
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().return_const(true);
        prompt
            .expect_alert()
            .withf(|m| m == "Parent post not found")
            .times(1)
            .return_const(());

        let err = page(transport, prompt)
            .submit_reply(&student(), 9, "Thanks!", false)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Parent post not found");
    }
}
