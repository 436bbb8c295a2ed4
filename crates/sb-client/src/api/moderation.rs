use crate::endpoint::Endpoint;
use crate::fallback::{Degradable, ReadPolicy};
use crate::ForumClient;
use sb_core::{Ack, ModerationAction, ModerationTarget, Post, Reply, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

/// Everything still waiting for review.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PendingContent {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl PendingContent {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.replies.is_empty()
    }

    pub fn contains(&self, target: ModerationTarget) -> bool {
        match target {
            ModerationTarget::Post(id) => self.posts.iter().any(|p| p.post_id == id),
            ModerationTarget::Reply(id) => self.replies.iter().any(|r| r.reply_id == id),
        }
    }

    /// The queue with `target` taken out.
    pub fn without(mut self, target: ModerationTarget) -> Self {
        match target {
            ModerationTarget::Post(id) => self.posts.retain(|p| p.post_id != id),
            ModerationTarget::Reply(id) => self.replies.retain(|r| r.reply_id != id),
        }
        self
    }
}

impl ForumClient {
    pub async fn moderate(
        &self,
        action: ModerationAction,
        target: ModerationTarget,
        requester: &str,
    ) -> Result<Ack> {
        let mut body = Map::new();
        body.insert(target.id_field().to_string(), Value::from(target.id()));
        body.insert("requester_school_id".to_string(), Value::from(requester));

        let ack: Ack = self.post(&target.endpoint(action), &body).await?;
        info!(%target, action = action.verb(), requester, "moderation applied");
        Ok(ack)
    }

    pub async fn validate_post(&self, post_id: i64, requester: &str) -> Result<Ack> {
        self.moderate(ModerationAction::Validate, ModerationTarget::Post(post_id), requester)
            .await
    }

    pub async fn block_post(&self, post_id: i64, requester: &str) -> Result<Ack> {
        self.moderate(ModerationAction::Block, ModerationTarget::Post(post_id), requester)
            .await
    }

    pub async fn validate_reply(&self, reply_id: i64, requester: &str) -> Result<Ack> {
        self.moderate(ModerationAction::Validate, ModerationTarget::Reply(reply_id), requester)
            .await
    }

    pub async fn block_reply(&self, reply_id: i64, requester: &str) -> Result<Ack> {
        self.moderate(ModerationAction::Block, ModerationTarget::Reply(reply_id), requester)
            .await
    }

    pub async fn pending_content(&self, requester: &str) -> Result<PendingContent> {
        self.pending_content_with(requester, ReadPolicy::Propagate)
            .await
            .map(Degradable::into_inner)
    }

    /// The queue read under `policy`. Successful reads are remembered, so
    /// `CacheOrEmpty` can answer with the last queue this client saw.
    pub async fn pending_content_with(
        &self,
        requester: &str,
        policy: ReadPolicy,
    ) -> Result<Degradable<PendingContent>> {
        let endpoint = Endpoint::new("/pending-content").param("requester_school_id", requester);
        self.read_through(&endpoint, policy, |content: PendingContent| content)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{answering, client};
    use sb_core::ForumError;
    use serde_json::json;

    #[tokio::test]
    async fn validate_post_sends_id_and_requester() {
        let transport = answering(
            |req| {
                req.path == "/validate-post"
                    && req.body
                        == Some(json!({"post_id": 5, "requester_school_id": "7001"}))
            },
            json!({"status": "success", "message": "Post validated successfully"}),
        );
        let ack = client(transport).validate_post(5, "7001").await.unwrap();
        assert_eq!(ack.message, "Post validated successfully");
    }

    #[tokio::test]
    async fn block_reply_uses_reply_id_field() {
        let transport = answering(
            |req| {
                req.path == "/block-reply"
                    && req.body
                        == Some(json!({"reply_id": 2, "requester_school_id": "7001"}))
            },
            json!({"status": "success", "message": "Reply blocked successfully"}),
        );
        client(transport).block_reply(2, "7001").await.unwrap();
    }

    #[tokio::test]
    async fn access_denied_is_verbatim() {
        let transport = answering(
            |req| req.path == "/block-post",
            json!({"status": "error", "message": "Access denied: Only teachers or admins can block posts"}),
        );
        let err = client(transport).block_post(5, "12").await.unwrap_err();
        assert_eq!(
            err,
            ForumError::Rejected("Access denied: Only teachers or admins can block posts".into())
        );
    }

    #[tokio::test]
    async fn pending_content_splits_posts_and_replies() {
        let transport = answering(
            |req| req.path == "/pending-content?requester_school_id=7001",
            json!({"status": "success",
                "posts": [{
                    "post_id": 5, "title": "T", "content": "C", "author_id": "jdoe",
                    "category": "General", "upload_time": "2025-09-06 10:00:00",
                    "anonymous": 0, "validated": 0
                }],
                "replies": []
            }),
        );
        let pending = client(transport).pending_content("7001").await.unwrap();
        assert!(pending.contains(ModerationTarget::Post(5)));
        assert!(!pending.contains(ModerationTarget::Reply(5)));
        assert!(!pending.without(ModerationTarget::Post(5)).contains(ModerationTarget::Post(5)));
    }
}
