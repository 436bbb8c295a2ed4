use crate::endpoint::Endpoint;
use crate::ForumClient;
use sb_core::language::ensure_english_only;
use sb_core::{Ack, NewReply, Reply, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RepliesPayload {
    #[serde(default)]
    replies: Vec<Reply>,
}

impl ForumClient {
    pub async fn post_replies(&self, post_id: i64, requester: Option<&str>) -> Result<Vec<Reply>> {
        let endpoint = Endpoint::new("/get-post-replies")
            .param("post_id", post_id)
            .param_opt("requester_school_id", requester);
        let payload: RepliesPayload = self.get(&endpoint).await?;
        Ok(payload.replies)
    }

    pub async fn post_reply(&self, reply: &NewReply) -> Result<Ack> {
        ensure_english_only("Reply", &reply.content)?;
        self.post("/post-reply", reply).await
    }
}
