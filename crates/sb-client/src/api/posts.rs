use crate::endpoint::Endpoint;
use crate::fallback::Degradable;
use crate::ForumClient;
use sb_core::language::ensure_english_only;
use sb_core::{NewPost, Post, Result};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct PostsPayload {
    #[serde(default)]
    posts: Vec<Post>,
}

/// `/get-post` answer. `is_admin` is the backend's view of the requester.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostDetail {
    pub post: Post,
    #[serde(default)]
    pub is_admin: bool,
}

/// `/post-upload` answer. Newer backends include the new id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub post_id: Option<i64>,
}

impl ForumClient {
    pub async fn post_list(
        &self,
        requester: Option<&str>,
        show_pending: Option<bool>,
    ) -> Result<Degradable<Vec<Post>>> {
        let endpoint = Endpoint::new("/post-list").requester(requester, show_pending);
        self.get_list(&endpoint, |p: PostsPayload| p.posts).await
    }

    pub async fn posts_by_category(
        &self,
        category: &str,
        requester: Option<&str>,
        show_pending: Option<bool>,
    ) -> Result<Degradable<Vec<Post>>> {
        let endpoint = Endpoint::new("/post-by-category")
            .param("category", category)
            .requester(requester, show_pending);
        self.get_list(&endpoint, |p: PostsPayload| p.posts).await
    }

    /// Rejects non-English title or content before anything is sent.
    pub async fn upload_post(&self, post: &NewPost) -> Result<UploadAck> {
        ensure_english_only("Title", &post.title)?;
        ensure_english_only("Content", &post.content)?;
        self.post("/post-upload", post).await
    }

    pub async fn my_posts(&self, author_id: &str) -> Result<Vec<Post>> {
        let payload: PostsPayload = self
            .post("/my-post-list", &json!({ "author_id": author_id }))
            .await?;
        Ok(payload.posts)
    }

    pub async fn get_post(&self, post_id: i64, requester: Option<&str>) -> Result<PostDetail> {
        let endpoint = Endpoint::new("/get-post")
            .param("post_id", post_id)
            .param_opt("requester_school_id", requester);
        self.get(&endpoint).await
    }
}
