//! Page controllers. Each one loads through `ForumClient`, applies the
//! visibility policy and renders with askama.

pub mod classes;
pub mod feed;
pub mod pending;
pub mod post;

pub use classes::ClassesPage;
pub use feed::{FeedPage, FeedSnapshot};
pub use pending::{PendingPage, PendingSnapshot};
pub use post::PostPage;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::session::Session;
    use sb_core::CurrentUser;
    use serde_json::{json, Value};

    pub fn post_json(id: i64, author: &str, anonymous: bool, validated: bool) -> Value {
        json!({
            "post_id": id,
            "title": format!("Post {id}"),
            "content": "Body text",
            "author_id": author,
            "category": "General",
            "upload_time": "2025-09-06T10:00:00",
            "anonymous": u8::from(anonymous),
            "validated": u8::from(validated)
        })
    }

    pub fn reply_json(id: i64, parent: i64, author: &str, anonymous: bool, validated: bool) -> Value {
        json!({
            "reply_id": id,
            "parent_post_id": parent,
            "content": format!("Reply {id}"),
            "author_id": author,
            "upload_time": "2025-09-06T11:00:00",
            "anonymous": u8::from(anonymous),
            "validated": u8::from(validated)
        })
    }

    pub fn student() -> Session {
        let mut user = CurrentUser::new("jdoe");
        user.school_id = Some("12".into());
        Session::new(user, false, false)
    }

    pub fn staff() -> Session {
        let mut user = CurrentUser::new("mkim");
        user.school_id = Some("7001".into());
        Session::new(user, true, false)
    }
}
