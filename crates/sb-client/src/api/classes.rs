use crate::endpoint::Endpoint;
use crate::ForumClient;
use sb_core::{Ack, Class, ForumError, Result};
use serde::Deserialize;
use serde_json::{json, Value};

/// `/get-classes` answer. Doubles as the backend's teacher check.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ClassListing {
    #[serde(default)]
    pub classes: Vec<Class>,
    #[serde(default)]
    pub is_teacher: bool,
}

#[derive(Deserialize)]
struct Created {
    class_id: i64,
}

impl ForumClient {
    /// A failure envelope that says `is_teacher: false` is a definite
    /// "not a teacher", not an error.
    pub async fn classes(&self, school_id: &str) -> Result<ClassListing> {
        let endpoint = Endpoint::new("/get-classes").param("school_id", school_id);
        let value = self.get_raw(&endpoint).await?;
        if value.get("status").and_then(Value::as_str) == Some("error")
            && value.get("is_teacher").and_then(Value::as_bool) == Some(false)
        {
            return Ok(ClassListing::default());
        }
        sb_core::Envelope::decode(value)?.into_result()
    }

    pub async fn create_class(&self, creator_id: &str, name: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ForumError::Validation("Class name is required".into()));
        }
        let created: Created = self
            .post("/create-class", &json!({ "creator_id": creator_id, "name": name }))
            .await?;
        Ok(created.class_id)
    }

    pub async fn delete_class(&self, class_id: i64, creator_id: &str) -> Result<Ack> {
        self.post(
            "/delete-class",
            &json!({ "class_id": class_id, "creator_id": creator_id }),
        )
        .await
    }

    pub async fn rename_class(&self, class_id: i64, creator_id: &str, new_name: &str) -> Result<Ack> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ForumError::Validation("Class name is required".into()));
        }
        self.post(
            "/rename-class",
            &json!({ "class_id": class_id, "creator_id": creator_id, "new_name": new_name }),
        )
        .await
    }

    pub async fn add_student_to_class(&self, class_id: i64, school_id: &str) -> Result<Ack> {
        self.post(
            "/add-student-to-class",
            &json!({ "class_id": class_id, "school_id": school_id }),
        )
        .await
    }

    pub async fn remove_student_from_class(&self, class_id: i64, school_id: &str) -> Result<Ack> {
        self.post(
            "/remove-student-from-class",
            &json!({ "class_id": class_id, "school_id": school_id }),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{answering, client, transport};
    use serde_json::json;

    #[tokio::test]
    async fn teacher_listing_decodes_classes() {
        let transport = answering(
            |req| req.path == "/get-classes?school_id=7001",
            json!({"status": "success", "is_teacher": true, "classes": [
                {"class_id": 3, "creator_id": 7001, "name": "Physics", "students": "12, 13"}
            ]}),
        );
        let listing = client(transport).classes("7001").await.unwrap();
        assert!(listing.is_teacher);
        assert!(listing.classes[0].has_student("13"));
    }

    #[tokio::test]
    async fn not_a_teacher_is_a_listing_not_an_error() {
        let transport = answering(
            |_| true,
            json!({"status": "error", "message": "Access denied: Not a teacher account", "is_teacher": false}),
        );
        let listing = client(transport).classes("12").await.unwrap();
        assert_eq!(listing, ClassListing::default());
    }

    #[tokio::test]
    async fn other_failures_stay_errors() {
        let transport = answering(|_| true, json!({"status": "error", "message": "db gone"}));
        let err = client(transport).classes("12").await.unwrap_err();
        assert_eq!(err, ForumError::Rejected("db gone".into()));
    }

    #[tokio::test]
    async fn create_class_returns_new_id() {
        let transport = answering(
            |req| {
                req.path == "/create-class"
                    && req.body.as_ref().map(|b| b["name"] == "Chemistry").unwrap_or(false)
            },
            json!({"status": "success", "message": "Class created successfully", "class_id": 8}),
        );
        let id = client(transport)
            .create_class("7001", "  Chemistry ")
            .await
            .unwrap();
        assert_eq!(id, 8);
    }

    #[tokio::test]
    async fn blank_rename_is_rejected_locally() {
        let mut transport = transport();
        transport.expect_send().times(0);
        let err = client(transport)
            .rename_class(3, "7001", "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ForumError::Validation(_)));
    }

    #[tokio::test]
    async fn membership_changes_surface_backend_rejections() {
        let transport = answering(
            |req| req.path == "/add-student-to-class",
            json!({"status": "error", "message": "Student is already in this class"}),
        );
        let err = client(transport)
            .add_student_to_class(3, "12")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Student is already in this class");
    }
}
