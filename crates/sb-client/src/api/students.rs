use crate::endpoint::Endpoint;
use crate::ForumClient;
use sb_core::{ForumError, Result, StudentInfo, StudentSummary};
use serde::Deserialize;

#[derive(Deserialize)]
struct InfoPayload {
    student: StudentInfo,
}

#[derive(Deserialize)]
struct CountPayload {
    #[serde(default)]
    post_count: u64,
}

#[derive(Deserialize)]
struct SearchPayload {
    #[serde(default)]
    students: Vec<StudentSummary>,
}

impl ForumClient {
    pub async fn student_info(&self, school_id: &str, requester: Option<&str>) -> Result<StudentInfo> {
        let endpoint = Endpoint::new("/get-student-info")
            .param("school_id", school_id)
            .param_opt("requester_school_id", requester);
        let payload: InfoPayload = self.get(&endpoint).await?;
        Ok(payload.student)
    }

    pub async fn student_post_count(&self, author_id: &str) -> Result<u64> {
        let endpoint = Endpoint::new("/get-student-post-count").param("author_id", author_id);
        let payload: CountPayload = self.get(&endpoint).await?;
        Ok(payload.post_count)
    }

    /// Searches by name, or by school id when `query` is all digits.
    pub async fn search_students(
        &self,
        query: &str,
        requester: Option<&str>,
    ) -> Result<Vec<StudentSummary>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ForumError::Validation(
                "Please provide a name or student ID to search".into(),
            ));
        }
        let endpoint = Endpoint::new("/search-students")
            .param("name", query)
            .param_opt("requester_school_id", requester);
        let payload: SearchPayload = self.get(&endpoint).await?;
        Ok(payload.students)
    }
}
