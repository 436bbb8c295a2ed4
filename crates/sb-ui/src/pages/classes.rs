//! Class management for teachers.

use crate::session::Session;
use crate::Outcome;
use sb_client::ForumClient;
use sb_core::{Class, ForumError, Prompt, Result, StudentSummary};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, warn};

pub struct ClassesPage {
    client: Arc<ForumClient>,
    prompt: Arc<dyn Prompt>,
}

impl ClassesPage {
    pub fn new(client: Arc<ForumClient>, prompt: Arc<dyn Prompt>) -> Self {
        Self { client, prompt }
    }

    pub async fn load(&self, session: &Session) -> Result<Vec<Class>> {
        let teacher_id = teacher_id(session)?;
        let listing = self.client.classes(teacher_id).await?;
        if !listing.is_teacher {
            return Err(ForumError::Authorization("Not a teacher account".into()));
        }
        Ok(listing.classes)
    }

    pub async fn create(&self, session: &Session, name: &str) -> Result<Outcome<Vec<Class>>> {
        let teacher_id = teacher_id(session)?;
        self.confirmed(session, &format!("Create class \"{}\"?", name.trim()), || {
            self.client.create_class(teacher_id, name)
        })
        .await
    }

    pub async fn rename(
        &self,
        session: &Session,
        class_id: i64,
        new_name: &str,
    ) -> Result<Outcome<Vec<Class>>> {
        let teacher_id = teacher_id(session)?;
        self.confirmed(session, &format!("Rename this class to \"{}\"?", new_name.trim()), || {
            self.client.rename_class(class_id, teacher_id, new_name)
        })
        .await
    }

    pub async fn delete(&self, session: &Session, class_id: i64) -> Result<Outcome<Vec<Class>>> {
        let teacher_id = teacher_id(session)?;
        self.confirmed(session, "Are you sure you want to delete this class?", || {
            self.client.delete_class(class_id, teacher_id)
        })
        .await
    }

    pub async fn add_student(
        &self,
        session: &Session,
        class_id: i64,
        school_id: &str,
    ) -> Result<Outcome<Vec<Class>>> {
        teacher_id(session)?;
        self.confirmed(session, &format!("Add student {school_id} to this class?"), || {
            self.client.add_student_to_class(class_id, school_id)
        })
        .await
    }

    pub async fn remove_student(
        &self,
        session: &Session,
        class_id: i64,
        school_id: &str,
    ) -> Result<Outcome<Vec<Class>>> {
        teacher_id(session)?;
        self.confirmed(
            session,
            &format!("Remove student {school_id} from this class?"),
            || self.client.remove_student_from_class(class_id, school_id),
        )
        .await
    }

    /// Student lookup for the "add student" form.
    pub async fn search(&self, session: &Session, query: &str) -> Result<Vec<StudentSummary>> {
        teacher_id(session)?;
        self.client
            .search_students(query, Some(session.requester()))
            .await
    }

    async fn confirmed<T, F, Fut>(
        &self,
        session: &Session,
        question: &str,
        op: F,
    ) -> Result<Outcome<Vec<Class>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.prompt.confirm(question) {
            return Ok(Outcome::Cancelled);
        }
        if let Err(err) = op().await {
            warn!(error = %err, "class update failed");
            self.prompt.alert(&err.user_message());
            return Err(err);
        }
        info!(teacher = session.requester(), "class update applied");
        self.load(session).await.map(Outcome::Done)
    }
}

fn teacher_id(session: &Session) -> Result<&str> {
    if !session.is_teacher() {
        return Err(ForumError::Authorization("Not a teacher account".into()));
    }
    session
        .user()
        .school_id
        .as_deref()
        .ok_or_else(|| ForumError::Authorization("No school_id found for this user".into()))
}
