use crate::ForumClient;
use sb_core::{Ack, CurrentUser, Result, UserType};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginKind {
    Student,
    Teacher,
    Admin,
}

impl LoginKind {
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Student => "/login-check-student",
            Self::Teacher => "/login-check-teacher",
            Self::Admin => "/login-check-admin",
        }
    }

    pub fn user_type(self) -> UserType {
        match self {
            Self::Student => UserType::Student,
            Self::Teacher => UserType::Teacher,
            Self::Admin => UserType::Admin,
        }
    }
}

/// Registration form for `/sign-up`. The backend validates every field.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub user_id: String,
    pub password: SecretString,
    pub given_name: String,
    pub surname: String,
    pub age: String,
    pub school_id: String,
    pub intended_major: String,
    pub email: String,
    pub class_of: String,
}

#[derive(Deserialize)]
struct LoginReply {
    #[serde(default)]
    user: Option<CurrentUser>,
}

impl ForumClient {
    /// Checks credentials and returns the backend's user record as is.
    pub async fn login(
        &self,
        kind: LoginKind,
        user_id: &str,
        password: &SecretString,
    ) -> Result<CurrentUser> {
        let body = json!({
            "user_id": user_id,
            "password": password.expose_secret(),
        });
        let reply: LoginReply = self.post(kind.endpoint(), &body).await?;
        info!(user_id, ?kind, "login accepted");
        Ok(reply.user.unwrap_or_else(|| CurrentUser::new(user_id)))
    }

    pub async fn login_student(&self, user_id: &str, password: &SecretString) -> Result<CurrentUser> {
        self.login(LoginKind::Student, user_id, password).await
    }

    pub async fn login_teacher(&self, user_id: &str, password: &SecretString) -> Result<CurrentUser> {
        self.login(LoginKind::Teacher, user_id, password).await
    }

    pub async fn login_admin(&self, user_id: &str, password: &SecretString) -> Result<CurrentUser> {
        self.login(LoginKind::Admin, user_id, password).await
    }

    pub async fn sign_up(&self, form: &SignUp) -> Result<Ack> {
        let body = json!({
            "user_id": form.user_id,
            "password": form.password.expose_secret(),
            "given_name": form.given_name,
            "surname": form.surname,
            "age": form.age,
            "school_id": form.school_id,
            "intended_major": form.intended_major,
            "email": form.email,
            "class": form.class_of,
        });
        self.post("/sign-up", &body).await
    }
}
