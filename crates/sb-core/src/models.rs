//! # Domain Models
//!
//! Advisory client-side copies of the entities the backend owns.
//! Field names match the backend's snake_case JSON one to one.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A top-level forum post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: i64,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub category: String,
    pub upload_time: String,
    #[serde(with = "flag")]
    pub anonymous: bool,
    /// Legacy rows without the column are treated as validated.
    #[serde(default = "default_validated", with = "flag")]
    pub validated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

impl Post {
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        parse_upload_time(&self.upload_time)
    }
}

/// A reply scoped to one parent post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub reply_id: i64,
    pub parent_post_id: i64,
    pub content: String,
    pub author_id: String,
    pub upload_time: String,
    #[serde(with = "flag")]
    pub anonymous: bool,
    #[serde(default = "default_validated", with = "flag")]
    pub validated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Reply {
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        parse_upload_time(&self.upload_time)
    }
}

/// A teacher-owned class. Membership is a comma-joined list of school IDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub class_id: i64,
    #[serde(deserialize_with = "id_string")]
    pub creator_id: String,
    pub name: String,
    #[serde(default, deserialize_with = "nullable_string")]
    pub students: String,
}

impl Class {
    pub fn student_ids(&self) -> Vec<&str> {
        self.students
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .collect()
    }

    pub fn has_student(&self, school_id: &str) -> bool {
        self.student_ids().contains(&school_id.trim())
    }
}

/// One row of a student search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    #[serde(deserialize_with = "id_string")]
    pub school_id: String,
    pub given_name: String,
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "class", default, deserialize_with = "opt_id_string")]
    pub class_of: Option<String>,
}

/// A student profile as returned by `/get-student-info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentInfo {
    #[serde(default)]
    pub user_id: String,
    #[serde(deserialize_with = "id_string")]
    pub school_id: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub intended_major: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "class", default, deserialize_with = "opt_id_string")]
    pub class_of: Option<String>,
}

/// Which login flow produced a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    Student,
    Teacher,
    Admin,
    #[serde(other)]
    Unknown,
}

/// The locally cached session blob. Advisory only: the backend re-checks
/// every privileged request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentUser {
    pub user_id: String,
    #[serde(default, deserialize_with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub school_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_teacher: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_admin: Option<bool>,
    /// Everything else the backend returned (email, class, point, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CurrentUser {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    /// Teacher flag as claimed by the blob, before any backend check.
    pub fn claims_teacher(&self) -> bool {
        self.user_type == Some(UserType::Teacher) || self.is_teacher == Some(true)
    }

    /// Admin is only trusted when an admin login set it explicitly.
    pub fn claims_admin(&self) -> bool {
        self.is_admin == Some(true) || self.user_type == Some(UserType::Admin)
    }
}

/// Viewer role. Ordering follows privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn from_flags(is_teacher: bool, is_admin: bool) -> Self {
        if is_admin {
            Self::Admin
        } else if is_teacher {
            Self::Teacher
        } else {
            Self::Student
        }
    }

    /// Teachers and admins.
    pub fn is_staff(self) -> bool {
        self >= Self::Teacher
    }
}

/// Body of `/post-upload`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewPost {
    pub upload_time: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    #[serde(with = "flag")]
    pub anonymous: bool,
    pub category: String,
}

impl NewPost {
    pub fn new(
        author_id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
        anonymous: bool,
    ) -> Self {
        Self {
            upload_time: now_timestamp(),
            title: title.into(),
            content: content.into(),
            author_id: author_id.into(),
            anonymous,
            category: category.into(),
        }
    }
}

/// Body of `/post-reply`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewReply {
    pub upload_time: String,
    pub parent_post_id: i64,
    pub content: String,
    pub author_id: String,
    #[serde(with = "flag")]
    pub anonymous: bool,
}

impl NewReply {
    pub fn new(
        parent_post_id: i64,
        author_id: impl Into<String>,
        content: impl Into<String>,
        anonymous: bool,
    ) -> Self {
        Self {
            upload_time: now_timestamp(),
            parent_post_id,
            content: content.into(),
            author_id: author_id.into(),
            anonymous,
        }
    }
}

/// Current time in the `toISOString` shape the backend parses.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accepts RFC 3339 or the backend's naive `YYYY-MM-DDTHH:MM:SS` (read as UTC).
pub fn parse_upload_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn default_validated() -> bool {
    true
}

/// `tinyint(1)` columns: written as 0/1, read from 0/1, booleans or "0"/"1".
pub(crate) mod flag {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Str(String),
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Bool(b) => Ok(b),
            Raw::Int(i) => Ok(i != 0),
            Raw::Str(s) => match s.trim() {
                "1" | "true" => Ok(true),
                "0" | "false" | "" => Ok(false),
                other => Err(D::Error::custom(format!("invalid flag value {other:?}"))),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => s,
            RawId::Int(i) => i.to_string(),
        }
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

fn nullable_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
