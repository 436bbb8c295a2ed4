//! Backend response envelope.
//!
//! Every backend endpoint answers `{"status": "success", ...payload}` or
//! `{"status": "error", "message": ...}`. Payload fields sit next to
//! `status`, so the success arm decodes `T` from the whole object.

use crate::error::{ForumError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

const DEFAULT_FAILURE: &str = "Request failed";

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope<T> {
    Success(T),
    Failure { message: String },
}

impl<T: DeserializeOwned> Envelope<T> {
    pub fn decode(value: Value) -> Result<Self> {
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| ForumError::InvalidResponse("missing status field".into()))?;

        match status {
            "success" => Ok(Self::Success(serde_json::from_value(value)?)),
            "error" => Ok(Self::Failure {
                message: failure_message(&value),
            }),
            other => Err(ForumError::InvalidResponse(format!(
                "unexpected status {other:?}"
            ))),
        }
    }
}

impl<T> Envelope<T> {
    pub fn into_result(self) -> Result<T> {
        match self {
            Self::Success(data) => Ok(data),
            Self::Failure { message } => Err(ForumError::Rejected(message)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

fn failure_message(value: &Value) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_FAILURE)
        .to_string()
}

/// Payload for endpoints that only acknowledge (`{"status", "message"}`).
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}
