// Backend wire types.
// Defines the response envelope, query parameters, and request bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

static NULL: Value = Value::Null;

/// Response envelope returned by every backend endpoint.
///
/// `code == 200` signals success independently of the HTTP status.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    pub const SUCCESS: i64 = 200;

    pub fn success(data: Value) -> Self {
        Self {
            code: Self::SUCCESS,
            message: None,
            data: Some(data),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Self::SUCCESS
    }

    /// The payload, or `Value::Null` when absent.
    pub fn data(&self) -> &Value {
        self.data.as_ref().unwrap_or(&NULL)
    }

    /// Server message if non-empty, otherwise `fallback`.
    pub fn message_or(&self, fallback: &str) -> String {
        match self.message.as_deref() {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Result of a file upload that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// The server echoed a readable envelope.
    Parsed(Envelope),
    /// The upload succeeded on the wire but the echo could not be parsed.
    /// The envelope carries the local file path as a placeholder reference.
    Degraded(Envelope),
}

impl UploadOutcome {
    pub fn envelope(&self) -> &Envelope {
        match self {
            UploadOutcome::Parsed(envelope) | UploadOutcome::Degraded(envelope) => envelope,
        }
    }

    pub fn into_envelope(self) -> Envelope {
        match self {
            UploadOutcome::Parsed(envelope) | UploadOutcome::Degraded(envelope) => envelope,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, UploadOutcome::Degraded(_))
    }
}

/// Paging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }
}

/// Parameters for the question feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub tab: String,
    pub page: PageQuery,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            tab: "all".to_string(),
            page: PageQuery::default(),
        }
    }
}

/// Parameters for a question's answer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerQuery {
    pub page: PageQuery,
    pub sort: String,
}

impl Default for AnswerQuery {
    fn default() -> Self {
        Self {
            page: PageQuery::default(),
            sort: "time".to_string(),
        }
    }
}

/// Login credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Body for publishing a question.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewQuestion {
    pub content: String,
    pub description: String,
}

/// Partial profile update; only set fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<String>,
}
