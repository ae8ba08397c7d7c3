// View-model types held by the store.
// Every record here has already been normalized into its stable display shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A question as shown in lists and detail pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    /// Database-assigned identifier, when the backend sent one.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub raw_id: Option<String>,
    pub title: String,
    pub description: String,
    pub user_name: String,
    pub avatar: String,
    pub created_at: String,
    pub view_count: u64,
    pub answer_count: u64,
}

impl Question {
    /// Match against either identifier.
    pub fn has_id(&self, id: &str) -> bool {
        self.id == id || self.raw_id.as_deref() == Some(id)
    }
}

/// An answer to a question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: String,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub raw_id: Option<String>,
    pub question_id: String,
    pub content: String,
    pub user_name: String,
    pub avatar: String,
    pub time: String,
    pub likes: u64,
}

/// One page of answers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerPage {
    pub total: u64,
    pub answers: Vec<Answer>,
}

/// The signed-in user's profile. Unknown backend fields ride along in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub level: i64,
    #[serde(default)]
    pub level_progress: i64,
    #[serde(default)]
    pub points: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference to a favorited question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: String,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub raw_id: Option<String>,
}

/// Activity counters for the profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatistics {
    pub questions: u64,
    pub answers: u64,
    pub followers: u64,
    pub following: u64,
}

/// Result of toggling a like.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub is_liked: bool,
    pub likes: u64,
}

/// One flag per collection fetch in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingFlags {
    pub questions: bool,
    pub answers: bool,
    pub favorites: bool,
    pub profile: bool,
}

/// Uniform result of a store operation that can fail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Success without payload, with an informational message.
    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Failure that still carries a safe fallback value.
    pub fn failed_with(message: impl Into<String>, fallback: T) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: Some(fallback),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Everything the UI observes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub questions: Vec<Question>,
    pub favorites: Vec<Favorite>,
    pub user_profile: UserProfile,
    pub loading: LoadingFlags,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_question_serializes_camel_case() {
        let question = Question {
            id: "abc".into(),
            raw_id: Some("abc".into()),
            title: "t".into(),
            description: "d".into(),
            user_name: "alice".into(),
            avatar: "/static/avatar/default1.png".into(),
            created_at: "2024-01-01".into(),
            view_count: 3,
            answer_count: 1,
        };
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["_id"], "abc");
        assert_eq!(value["userName"], "alice");
        assert_eq!(value["viewCount"], 3);
        assert!(question.has_id("abc"));
    }

    #[test]
    fn test_profile_keeps_unknown_fields() {
        let profile: UserProfile = serde_json::from_value(json!({
            "username": "alice",
            "levelProgress": 10,
            "email": "a@example.com"
        }))
        .unwrap();
        assert_eq!(profile.level_progress, 10);
        assert_eq!(profile.extra["email"], "a@example.com");

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["email"], "a@example.com");
        assert_eq!(value["levelProgress"], 10);
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = Outcome::ok(1);
        assert!(ok.is_success());
        assert_eq!(ok.data, Some(1));

        let failed: Outcome<Vec<u8>> = Outcome::failed_with("boom", Vec::new());
        assert!(!failed.is_success());
        assert_eq!(failed.data, Some(Vec::new()));
        assert_eq!(failed.message.as_deref(), Some("boom"));
    }
}
