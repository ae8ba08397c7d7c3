// Record normalization.
// Turns heterogeneous backend records into the flat shapes the UI renders.
//
// Display names and avatars are found by running an ordered list of
// extractors over the raw record; the first non-empty result wins.

use chrono::Utc;
use rand::Rng;
use serde_json::{Map, Value};

use crate::api::UrlResolver;
use crate::config::Config;

use super::models::{Answer, Favorite, Question, UserProfile, UserStatistics};

/// Label for records without any usable name.
pub const ANONYMOUS_USER: &str = "匿名用户";

const UNTITLED: &str = "无标题";
const NO_DESCRIPTION: &str = "暂无描述";

/// Extractor for one field of a raw record.
pub type Extractor = fn(&Value) -> Option<String>;

/// Display name sources, in priority order.
pub const DISPLAY_NAME_EXTRACTORS: &[Extractor] = &[
    top_level_user_name,
    nested_username,
    nested_nick_name,
    nested_name,
];

/// Avatar sources, in priority order. Only string values count.
pub const AVATAR_EXTRACTORS: &[Extractor] = &[top_level_avatar, nested_avatar];

/// Profile name sources, in priority order.
pub const PROFILE_NAME_EXTRACTORS: &[Extractor] =
    &[profile_username, profile_nick_name, profile_name];

const PROFILE_FIELDS: &[&str] = &[
    "username",
    "avatar",
    "bio",
    "birthday",
    "level",
    "levelProgress",
    "points",
];

/// Run extractors in order and return the first hit.
pub fn first_match(raw: &Value, extractors: &[Extractor]) -> Option<String> {
    extractors.iter().find_map(|extract| extract(raw))
}

/// Pool of bundled placeholder avatars.
#[derive(Debug, Clone)]
pub struct AvatarPool {
    dir: String,
    size: u32,
}

impl AvatarPool {
    pub fn new(dir: &str, size: u32) -> Self {
        Self {
            dir: dir.trim_end_matches('/').to_string(),
            size: size.max(1),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Path of the `n`th avatar, 1-based.
    pub fn path(&self, n: u32) -> String {
        format!("{}/default{}.png", self.dir, n)
    }

    /// Pick an avatar uniformly at random.
    pub fn random(&self) -> String {
        let n = rand::thread_rng().gen_range(1..=self.size);
        self.path(n)
    }

    pub fn contains(&self, path: &str) -> bool {
        (1..=self.size).any(|n| self.path(n) == path)
    }
}

/// Applies the display-shape policy to raw records.
#[derive(Debug, Clone)]
pub struct Normalizer {
    urls: UrlResolver,
    avatars: AvatarPool,
}

impl Normalizer {
    pub fn new(urls: UrlResolver, avatars: AvatarPool) -> Self {
        Self { urls, avatars }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            UrlResolver::new(&config.server_url, &config.static_prefix),
            AvatarPool::new(&config.avatar_dir, config.avatar_pool_size),
        )
    }

    pub fn avatars(&self) -> &AvatarPool {
        &self.avatars
    }

    pub fn urls(&self) -> &UrlResolver {
        &self.urls
    }

    /// Display name, never empty.
    pub fn display_name(&self, raw: &Value) -> String {
        first_match(raw, DISPLAY_NAME_EXTRACTORS).unwrap_or_else(|| ANONYMOUS_USER.to_string())
    }

    /// Resolved avatar URL, or a random placeholder. Never empty.
    pub fn avatar(&self, raw: &Value) -> String {
        match first_match(raw, AVATAR_EXTRACTORS) {
            Some(avatar) => self.urls.resolve(&avatar),
            None => self.avatars.random(),
        }
    }

    pub fn question(&self, raw: &Value) -> Question {
        Question {
            id: identity(raw).unwrap_or_default(),
            raw_id: text(raw, "_id"),
            title: text(raw, "title").unwrap_or_else(|| UNTITLED.to_string()),
            description: text(raw, "description").unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            user_name: self.display_name(raw),
            avatar: self.avatar(raw),
            created_at: text(raw, "createdAt")
                .or_else(|| text(raw, "time"))
                .unwrap_or_default(),
            view_count: counter(raw, "viewCount"),
            answer_count: counter(raw, "answerCount"),
        }
    }

    pub fn answer(&self, raw: &Value) -> Answer {
        let question_id = text(raw, "questionId")
            .or_else(|| text(raw, "question"))
            .or_else(|| raw.get("question").and_then(identity))
            .unwrap_or_default();

        Answer {
            id: identity(raw).unwrap_or_default(),
            raw_id: text(raw, "_id"),
            question_id,
            content: text(raw, "content").unwrap_or_default(),
            user_name: self.display_name(raw),
            avatar: self.avatar(raw),
            time: text(raw, "time")
                .or_else(|| text(raw, "createdAt"))
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
            likes: counter(raw, "likes"),
        }
    }

    /// Favorite reference; None when the record carries no identifier.
    pub fn favorite(&self, raw: &Value) -> Option<Favorite> {
        identity(raw).map(|id| Favorite {
            id,
            raw_id: text(raw, "_id"),
        })
    }

    pub fn profile(&self, raw: &Value) -> UserProfile {
        let extra: Map<String, Value> = raw
            .as_object()
            .map(|object| {
                object
                    .iter()
                    .filter(|(key, _)| !PROFILE_FIELDS.contains(&key.as_str()))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        UserProfile {
            username: first_match(raw, PROFILE_NAME_EXTRACTORS)
                .unwrap_or_else(|| ANONYMOUS_USER.to_string()),
            avatar: self.avatar(raw),
            bio: text(raw, "bio").unwrap_or_default(),
            birthday: text(raw, "birthday").unwrap_or_default(),
            level: integer(raw, "level"),
            level_progress: integer(raw, "levelProgress"),
            points: integer(raw, "points"),
            extra,
        }
    }

    pub fn statistics(&self, raw: &Value) -> UserStatistics {
        UserStatistics {
            questions: counter(raw, "questions"),
            answers: counter(raw, "answers"),
            followers: counter(raw, "followers"),
            following: counter(raw, "following"),
        }
    }
}

/// Application id, falling back to the database-assigned `_id`.
pub fn identity(raw: &Value) -> Option<String> {
    text(raw, "id").or_else(|| text(raw, "_id"))
}

/// Non-negative counter; 0 when absent or not a number.
pub fn counter(raw: &Value, key: &str) -> u64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Signed integer; floats are truncated, 0 when absent or not a number.
fn integer(raw: &Value, key: &str) -> i64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Non-empty string or number field, as text.
fn text(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Non-empty string field.
fn string(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn nested_user(raw: &Value) -> Option<&Value> {
    raw.get("user").filter(|user| user.is_object())
}

fn nested_text(raw: &Value, key: &str) -> Option<String> {
    nested_user(raw).and_then(|user| text(user, key))
}

fn top_level_user_name(raw: &Value) -> Option<String> {
    text(raw, "userName")
}

fn nested_username(raw: &Value) -> Option<String> {
    nested_text(raw, "username")
}

fn nested_nick_name(raw: &Value) -> Option<String> {
    nested_text(raw, "nickName")
}

fn nested_name(raw: &Value) -> Option<String> {
    nested_text(raw, "name")
}

fn top_level_avatar(raw: &Value) -> Option<String> {
    string(raw, "avatar")
}

fn nested_avatar(raw: &Value) -> Option<String> {
    nested_user(raw).and_then(|user| string(user, "avatar"))
}

fn profile_username(raw: &Value) -> Option<String> {
    text(raw, "username")
}

fn profile_nick_name(raw: &Value) -> Option<String> {
    text(raw, "nickName")
}

fn profile_name(raw: &Value) -> Option<String> {
    text(raw, "name")
}
