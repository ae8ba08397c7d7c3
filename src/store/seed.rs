// Built-in data used when the backend is unreachable or nothing is stored yet.

use serde_json::Map;

use super::models::{Question, UserProfile};
use super::normalize::AvatarPool;

/// Sample questions shown when the feed cannot be fetched.
pub fn seed_questions() -> Vec<Question> {
    vec![
        seed(
            "1",
            "我们学校厉害吗？",
            "我想了解一下我们学校在全国的排名，以及有什么特色专业和优势...",
            "新生小白",
            "/static/avatar/user3.png",
            "2023-03-29",
            156,
            8,
        ),
        seed(
            "2",
            "学校哪个食堂好吃？",
            "开学有两个月了，我住在二号楼附近吃得主要是二食堂，想问问有没有其他更好吃的地方...",
            "小明",
            "/static/avatar/user1.png",
            "2023-04-01",
            120,
            5,
        ),
        seed(
            "3",
            "给你一个亿，你会在家睡觉还是在我们学校上课？",
            "就是想知道大家对于这个问题的看法，如果有一个亿，你们会继续留在学校上课吗...",
            "小红",
            "/static/avatar/user2.png",
            "2023-04-02",
            234,
            12,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn seed(
    id: &str,
    title: &str,
    description: &str,
    user_name: &str,
    avatar: &str,
    created_at: &str,
    view_count: u64,
    answer_count: u64,
) -> Question {
    Question {
        id: id.to_string(),
        raw_id: None,
        title: title.to_string(),
        description: description.to_string(),
        user_name: user_name.to_string(),
        avatar: avatar.to_string(),
        created_at: created_at.to_string(),
        view_count,
        answer_count,
    }
}

/// Profile shown before anything has been fetched or stored.
pub fn default_profile(avatars: &AvatarPool) -> UserProfile {
    UserProfile {
        username: "大学探索者".to_string(),
        avatar: avatars.random(),
        bio: "每一天都是新的开始，探索校园的每一个角落".to_string(),
        birthday: String::new(),
        level: 3,
        level_progress: 45,
        points: 248,
        extra: Map::new(),
    }
}
