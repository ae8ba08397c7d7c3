// Backend endpoint functions.
// Provides typed methods for every resource path the app consumes.

use std::path::Path;

use serde::Serialize;
use serde_json::json;

use crate::error::Result;

use super::client::{CallOptions, Gateway};
use super::types::{
    AnswerQuery, Envelope, ListQuery, NewQuestion, PageQuery, ProfileUpdate, UploadOutcome,
};

impl Gateway {
    /// Register a new account.
    pub async fn register<B: Serialize + ?Sized>(&self, body: &B) -> Result<Envelope> {
        self.call(&["auth", "register"], CallOptions::post(Some(serde_json::to_value(body)?)))
            .await
    }

    /// Log in; the envelope data carries the token.
    pub async fn login<B: Serialize + ?Sized>(&self, body: &B) -> Result<Envelope> {
        self.call(&["auth", "login"], CallOptions::post(Some(serde_json::to_value(body)?)))
            .await
    }

    pub async fn forgot_password<B: Serialize + ?Sized>(&self, body: &B) -> Result<Envelope> {
        self.call(
            &["auth", "forgot-password"],
            CallOptions::post(Some(serde_json::to_value(body)?)),
        )
        .await
    }

    pub async fn reset_password<B: Serialize + ?Sized>(&self, body: &B) -> Result<Envelope> {
        self.call(
            &["auth", "reset-password"],
            CallOptions::post(Some(serde_json::to_value(body)?)),
        )
        .await
    }

    pub async fn logout(&self) -> Result<Envelope> {
        self.call(&["auth", "logout"], CallOptions::post(None)).await
    }

    /// Get the authenticated user's profile.
    pub async fn get_profile(&self) -> Result<Envelope> {
        self.call(&["users", "profile"], CallOptions::get()).await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Envelope> {
        self.call(&["users", "profile"], CallOptions::put(serde_json::to_value(update)?))
            .await
    }

    /// Upload a new avatar image from a local file.
    ///
    /// An unreadable file surfaces as an `Io` error from the transport.
    pub async fn upload_avatar(&self, file_path: &Path) -> Result<UploadOutcome> {
        self.upload_binary(&["users", "avatar"], file_path, Vec::new(), "avatar")
            .await
    }

    pub async fn get_statistics(&self) -> Result<Envelope> {
        self.call(&["users", "statistics"], CallOptions::get()).await
    }

    /// Get the question feed.
    pub async fn get_questions(&self, query: &ListQuery) -> Result<Envelope> {
        let options = paged(CallOptions::get().query("tab", &query.tab), query.page);
        self.call(&["questions"], options).await
    }

    /// Get a single question. Failures are left to the caller to report.
    pub async fn get_question_detail(&self, id: &str) -> Result<Envelope> {
        self.call(&["questions", id], CallOptions::get().quiet())
            .await
    }

    pub async fn create_question(&self, question: &NewQuestion) -> Result<Envelope> {
        self.call(&["questions"], CallOptions::post(Some(serde_json::to_value(question)?)))
            .await
    }

    /// Get questions asked by the current user.
    pub async fn get_my_questions(&self, page: PageQuery) -> Result<Envelope> {
        self.call(&["questions", "my", "list"], paged(CallOptions::get(), page))
            .await
    }

    /// Get questions that have no answers yet.
    pub async fn get_unanswered_questions(&self, page: PageQuery) -> Result<Envelope> {
        self.call(&["questions", "unanswered", "list"], paged(CallOptions::get(), page))
            .await
    }

    /// Favorite or unfavorite a question.
    pub async fn toggle_favorite(&self, question_id: &str) -> Result<Envelope> {
        self.call(&["questions", question_id, "favorite"], CallOptions::post(None))
            .await
    }

    /// Get answers for a question.
    pub async fn get_answers(&self, question_id: &str, query: &AnswerQuery) -> Result<Envelope> {
        let options = paged(CallOptions::get(), query.page).query("sort", &query.sort);
        self.call(&["questions", question_id, "answers"], options).await
    }

    pub async fn create_answer(&self, question_id: &str, content: &str) -> Result<Envelope> {
        self.call(
            &["questions", question_id, "answers"],
            CallOptions::post(Some(json!({ "content": content }))),
        )
        .await
    }

    /// Get answers written by the current user.
    pub async fn get_my_answers(&self, page: PageQuery) -> Result<Envelope> {
        self.call(&["answers", "my"], paged(CallOptions::get(), page)).await
    }

    pub async fn toggle_like(&self, answer_id: &str) -> Result<Envelope> {
        self.call(&["answers", answer_id, "like"], CallOptions::post(None))
            .await
    }

    pub async fn toggle_dislike(&self, answer_id: &str) -> Result<Envelope> {
        self.call(&["answers", answer_id, "dislike"], CallOptions::post(None))
            .await
    }

    /// Get the current user's favorites.
    pub async fn get_favorites(&self, page: PageQuery) -> Result<Envelope> {
        self.call(&["favorites"], paged(CallOptions::get(), page)).await
    }
}

fn paged(options: CallOptions, page: PageQuery) -> CallOptions {
    options.query("page", page.page).query("limit", page.limit)
}
