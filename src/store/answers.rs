// Answer operations on the store.
// Answers are not held in state; callers re-fetch after mutating.

use serde_json::Value;
use tracing::debug;

use crate::api::{AnswerQuery, Envelope, PageQuery};
use crate::error::Result;

use super::models::{AnswerPage, LikeState, Outcome};
use super::normalize::{counter, identity};
use super::{Operation, Resource, Store, accepted};

impl Store {
    /// One page of answers to a question.
    pub async fn get_answers(&self, question_id: &str, query: &AnswerQuery) -> Outcome<AnswerPage> {
        let _guard = self.begin(Resource::Answers);
        let result = self.gateway.get_answers(question_id, query).await;
        let outcome = self.answer_page(
            Operation::GetAnswers,
            result,
            "获取回答列表失败",
            "获取回答列表出错",
        );
        if let Some(page) = &outcome.data {
            debug!(question_id, count = page.answers.len(), total = page.total, "answers loaded");
        }
        outcome
    }

    /// Answers written by the current user.
    pub async fn get_my_answers(&self, page: PageQuery) -> Outcome<AnswerPage> {
        let result = self.gateway.get_my_answers(page).await;
        self.answer_page(
            Operation::GetMyAnswers,
            result,
            "获取我的回答列表失败",
            "获取我的回答列表出错",
        )
    }

    /// Post an answer. Returns the new answer's id.
    pub async fn create_answer(&self, question_id: &str, content: &str) -> Outcome<String> {
        let result = self.gateway.create_answer(question_id, content).await;
        match accepted(Operation::CreateAnswer, result, "发布回答失败", "发布回答出错") {
            Ok(envelope) => Outcome::ok(identity(envelope.data()).unwrap_or_default()),
            Err(message) => Outcome::failed(message),
        }
    }

    pub async fn toggle_like(&self, answer_id: &str) -> Outcome<LikeState> {
        let result = self.gateway.toggle_like(answer_id).await;
        match accepted(Operation::ToggleLike, result, "操作失败", "操作出错") {
            Ok(envelope) => Outcome::ok(LikeState {
                is_liked: flag(envelope.data(), "isLiked"),
                likes: counter(envelope.data(), "likes"),
            }),
            Err(message) => Outcome::failed(message),
        }
    }

    /// Returns whether the answer is now disliked.
    pub async fn toggle_dislike(&self, answer_id: &str) -> Outcome<bool> {
        let result = self.gateway.toggle_dislike(answer_id).await;
        match accepted(Operation::ToggleDislike, result, "操作失败", "操作出错") {
            Ok(envelope) => Outcome::ok(flag(envelope.data(), "isDisliked")),
            Err(message) => Outcome::failed(message),
        }
    }

    fn answer_page(
        &self,
        operation: Operation,
        result: Result<Envelope>,
        rejected: &str,
        errored: &str,
    ) -> Outcome<AnswerPage> {
        let envelope = match accepted(operation, result, rejected, errored) {
            Ok(envelope) => envelope,
            Err(message) => return Outcome::failed_with(message, AnswerPage::default()),
        };

        let answers: Vec<_> = envelope
            .data()
            .get("answers")
            .and_then(Value::as_array)
            .map(|raw| raw.iter().map(|a| self.normalizer.answer(a)).collect())
            .unwrap_or_default();
        let total = match envelope.data().get("total") {
            Some(Value::Number(_)) => counter(envelope.data(), "total"),
            _ => answers.len() as u64,
        };
        Outcome::ok(AnswerPage { total, answers })
    }
}

fn flag(raw: &Value, key: &str) -> bool {
    raw.get(key).and_then(Value::as_bool).unwrap_or(false)
}
