// Question operations on the store.

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::{Envelope, ListQuery, NewQuestion, PageQuery};
use crate::error::Result;

use super::models::{Outcome, Question, StoreState};
use super::normalize::identity;
use super::seed::seed_questions;
use super::{LoadingGuard, Operation, Resource, Store, accepted};

impl Store {
    /// Fetch the question feed and replace the local list.
    ///
    /// Any failure replaces the list with the built-in sample questions.
    pub async fn fetch_questions(&self, query: &ListQuery) -> Vec<Question> {
        let Some(guard) = self.begin(Resource::Questions) else {
            return self.questions();
        };
        self.load_questions(query, guard).await
    }

    /// Fetch the feed after any running feed fetch has finished.
    async fn refresh_questions(&self, query: &ListQuery) -> Vec<Question> {
        let guard = self.begin_after_running(Resource::Questions).await;
        self.load_questions(query, guard).await
    }

    async fn load_questions(&self, query: &ListQuery, _guard: LoadingGuard<'_>) -> Vec<Question> {
        let incoming = match self.gateway.get_questions(query).await {
            Ok(envelope) if envelope.is_success() => match self.question_list(&envelope) {
                Some(questions) => {
                    debug!(count = questions.len(), "question feed loaded");
                    questions
                }
                None => {
                    warn!("question feed has no question list, using sample questions");
                    seed_questions()
                }
            },
            Ok(envelope) => {
                warn!(
                    code = envelope.code,
                    message = ?envelope.message,
                    "question feed rejected, using sample questions"
                );
                seed_questions()
            }
            Err(e) => {
                error!(error = %e, "question feed failed, using sample questions");
                seed_questions()
            }
        };

        self.apply(
            Operation::FetchQuestions,
            |state: &mut StoreState| &mut state.questions,
            incoming,
        );
        self.questions()
    }

    /// Fetch one question, falling back to locally known questions.
    pub async fn fetch_question_detail(&self, id: &str) -> Option<Question> {
        let id = id.trim();
        if id.is_empty() {
            warn!("question detail requested without an id");
            return None;
        }

        match self.gateway.get_question_detail(id).await {
            Ok(envelope) if envelope.is_success() && envelope.data().is_object() => {
                Some(self.normalizer.question(envelope.data()))
            }
            Ok(envelope) => {
                warn!(id, code = envelope.code, "question detail rejected, searching local list");
                self.local_question_detail(id)
            }
            Err(e) => {
                warn!(id, error = %e, "question detail failed, searching local list");
                self.local_question_detail(id)
            }
        }
    }

    /// Look a question up by `id` or `_id` in the current list, then the samples.
    pub fn local_question_detail(&self, id: &str) -> Option<Question> {
        let id = id.trim();
        let found = {
            let state = self.state.borrow();
            state.questions.iter().find(|q| q.has_id(id)).cloned()
        };
        if let Some(question) = found {
            return Some(question);
        }

        if let Some(question) = seed_questions().into_iter().find(|q| q.has_id(id)) {
            return Some(question);
        }

        if looks_like_database_id(id) {
            info!(id, "question not found locally");
        } else {
            debug!(id, "no local question with this id");
        }
        None
    }

    /// Questions asked by the current user.
    pub async fn fetch_my_questions(&self, page: PageQuery) -> Outcome<Vec<Question>> {
        let result = self.gateway.get_my_questions(page).await;
        self.question_page(
            Operation::FetchMyQuestions,
            result,
            "获取我的提问列表失败",
            "获取我的提问列表出错",
        )
    }

    /// Questions still waiting for an answer.
    pub async fn fetch_unanswered_questions(&self, page: PageQuery) -> Outcome<Vec<Question>> {
        let result = self.gateway.get_unanswered_questions(page).await;
        self.question_page(
            Operation::FetchUnansweredQuestions,
            result,
            "获取可回答的问题列表失败",
            "获取可回答的问题列表出错",
        )
    }

    /// Publish a question, then refresh the feed. Returns the new id.
    pub async fn add_question(&self, question: &NewQuestion) -> Outcome<String> {
        let result = self.gateway.create_question(question).await;
        let envelope =
            match accepted(Operation::AddQuestion, result, "发布问题失败", "发布问题出错") {
                Ok(envelope) => envelope,
                Err(message) => return Outcome::failed(message),
            };

        self.refresh_questions(&ListQuery::default()).await;
        Outcome::ok(identity(envelope.data()).unwrap_or_default())
    }

    fn question_list(&self, envelope: &Envelope) -> Option<Vec<Question>> {
        envelope
            .data()
            .get("questions")
            .and_then(Value::as_array)
            .map(|raw| raw.iter().map(|q| self.normalizer.question(q)).collect())
    }

    fn question_page(
        &self,
        operation: Operation,
        result: Result<Envelope>,
        rejected: &str,
        errored: &str,
    ) -> Outcome<Vec<Question>> {
        match accepted(operation, result, rejected, errored) {
            Ok(envelope) => Outcome::ok(self.question_list(&envelope).unwrap_or_default()),
            Err(message) => Outcome::failed_with(message, Vec::new()),
        }
    }
}

/// A database-assigned identifier: at least 24 hex digits.
pub fn looks_like_database_id(id: &str) -> bool {
    id.len() >= 24 && id.chars().all(|c| c.is_ascii_hexdigit())
}
