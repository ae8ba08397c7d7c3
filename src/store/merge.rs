// Merge policies for applying backend results to local state.
// Each store operation declares how its result lands in the store.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::{ApiError, Result};

/// How an incoming value is applied to the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// Incoming value wins wholesale.
    Replace,
    /// Only the named (serialized) field is taken from the incoming value.
    PatchField(&'static str),
    /// Local state is left alone.
    Noop,
}

/// Store operations, for declaring their merge policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchQuestions,
    FetchQuestionDetail,
    FetchMyQuestions,
    FetchUnansweredQuestions,
    AddQuestion,
    FetchUserProfile,
    UpdateUserProfile,
    UploadAvatar,
    CheckDefaultAvatar,
    FetchStatistics,
    FetchFavorites,
    ToggleFavorite,
    GetAnswers,
    GetMyAnswers,
    CreateAnswer,
    ToggleLike,
    ToggleDislike,
    Login,
    Logout,
}

impl Operation {
    pub fn merge_policy(self) -> MergePolicy {
        match self {
            Operation::FetchQuestions
            | Operation::FetchUserProfile
            | Operation::UpdateUserProfile
            | Operation::FetchFavorites => MergePolicy::Replace,
            Operation::UploadAvatar | Operation::CheckDefaultAvatar => {
                MergePolicy::PatchField("avatar")
            }
            // These either re-fetch through another operation or touch nothing
            Operation::FetchQuestionDetail
            | Operation::FetchMyQuestions
            | Operation::FetchUnansweredQuestions
            | Operation::AddQuestion
            | Operation::FetchStatistics
            | Operation::ToggleFavorite
            | Operation::GetAnswers
            | Operation::GetMyAnswers
            | Operation::CreateAnswer
            | Operation::ToggleLike
            | Operation::ToggleDislike
            | Operation::Login
            | Operation::Logout => MergePolicy::Noop,
        }
    }
}

/// Apply `incoming` to `current` under `policy`.
pub fn merge<T>(current: &T, incoming: T, policy: MergePolicy) -> Result<T>
where
    T: Clone + Serialize + DeserializeOwned,
{
    match policy {
        MergePolicy::Replace => Ok(incoming),
        MergePolicy::Noop => Ok(current.clone()),
        MergePolicy::PatchField(field) => {
            let mut target = serde_json::to_value(current)?;
            let source = serde_json::to_value(&incoming)?;
            let value = source.get(field).cloned().unwrap_or(Value::Null);
            match target.as_object_mut() {
                Some(object) => {
                    object.insert(field.to_string(), value);
                }
                None => {
                    return Err(ApiError::Other(format!(
                        "cannot patch field '{}' of a non-object value",
                        field
                    )));
                }
            }
            Ok(serde_json::from_value(target)?)
        }
    }
}
