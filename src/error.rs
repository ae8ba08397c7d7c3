// Error types for the campus Q&A data layer.
// Covers backend status failures, transport failures, and local storage errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication failed: session expired or token invalid")]
    Unauthorized,

    #[error("Request failed with HTTP {status}: {}", .message.as_deref().unwrap_or("no message"))]
    RequestFailed {
        status: u16,
        message: Option<String>,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl ApiError {
    /// Text shown to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "登录已过期，请重新登录".to_string(),
            ApiError::RequestFailed {
                message: Some(message),
                ..
            } if !message.is_empty() => message.clone(),
            ApiError::RequestFailed { .. } => "请求失败".to_string(),
            ApiError::Network(_) => "网络请求失败".to_string(),
            _ => "请求出错".to_string(),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
