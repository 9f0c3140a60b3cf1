//! Error type shared by every session and API operation.
//!
//! ERROR HANDLING
//! ==============
//! Public operations return `Result<_, AuthError>`; nothing is thrown into
//! presentation code. Presentation layers pick `user_message()` for a toast and
//! `error_code()` for logs or metrics.

use std::time::Duration;

use crate::config::ConfigError;
use crate::state::store::StoreError;
use crate::util::validate::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The backend rejected the supplied credentials.
    #[error("login rejected: {0}")]
    Credentials(String),

    /// A 401 on a request made without a session.
    #[error("request requires authentication")]
    Unauthorized,

    /// Refresh failed or the retried request was rejected again; the session
    /// has been logged out.
    #[error("session expired, please log in again")]
    SessionExpired,

    /// The backend answered with a non-success status.
    #[error("request failed with status {status}")]
    Status { status: u16, body: String },

    /// The request never produced a response.
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The response body did not match the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    #[error("session storage failed: {0}")]
    Storage(#[from] StoreError),

    #[error("invalid input: {0}")]
    Validation(FieldErrors),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AuthError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Credentials(_) => "E_CREDENTIALS",
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::SessionExpired => "E_SESSION_EXPIRED",
            Self::Status { .. } => "E_STATUS",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Timeout(_) => "E_TIMEOUT",
            Self::Decode(_) => "E_DECODE",
            Self::Storage(_) => "E_STORAGE",
            Self::Validation(_) => "E_VALIDATION",
            Self::Config(_) => "E_CONFIG",
        }
    }

    /// Whether the same call may succeed if simply repeated later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_) | Self::Status { status: 429 | 500..=599, .. })
    }

    /// Short text suitable for a toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Credentials(message) => message.clone(),
            Self::Unauthorized => "Unauthorized! Please log in.".to_owned(),
            Self::SessionExpired => "Session expired, please log in again.".to_owned(),
            Self::Status { .. } => "Request failed. Please try again later.".to_owned(),
            Self::Transport(_) | Self::Timeout(_) => "No response from server.".to_owned(),
            Self::Decode(_) => "Unexpected response from server.".to_owned(),
            Self::Storage(_) => "Could not save your session. Please try again.".to_owned(),
            Self::Validation(_) => "Please fix the errors before submitting.".to_owned(),
            Self::Config(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;
