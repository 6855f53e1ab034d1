//! Error taxonomy for the client.
//!
//! Every failure is an [`ApiError`]. [`ApiError::kind`] classifies it for
//! callers that branch on the category, and [`ApiError::user_message`]
//! derives the short text a screen shows to the user.

use shared::{ApiErrorBody, ValidationError};
use thiserror::Error;

use crate::services::session::SessionError;

/// Shown for any failure where the server never answered
pub const TRANSPORT_MESSAGE: &str = "Could not reach the server. Check your connection and try again.";

/// Shown when an authenticated call is made without a session identifier
pub const NOT_SIGNED_IN_MESSAGE: &str = "You are not signed in";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-side precondition not met; no request was sent
    Precondition,
    /// The request never reached the server or no response came back
    Transport,
    /// The server answered with an error status or a malformed body
    Server,
    /// Input rejected before serialization; no request was sent
    Validation,
    /// Local session storage failed
    Storage,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Precondition(String),

    #[error("invalid API URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP request itself failed (network, DNS, TLS, etc.)
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response. Displays the server-supplied message.
    #[error("{}", server_message(.status, .body))]
    Server { status: u16, body: ApiErrorBody },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("{}", validation_message(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn not_signed_in() -> Self {
        ApiError::Precondition(NOT_SIGNED_IN_MESSAGE.to_string())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Precondition(_) | ApiError::InvalidUrl { .. } => ErrorKind::Precondition,
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::Server { .. } | ApiError::Decode(_) | ApiError::UnexpectedResponse(_) => {
                ErrorKind::Server
            }
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Session(_) => ErrorKind::Storage,
        }
    }

    /// HTTP status of a server-reported error
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short, non-empty message suitable for an alert or banner
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Precondition(message) => message.clone(),
            ApiError::InvalidUrl { .. } => "The app is not configured correctly".to_string(),
            ApiError::Transport(_) => TRANSPORT_MESSAGE.to_string(),
            ApiError::Server { status, body } => server_message(status, body),
            ApiError::Decode(_) | ApiError::UnexpectedResponse(_) => {
                "The server sent an unexpected response".to_string()
            }
            ApiError::Validation(errors) => validation_message(errors),
            ApiError::Session(_) => "Could not access the saved session".to_string(),
        }
    }
}

impl From<Vec<ValidationError>> for ApiError {
    fn from(errors: Vec<ValidationError>) -> Self {
        ApiError::Validation(errors)
    }
}

fn server_message(status: &u16, body: &ApiErrorBody) -> String {
    body.message()
        .unwrap_or_else(|| format!("Request failed with status {}", status))
}

fn validation_message(errors: &[ValidationError]) -> String {
    if errors.is_empty() {
        return "Invalid input".to_string();
    }
    errors
        .iter()
        .map(ValidationError::message)
        .collect::<Vec<_>>()
        .join("; ")
}
