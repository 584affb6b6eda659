//! Authenticated JSON transport to the library backend.
//!
//! # Responsibility
//! - Own the single HTTP channel every backend collaborator goes through.
//! - Attach the bearer token and refresh it once when the backend answers 403.
//!
//! # Invariants
//! - A request is replayed at most once, and only after a successful refresh.
//! - Non-2xx responses surface as `ApiError::Status` with the backend message.
//! - A refresh rejected with 401 surfaces as `ApiError::SessionExpired`.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod client;

pub use client::ApiClient;

pub type ApiResult<T> = Result<T, ApiError>;

/// Transport-level error for backend calls.
#[derive(Debug)]
pub enum ApiError {
    /// Base URL or request path cannot form a valid URL.
    InvalidUrl(String),
    /// Connection, timeout or TLS failure before a status was received.
    Transport(reqwest::Error),
    /// Backend answered with a non-success status.
    Status { status: u16, message: String },
    /// Token refresh was rejected; the operator must log in again.
    SessionExpired,
    /// Response body did not match the expected shape.
    Decode(String),
}

impl ApiError {
    /// Returns the most user-presentable message for this error.
    ///
    /// For status errors this is the backend's own `message` text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } if !message.trim().is_empty() => message.clone(),
            other => other.to_string(),
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl(message) => write!(f, "invalid backend url: {message}"),
            Self::Transport(err) => write!(f, "backend unreachable: {err}"),
            Self::Status { status, message } => {
                write!(f, "backend returned {status}: {message}")
            }
            Self::SessionExpired => write!(f, "session expired; log in again"),
            Self::Decode(message) => write!(f, "unexpected backend response: {message}"),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            Self::InvalidUrl(_) | Self::Status { .. } | Self::SessionExpired | Self::Decode(_) => {
                None
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}
