//! Overdue-notice rendering and the external notification channel.
//!
//! # Responsibility
//! - Render personalized notice text from a template and a roster entry.
//! - Define the contract for the external email service and its HTTP binding.
//! - Read and maintain the backend's own archive of sent notices.
//!
//! # Invariants
//! - Rendering is pure and substitutes every placeholder occurrence.
//! - A channel reports failure through `ChannelError`; it never panics.

use crate::http::ApiError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod archive;
pub mod channel;
pub mod template;

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Failure reported by a notification channel.
#[derive(Debug)]
pub enum ChannelError {
    /// Backend call failed (network, status, decode, session).
    Api(ApiError),
    /// Backend accepted the call but refused delivery.
    Rejected(String),
}

impl ChannelError {
    /// Human-readable reason suitable for the send history.
    pub fn user_message(&self) -> String {
        match self {
            Self::Api(err) => err.user_message(),
            Self::Rejected(message) => message.clone(),
        }
    }
}

impl Display for ChannelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api(err) => write!(f, "{err}"),
            Self::Rejected(message) => write!(f, "notification rejected: {message}"),
        }
    }
}

impl Error for ChannelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Api(err) => Some(err),
            Self::Rejected(_) => None,
        }
    }
}

impl From<ApiError> for ChannelError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}
