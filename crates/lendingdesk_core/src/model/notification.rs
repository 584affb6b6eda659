//! Notification model: templates, payloads, delivery results, history.
//!
//! # Responsibility
//! - Define what is sent to the notification backend and what comes back.
//! - Define the session history record for each send attempt.
//!
//! # Invariants
//! - Every send attempt yields exactly one `NotificationRecord`.
//! - `error_message` is set iff `status == Failed`.
//! - Record ids are UUID v4 and never reused.

use crate::model::overdue::{OverdueBookDetail, OverdueReader};
use crate::model::reader::ReaderId;
use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Placeholder replaced by the reader's display name.
pub const READER_NAME_PLACEHOLDER: &str = "{readerName}";
/// Placeholder replaced by the rendered overdue book lines.
pub const BOOK_DETAILS_PLACEHOLDER: &str = "{bookDetails}";

const DEFAULT_SUBJECT: &str = "Overdue Books Reminder - Library System";
const DEFAULT_MESSAGE: &str = "Dear {readerName},

This is a friendly reminder that you have overdue books from our library.

Overdue Books:
{bookDetails}

Please return these books as soon as possible to avoid any additional fees.

Thank you for your cooperation.

Best regards,
Library Management System";

/// Session-scoped identifier of one notification attempt.
pub type NotificationId = Uuid;

/// Subject and body template for overdue notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailTemplate {
    pub subject: String,
    /// May contain `{readerName}` and `{bookDetails}` any number of times.
    pub message: String,
}

impl EmailTemplate {
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl Default for EmailTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT, DEFAULT_MESSAGE)
    }
}

/// Request body for one overdue notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    /// Recipient email address.
    pub to: String,
    pub reader_name: String,
    pub subject: String,
    /// Fully rendered message body.
    pub message: String,
    pub overdue_books: Vec<OverdueBookDetail>,
}

/// Successful delivery acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    /// Provider message id, when the backend reports one.
    pub message_id: Option<String>,
}

/// Per-recipient entry of a bulk send response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
}

impl DeliveryOutcome {
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            error: None,
            message_id,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            message_id: None,
        }
    }
}

/// Terminal state of one send attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Success,
    Failed,
}

impl Display for NotificationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Failed => f.write_str("failed"),
        }
    }
}

/// History entry for one send attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: NotificationId,
    pub reader_id: ReaderId,
    pub reader_name: String,
    pub reader_email: String,
    pub book_titles: Vec<String>,
    #[serde(with = "timestamp")]
    pub sent_at: DateTime<Utc>,
    pub status: NotificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl NotificationRecord {
    /// Records a delivered notice for `reader`.
    pub fn success(reader: &OverdueReader, sent_at: DateTime<Utc>) -> Self {
        Self::build(reader, sent_at, NotificationStatus::Success, None)
    }

    /// Records a failed notice for `reader` with a human-readable reason.
    pub fn failure(
        reader: &OverdueReader,
        sent_at: DateTime<Utc>,
        error_message: impl Into<String>,
    ) -> Self {
        Self::build(
            reader,
            sent_at,
            NotificationStatus::Failed,
            Some(error_message.into()),
        )
    }

    pub fn is_success(&self) -> bool {
        self.status == NotificationStatus::Success
    }

    fn build(
        reader: &OverdueReader,
        sent_at: DateTime<Utc>,
        status: NotificationStatus,
        error_message: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            reader_id: reader.reader_id.clone(),
            reader_name: reader.reader_name.clone(),
            reader_email: reader.reader_email.clone(),
            book_titles: reader.book_titles(),
            sent_at,
            status,
            error_message,
        }
    }
}

/// Success/failure counts over a set of records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NotificationSummary {
    pub total: usize,
    pub sent: usize,
    pub failed: usize,
}

impl NotificationSummary {
    pub fn from_records(records: &[NotificationRecord]) -> Self {
        let sent = records.iter().filter(|record| record.is_success()).count();
        Self {
            total: records.len(),
            sent,
            failed: records.len() - sent,
        }
    }
}
