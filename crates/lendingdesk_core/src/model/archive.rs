//! Backend-kept notification archive.
//!
//! # Responsibility
//! - Decode the backend's persisted send history and its counters.
//!
//! # Invariants
//! - Archive entries are backend records; they never mix with the
//!   session-scoped `NotificationLog`.
//! - Backend status `sent` (or `success`) reads as `Success`; anything else
//!   reads as `Failed`.

use crate::model::notification::NotificationStatus;
use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 10;

/// Backend-issued archive entry identifier, unrelated to session record ids.
pub type ArchivedNotificationId = String;

/// One notification as the backend stored it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ArchivedNotificationWire")]
pub struct ArchivedNotification {
    pub id: ArchivedNotificationId,
    pub reader_name: String,
    pub reader_email: String,
    pub subject: String,
    pub book_titles: Vec<String>,
    pub status: NotificationStatus,
    #[serde(with = "timestamp::option")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ArchivedNotification {
    pub fn is_success(&self) -> bool {
        self.status == NotificationStatus::Success
    }
}

/// Decode error for archive entries without any identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingArchiveId;

impl Display for MissingArchiveId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "notification record has neither `id` nor `_id`")
    }
}

impl Error for MissingArchiveId {}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArchivedNotificationWire {
    id: Option<String>,
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    #[serde(default)]
    reader_name: String,
    #[serde(default)]
    reader_email: String,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    book_titles: Vec<String>,
    #[serde(default)]
    status: String,
    #[serde(default, with = "timestamp::option")]
    sent_at: Option<DateTime<Utc>>,
    error_message: Option<String>,
}

impl TryFrom<ArchivedNotificationWire> for ArchivedNotification {
    type Error = MissingArchiveId;

    fn try_from(wire: ArchivedNotificationWire) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .or(wire.mongo_id)
            .filter(|value| !value.trim().is_empty())
            .ok_or(MissingArchiveId)?;

        Ok(Self {
            id,
            reader_name: wire.reader_name,
            reader_email: wire.reader_email,
            subject: wire.subject,
            book_titles: wire.book_titles,
            status: archive_status(&wire.status),
            sent_at: wire.sent_at,
            error_message: wire.error_message.filter(|message| !message.is_empty()),
        })
    }
}

fn archive_status(raw: &str) -> NotificationStatus {
    match raw.trim().to_ascii_lowercase().as_str() {
        "sent" | "success" => NotificationStatus::Success,
        _ => NotificationStatus::Failed,
    }
}

/// Backend send counters plus its most recent entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchiveStats {
    pub total_sent: u64,
    pub total_failed: u64,
    pub sent_today: u64,
    pub recent_notifications: Vec<ArchivedNotification>,
}

/// One page of the backend archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArchivePage {
    pub notifications: Vec<ArchivedNotification>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u32,
}

impl Default for ArchivePage {
    fn default() -> Self {
        Self {
            notifications: Vec::new(),
            total: 0,
            page: DEFAULT_PAGE,
            total_pages: 1,
        }
    }
}

/// Page request for the backend archive; pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveQuery {
    pub page: u32,
    pub limit: u32,
}

impl ArchiveQuery {
    /// Builds a query, raising zero `page` or `limit` to 1.
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }
}

impl Default for ArchiveQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE, DEFAULT_PAGE_SIZE)
    }
}
