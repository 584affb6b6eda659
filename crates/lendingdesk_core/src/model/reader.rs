//! Reader (library member) model.
//!
//! # Responsibility
//! - Decode reader records from the backend's mixed id conventions.
//! - Decide whether a reader's email address is usable for delivery.
//!
//! # Invariants
//! - `id` is never empty for a decoded reader.
//! - `email` may be empty or malformed; callers check `has_deliverable_email`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Backend-issued reader identifier.
pub type ReaderId = String;

/// Library member who can borrow books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReaderWire")]
pub struct Reader {
    pub id: ReaderId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// Editable reader fields sent on create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReaderDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

/// Decode error for reader records without any identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingReaderId;

impl Display for MissingReaderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "reader record has neither `_id` nor `id`")
    }
}

impl Error for MissingReaderId {}

#[derive(Deserialize)]
struct ReaderWire {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    address: String,
}

impl TryFrom<ReaderWire> for Reader {
    type Error = MissingReaderId;

    fn try_from(wire: ReaderWire) -> Result<Self, Self::Error> {
        // Backend reader lists only carry `_id`; older payloads carry `id`.
        let id = wire
            .mongo_id
            .or(wire.id)
            .filter(|value| !value.trim().is_empty())
            .ok_or(MissingReaderId)?;

        Ok(Self {
            id,
            name: wire.name,
            email: wire.email,
            phone: wire.phone,
            address: wire.address,
        })
    }
}

impl Reader {
    /// Creates a reader with only the fields needed for notification.
    pub fn new(id: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: String::new(),
            address: String::new(),
        }
    }

    /// Returns editable fields for create/update requests.
    pub fn to_draft(&self) -> ReaderDraft {
        ReaderDraft {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
        }
    }

    pub fn has_deliverable_email(&self) -> bool {
        is_deliverable_email(&self.email)
    }
}

/// Returns whether `email` looks like a deliverable address.
///
/// This is a shape check only (`local@domain.tld`, no whitespace).
pub fn is_deliverable_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}
