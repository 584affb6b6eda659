//! Book catalog model.
//!
//! # Responsibility
//! - Decode catalog records, tolerating the backend's two availability shapes.
//!
//! # Invariants
//! - `id` is never empty for a decoded book.
//! - `available` mirrors the backend `status` flag only. Copy counts are
//!   carried verbatim and never reconciled against it.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Backend-issued book identifier.
pub type BookId = String;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BookWire")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// `true` when the book can be lent, `false` when checked out.
    #[serde(rename = "status")]
    pub available: bool,
    #[serde(rename = "availableCopies", skip_serializing_if = "Option::is_none")]
    pub available_copies: Option<u32>,
    #[serde(rename = "totalCopies", skip_serializing_if = "Option::is_none")]
    pub total_copies: Option<u32>,
}

/// Editable book fields sent on create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub status: bool,
}

/// Decode error for book records without any identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingBookId;

impl Display for MissingBookId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "book record has neither `_id` nor `id`")
    }
}

impl Error for MissingBookId {}

#[derive(Deserialize)]
#[serde(untagged)]
enum StatusWire {
    Flag(bool),
    Label(String),
}

#[derive(Deserialize)]
struct BookWire {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    title: Option<String>,
    name: Option<String>,
    #[serde(default)]
    author: String,
    #[serde(default)]
    isbn: String,
    status: Option<StatusWire>,
    #[serde(rename = "availableCopies")]
    available_copies: Option<u32>,
    #[serde(rename = "totalCopies")]
    total_copies: Option<u32>,
}

impl TryFrom<BookWire> for Book {
    type Error = MissingBookId;

    fn try_from(wire: BookWire) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .or(wire.mongo_id)
            .filter(|value| !value.trim().is_empty())
            .ok_or(MissingBookId)?;

        let available = match wire.status {
            Some(StatusWire::Flag(flag)) => flag,
            Some(StatusWire::Label(label)) => label.trim().eq_ignore_ascii_case("available"),
            None => true,
        };

        Ok(Self {
            id,
            title: wire.title.or(wire.name).unwrap_or_default(),
            author: wire.author,
            isbn: wire.isbn,
            available,
            available_copies: wire.available_copies,
            total_copies: wire.total_copies,
        })
    }
}

impl Book {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            author: String::new(),
            isbn: String::new(),
            available: true,
            available_copies: None,
            total_copies: None,
        }
    }

    /// Returns editable fields for create/update requests.
    pub fn to_draft(&self) -> BookDraft {
        BookDraft {
            title: self.title.clone(),
            author: self.author.clone(),
            isbn: self.isbn.clone(),
            status: self.available,
        }
    }
}
