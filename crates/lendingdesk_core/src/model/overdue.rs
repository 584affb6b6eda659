//! Overdue roster projection.
//!
//! # Responsibility
//! - Define the per-reader grouping of overdue loans.
//!
//! # Invariants
//! - `total_overdue_books == overdue_books.len()` for every roster entry.
//! - `days_overdue >= 0` for every detail produced by the roster builder.
//! - Roster entries are rebuilt per computation and never persisted.

use crate::model::book::BookId;
use crate::model::reader::ReaderId;
use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One overdue loan as shown to the librarian and sent to the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueBookDetail {
    pub book_id: BookId,
    pub book_title: String,
    #[serde(with = "timestamp")]
    pub due_date: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub lend_date: DateTime<Utc>,
    /// Whole days past due, truncated.
    pub days_overdue: i64,
}

/// A reader holding at least one overdue book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueReader {
    pub reader_id: ReaderId,
    pub reader_name: String,
    pub reader_email: String,
    /// Insertion order of the transaction scan.
    pub overdue_books: Vec<OverdueBookDetail>,
    pub total_overdue_books: usize,
}

impl OverdueReader {
    /// Starts an empty bucket for one reader.
    pub fn new(
        reader_id: impl Into<String>,
        reader_name: impl Into<String>,
        reader_email: impl Into<String>,
    ) -> Self {
        Self {
            reader_id: reader_id.into(),
            reader_name: reader_name.into(),
            reader_email: reader_email.into(),
            overdue_books: Vec::new(),
            total_overdue_books: 0,
        }
    }

    /// Appends one overdue loan, keeping the count in step.
    pub fn push_book(&mut self, detail: OverdueBookDetail) {
        self.overdue_books.push(detail);
        self.total_overdue_books = self.overdue_books.len();
    }

    pub fn book_titles(&self) -> Vec<String> {
        self.overdue_books
            .iter()
            .map(|book| book.book_title.clone())
            .collect()
    }
}
