//! Lending transaction model and derived loan status.
//!
//! # Responsibility
//! - Decode lending records from the backend.
//! - Derive `active | returned | overdue` at a caller-supplied instant.
//!
//! # Invariants
//! - Status is never stored; it is derived from dates on every call.
//! - A loan with a return date is `Returned` regardless of its due date.
//! - Overdue uses a strict `due_date < now` test.

use crate::model::book::BookId;
use crate::model::reader::ReaderId;
use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Backend-issued lending transaction identifier.
pub type LendingId = String;

/// Derived loan state at a reference instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LendingStatus {
    /// Lent out and not yet due.
    Active,
    /// Book came back.
    Returned,
    /// Not returned and past its due date.
    Overdue,
}

impl LendingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Returned => "returned",
            Self::Overdue => "overdue",
        }
    }
}

impl Display for LendingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lending of one book to one reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LendingWire")]
pub struct LendingTransaction {
    pub id: LendingId,
    #[serde(rename = "bookId")]
    pub book_id: BookId,
    #[serde(rename = "readerId")]
    pub reader_id: ReaderId,
    #[serde(rename = "lendDate", with = "timestamp")]
    pub lend_date: DateTime<Utc>,
    #[serde(rename = "dueDate", with = "timestamp")]
    pub due_date: DateTime<Utc>,
    #[serde(rename = "returnDate", with = "timestamp::option")]
    pub return_date: Option<DateTime<Utc>>,
}

/// Editable lending fields sent on create/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LendingDraft {
    #[serde(rename = "bookId")]
    pub book_id: BookId,
    #[serde(rename = "readerId")]
    pub reader_id: ReaderId,
    #[serde(rename = "lendDate", with = "timestamp")]
    pub lend_date: DateTime<Utc>,
    #[serde(rename = "dueDate", with = "timestamp")]
    pub due_date: DateTime<Utc>,
    #[serde(rename = "returnDate", with = "timestamp::option")]
    pub return_date: Option<DateTime<Utc>>,
}

/// Decode error for lending records without any identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingLendingId;

impl Display for MissingLendingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "lending record has neither `_id` nor `id`")
    }
}

impl Error for MissingLendingId {}

#[derive(Deserialize)]
struct LendingWire {
    #[serde(rename = "_id")]
    mongo_id: Option<String>,
    id: Option<String>,
    #[serde(rename = "bookId")]
    book_id: String,
    #[serde(rename = "readerId")]
    reader_id: String,
    #[serde(rename = "lendDate", with = "timestamp")]
    lend_date: DateTime<Utc>,
    #[serde(rename = "dueDate", with = "timestamp")]
    due_date: DateTime<Utc>,
    #[serde(rename = "returnDate", default, with = "timestamp::option")]
    return_date: Option<DateTime<Utc>>,
}

impl TryFrom<LendingWire> for LendingTransaction {
    type Error = MissingLendingId;

    fn try_from(wire: LendingWire) -> Result<Self, Self::Error> {
        let id = wire
            .id
            .or(wire.mongo_id)
            .filter(|value| !value.trim().is_empty())
            .ok_or(MissingLendingId)?;

        Ok(Self {
            id,
            book_id: wire.book_id,
            reader_id: wire.reader_id,
            lend_date: wire.lend_date,
            due_date: wire.due_date,
            return_date: wire.return_date,
        })
    }
}

impl LendingTransaction {
    pub fn is_returned(&self) -> bool {
        self.return_date.is_some()
    }

    /// Returns whether this loan is unreturned and strictly past due at `now`.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_returned() && now > self.due_date
    }

    /// Derives loan status at `now`.
    pub fn status_at(&self, now: DateTime<Utc>) -> LendingStatus {
        if self.is_returned() {
            LendingStatus::Returned
        } else if now > self.due_date {
            LendingStatus::Overdue
        } else {
            LendingStatus::Active
        }
    }

    /// Case-insensitive substring match on book id or reader id; a blank term matches.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.book_id.to_lowercase().contains(&term)
            || self.reader_id.to_lowercase().contains(&term)
    }

    /// Returns editable fields for create/update requests.
    pub fn to_draft(&self) -> LendingDraft {
        LendingDraft {
            book_id: self.book_id.clone(),
            reader_id: self.reader_id.clone(),
            lend_date: self.lend_date,
            due_date: self.due_date,
            return_date: self.return_date,
        }
    }
}

/// Status filter for lending listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(LendingStatus),
}

impl StatusFilter {
    pub fn matches(self, status: LendingStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(expected) => expected == status,
        }
    }
}

/// Parse error for unknown status filter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatusFilter(pub String);

impl Display for UnknownStatusFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown status filter `{}`; expected all|active|returned|overdue",
            self.0
        )
    }
}

impl Error for UnknownStatusFilter {}

impl FromStr for StatusFilter {
    type Err = UnknownStatusFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Only(LendingStatus::Active)),
            "returned" => Ok(Self::Only(LendingStatus::Returned)),
            "overdue" => Ok(Self::Only(LendingStatus::Overdue)),
            other => Err(UnknownStatusFilter(other.to_string())),
        }
    }
}

/// Returns the transactions whose derived status at `now` passes `filter`.
pub fn filter_by_status(
    transactions: &[LendingTransaction],
    filter: StatusFilter,
    now: DateTime<Utc>,
) -> Vec<&LendingTransaction> {
    transactions
        .iter()
        .filter(|transaction| filter.matches(transaction.status_at(now)))
        .collect()
}

/// Returns the transactions passing both `filter` at `now` and the `term` search.
pub fn search_lendings<'a>(
    transactions: &'a [LendingTransaction],
    filter: StatusFilter,
    term: &str,
    now: DateTime<Utc>,
) -> Vec<&'a LendingTransaction> {
    transactions
        .iter()
        .filter(|transaction| transaction.matches_search(term))
        .filter(|transaction| filter.matches(transaction.status_at(now)))
        .collect()
}

/// Counts transactions that are overdue at `now`.
pub fn count_overdue(transactions: &[LendingTransaction], now: DateTime<Utc>) -> usize {
    transactions
        .iter()
        .filter(|transaction| transaction.is_overdue_at(now))
        .count()
}
