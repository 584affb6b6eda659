//! Roster and desk statistics use-case service.
//!
//! # Responsibility
//! - Fetch readers, books and lendings and derive the overdue roster.
//! - Compute the desk dashboard counters.
//!
//! # Invariants
//! - A failed fetch aborts the whole operation; no partial snapshot is used.
//! - Derivation uses the caller's `now`, never the wall clock.

use crate::http::ApiResult;
use crate::model::book::Book;
use crate::model::lending::{count_overdue, search_lendings, LendingTransaction, StatusFilter};
use crate::model::overdue::OverdueReader;
use crate::model::reader::Reader;
use crate::repo::book_repo::BookRepository;
use crate::repo::lending_repo::LendingRepository;
use crate::repo::reader_repo::ReaderRepository;
use crate::roster::builder::build_overdue_roster;
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Serialize;
use std::time::Instant;

/// Everything the roster needs, fetched in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySnapshot {
    pub transactions: Vec<LendingTransaction>,
    pub readers: Vec<Reader>,
    pub books: Vec<Book>,
}

impl LibrarySnapshot {
    /// Derives the overdue roster from this snapshot at `now`.
    pub fn overdue_roster(&self, now: DateTime<Utc>) -> Vec<OverdueReader> {
        build_overdue_roster(&self.transactions, &self.readers, &self.books, now)
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeskStats {
    pub total_books: usize,
    pub registered_readers: usize,
    /// Every lending transaction on record, returned ones included.
    pub lending_transactions: usize,
    pub overdue_transactions: usize,
}

/// Roster service facade over the three backend repositories.
pub struct RosterService<R, B, L>
where
    R: ReaderRepository,
    B: BookRepository,
    L: LendingRepository,
{
    readers: R,
    books: B,
    lendings: L,
}

impl<R, B, L> RosterService<R, B, L>
where
    R: ReaderRepository,
    B: BookRepository,
    L: LendingRepository,
{
    pub fn new(readers: R, books: B, lendings: L) -> Self {
        Self {
            readers,
            books,
            lendings,
        }
    }

    /// Fetches transactions, readers and books.
    ///
    /// # Errors
    /// - Returns the first fetch error unchanged.
    pub fn load_snapshot(&self) -> ApiResult<LibrarySnapshot> {
        let started_at = Instant::now();
        let result = self.fetch_all();
        match &result {
            Ok(snapshot) => info!(
                "event=snapshot_load module=service status=ok transactions={} readers={} books={} duration_ms={}",
                snapshot.transactions.len(),
                snapshot.readers.len(),
                snapshot.books.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=snapshot_load module=service status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Fetches a fresh snapshot and derives the overdue roster at `now`.
    pub fn overdue_roster(&self, now: DateTime<Utc>) -> ApiResult<Vec<OverdueReader>> {
        Ok(self.load_snapshot()?.overdue_roster(now))
    }

    /// Lists lending transactions whose derived status at `now` passes `filter`.
    pub fn lendings_with_status(
        &self,
        filter: StatusFilter,
        now: DateTime<Utc>,
    ) -> ApiResult<Vec<LendingTransaction>> {
        self.search_lendings(filter, "", now)
    }

    /// Lists lending transactions passing `filter` whose book or reader id contains `term`.
    pub fn search_lendings(
        &self,
        filter: StatusFilter,
        term: &str,
        now: DateTime<Utc>,
    ) -> ApiResult<Vec<LendingTransaction>> {
        let transactions = self.lendings.list_lendings()?;
        Ok(search_lendings(&transactions, filter, term, now)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Computes dashboard counters at `now`.
    pub fn dashboard_stats(&self, now: DateTime<Utc>) -> ApiResult<DeskStats> {
        let snapshot = self.load_snapshot()?;
        Ok(DeskStats {
            total_books: snapshot.books.len(),
            registered_readers: snapshot.readers.len(),
            lending_transactions: snapshot.transactions.len(),
            overdue_transactions: count_overdue(&snapshot.transactions, now),
        })
    }

    pub fn reader_repository(&self) -> &R {
        &self.readers
    }

    pub fn book_repository(&self) -> &B {
        &self.books
    }

    pub fn lending_repository(&self) -> &L {
        &self.lendings
    }

    fn fetch_all(&self) -> ApiResult<LibrarySnapshot> {
        Ok(LibrarySnapshot {
            transactions: self.lendings.list_lendings()?,
            readers: self.readers.list_readers()?,
            books: self.books.list_books()?,
        })
    }
}
