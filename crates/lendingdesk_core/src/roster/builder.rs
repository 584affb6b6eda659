//! Overdue roster builder.
//!
//! # Responsibility
//! - Select unreturned, past-due transactions at a caller-supplied instant.
//! - Resolve each one to its reader and book and group books per reader.
//!
//! # Invariants
//! - Returned loans never appear, whatever their due date.
//! - A loan due exactly at `now` is not overdue.
//! - Each reader appears once, in order of first discovery.
//! - A reader's books keep transaction scan order.
//! - `days_overdue` is the whole-day floor, so a loan less than a day late
//!   is on the roster with `0`.

use crate::model::book::Book;
use crate::model::lending::LendingTransaction;
use crate::model::overdue::{OverdueBookDetail, OverdueReader};
use crate::model::reader::Reader;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// One way of matching a transaction's `book_id` against the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookResolution {
    /// `book_id` equals the catalog id.
    ById,
    /// `book_id` equals the catalog title.
    ///
    /// Compatibility shim: some upstream lending records carry the book title
    /// where the id belongs. This is a data-quality smell, kept until the
    /// backend stops emitting such records.
    ByTitle,
}

/// Resolution strategies, tried in order until one matches.
pub const BOOK_RESOLUTION_ORDER: [BookResolution; 2] =
    [BookResolution::ById, BookResolution::ByTitle];

/// Catalog lookup tables for every resolution strategy.
struct BookIndex<'a> {
    by_id: HashMap<&'a str, &'a Book>,
    by_title: HashMap<&'a str, &'a Book>,
}

impl<'a> BookIndex<'a> {
    fn new(books: &'a [Book]) -> Self {
        let mut by_id = HashMap::with_capacity(books.len());
        let mut by_title = HashMap::with_capacity(books.len());
        for book in books {
            // First catalog entry wins on duplicate keys.
            by_id.entry(book.id.as_str()).or_insert(book);
            if !book.title.is_empty() {
                by_title.entry(book.title.as_str()).or_insert(book);
            }
        }
        Self { by_id, by_title }
    }

    fn resolve(&self, key: &str) -> Option<&'a Book> {
        BOOK_RESOLUTION_ORDER
            .iter()
            .find_map(|strategy| self.lookup(*strategy, key))
    }

    fn lookup(&self, strategy: BookResolution, key: &str) -> Option<&'a Book> {
        match strategy {
            BookResolution::ById => self.by_id.get(key).copied(),
            BookResolution::ByTitle => self.by_title.get(key).copied(),
        }
    }
}

/// Resolves `key` against `books` using [`BOOK_RESOLUTION_ORDER`].
pub fn resolve_book<'a>(books: &'a [Book], key: &str) -> Option<&'a Book> {
    BookIndex::new(books).resolve(key)
}

/// Whole days between `due_date` and `now`, truncated toward negative infinity.
pub fn days_overdue(due_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - due_date).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

/// Builds the overdue roster at `now`.
///
/// `transactions` is the full, unfiltered list. `readers` and `books` are
/// lookup sets. Transactions whose reader or book cannot be resolved are
/// excluded; only a `debug` log line records the gap.
pub fn build_overdue_roster(
    transactions: &[LendingTransaction],
    readers: &[Reader],
    books: &[Book],
    now: DateTime<Utc>,
) -> Vec<OverdueReader> {
    let mut reader_index: HashMap<&str, &Reader> = HashMap::with_capacity(readers.len());
    for reader in readers {
        reader_index.entry(reader.id.as_str()).or_insert(reader);
    }
    let book_index = BookIndex::new(books);

    let mut roster: Vec<OverdueReader> = Vec::new();
    let mut bucket_of: HashMap<&str, usize> = HashMap::new();
    let mut skipped = 0_usize;

    for transaction in transactions {
        if !transaction.is_overdue_at(now) {
            continue;
        }

        let reader = reader_index.get(transaction.reader_id.as_str()).copied();
        let book = book_index.resolve(&transaction.book_id);
        let (Some(reader), Some(book)) = (reader, book) else {
            skipped += 1;
            debug!(
                "event=roster_gap module=roster transaction_id={} reader_found={} book_found={}",
                transaction.id,
                reader.is_some(),
                book.is_some()
            );
            continue;
        };

        let slot = *bucket_of
            .entry(transaction.reader_id.as_str())
            .or_insert_with(|| {
                roster.push(OverdueReader::new(
                    transaction.reader_id.clone(),
                    reader.name.clone(),
                    reader.email.clone(),
                ));
                roster.len() - 1
            });

        roster[slot].push_book(OverdueBookDetail {
            book_id: transaction.book_id.clone(),
            book_title: book.title.clone(),
            due_date: transaction.due_date,
            lend_date: transaction.lend_date,
            days_overdue: days_overdue(transaction.due_date, now),
        });
    }

    debug!(
        "event=roster_build module=roster status=ok transactions={} readers={} skipped={}",
        transactions.len(),
        roster.len(),
        skipped
    );
    roster
}
