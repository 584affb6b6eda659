//! Core logic for the library lending desk.
//! Derives the overdue roster and dispatches overdue notices against the
//! library REST backend.

pub mod clock;
pub mod config;
pub mod http;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod roster;
pub mod service;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigError};
pub use http::{ApiClient, ApiError, ApiResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::archive::{
    ArchivePage, ArchiveQuery, ArchiveStats, ArchivedNotification, ArchivedNotificationId,
};
pub use model::book::{Book, BookDraft, BookId};
pub use model::lending::{
    filter_by_status, search_lendings, LendingDraft, LendingId, LendingStatus, LendingTransaction,
    StatusFilter,
};
pub use model::notification::{
    DeliveryOutcome, DeliveryReceipt, EmailTemplate, NotificationId, NotificationPayload,
    NotificationRecord, NotificationStatus, NotificationSummary,
};
pub use model::overdue::{OverdueBookDetail, OverdueReader};
pub use model::reader::{Reader, ReaderDraft, ReaderId};
pub use notify::archive::{HttpNotificationArchive, NotificationArchive};
pub use notify::channel::{HttpNotificationChannel, NotificationChannel};
pub use notify::template::{render, RenderedNotification};
pub use notify::{ChannelError, ChannelResult};
pub use repo::book_repo::{BookRepository, HttpBookRepository};
pub use repo::lending_repo::{HttpLendingRepository, LendingRepository};
pub use repo::reader_repo::{HttpReaderRepository, ReaderRepository};
pub use repo::RepoResult;
pub use roster::builder::{build_overdue_roster, days_overdue, resolve_book, BookResolution};
pub use roster::filter::filter_roster;
pub use roster::selection::{RosterSelection, SelectionError};
pub use service::notification_service::{NotificationDispatcher, NotificationLog};
pub use service::roster_service::{DeskStats, LibrarySnapshot, RosterService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
