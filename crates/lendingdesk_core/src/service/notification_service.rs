//! Overdue notice dispatch and session history.
//!
//! # Responsibility
//! - Send one notice or a batch of notices for roster entries.
//! - Turn every attempt, successful or not, into a `NotificationRecord`.
//! - Keep the session history as an append-only, newest-first log.
//!
//! # Invariants
//! - Every attempted reader yields exactly one record, in input order.
//! - Send failures are recorded, never returned as errors.
//! - One recipient's failure never skips another recipient.
//! - No automatic retries; retrying means sending again.
//! - History lives only as long as the dispatcher.

use crate::clock::{Clock, SystemClock};
use crate::logging::sanitize_message;
use crate::model::notification::{
    DeliveryOutcome, DeliveryReceipt, EmailTemplate, NotificationPayload, NotificationRecord,
    NotificationSummary,
};
use crate::model::overdue::OverdueReader;
use crate::model::reader::is_deliverable_email;
use crate::notify::channel::NotificationChannel;
use crate::notify::template::{build_payload, render, RenderedNotification};
use crate::notify::ChannelResult;
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::collections::VecDeque;

const UNKNOWN_SEND_ERROR: &str = "Unknown error occurred while sending notification";
const INVALID_EMAIL_ERROR: &str = "Reader has no valid email address";
const MISSING_RESULT_ERROR: &str = "No delivery result returned for this reader";
const MAX_LOGGED_ERROR_CHARS: usize = 200;

/// Append-only send history, newest first.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    records: VecDeque<NotificationRecord>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `record` as the newest entry.
    pub fn record(&mut self, record: NotificationRecord) {
        self.records.push_front(record);
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl Iterator<Item = &NotificationRecord> {
        self.records.iter()
    }

    /// Returns the newest record, if any.
    pub fn latest(&self) -> Option<&NotificationRecord> {
        self.records.front()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Snapshot of the history, newest first.
    pub fn to_vec(&self) -> Vec<NotificationRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn summary(&self) -> NotificationSummary {
        let sent = self.records.iter().filter(|record| record.is_success()).count();
        NotificationSummary {
            total: self.records.len(),
            sent,
            failed: self.records.len() - sent,
        }
    }
}

/// Dispatches overdue notices through a [`NotificationChannel`].
pub struct NotificationDispatcher<C: NotificationChannel, K: Clock = SystemClock> {
    channel: C,
    clock: K,
    log: NotificationLog,
}

impl<C: NotificationChannel> NotificationDispatcher<C, SystemClock> {
    /// Creates a dispatcher stamping records with wall-clock time.
    pub fn new(channel: C) -> Self {
        Self::with_clock(channel, SystemClock)
    }
}

impl<C: NotificationChannel, K: Clock> NotificationDispatcher<C, K> {
    pub fn with_clock(channel: C, clock: K) -> Self {
        Self {
            channel,
            clock,
            log: NotificationLog::new(),
        }
    }

    /// Renders the notice `reader` would receive, without sending it.
    pub fn preview(&self, reader: &OverdueReader, template: &EmailTemplate) -> RenderedNotification {
        render(reader, template)
    }

    /// Sends one notice and records the outcome.
    ///
    /// Never fails: delivery errors become a `failed` record.
    pub fn send_one(
        &mut self,
        reader: &OverdueReader,
        template: &EmailTemplate,
    ) -> NotificationRecord {
        let record = if is_deliverable_email(&reader.reader_email) {
            let payload = build_payload(reader, template);
            match self.channel.send(&payload) {
                Ok(receipt) => {
                    info!(
                        "event=notification_send module=notify status=ok reader_id={} books={} message_id={}",
                        reader.reader_id,
                        reader.total_overdue_books,
                        receipt.message_id.as_deref().unwrap_or("-")
                    );
                    NotificationRecord::success(reader, self.clock.now())
                }
                Err(err) => self.failed(reader, &err.user_message(), self.clock.now()),
            }
        } else {
            self.failed(reader, INVALID_EMAIL_ERROR, self.clock.now())
        };

        self.log.record(record.clone());
        record
    }

    /// Sends one notice per reader and records each outcome.
    ///
    /// Results come back in `readers` order. A transport failure of the whole
    /// batch marks every attempted reader `failed` with the transport error.
    /// Readers without a deliverable email are never attempted; they are
    /// `failed` with the invalid-address reason even when the batch fails.
    /// Callers reject empty selections before calling.
    pub fn send_many(
        &mut self,
        readers: &[OverdueReader],
        template: &EmailTemplate,
    ) -> Vec<NotificationRecord> {
        let deliverable: Vec<usize> = readers
            .iter()
            .enumerate()
            .filter(|(_, reader)| is_deliverable_email(&reader.reader_email))
            .map(|(index, _)| index)
            .collect();
        let payloads: Vec<NotificationPayload> = deliverable
            .iter()
            .map(|index| build_payload(&readers[*index], template))
            .collect();

        let mut outcomes: Vec<Option<DeliveryOutcome>> = vec![None; readers.len()];
        if !payloads.is_empty() {
            match self.channel.send_bulk(&payloads) {
                Ok(results) => {
                    if results.len() != payloads.len() {
                        warn!(
                            "event=notification_bulk module=notify status=mismatch expected={} received={}",
                            payloads.len(),
                            results.len()
                        );
                    }
                    for (index, outcome) in deliverable.iter().zip(results) {
                        outcomes[*index] = Some(outcome);
                    }
                    for index in &deliverable {
                        if outcomes[*index].is_none() {
                            outcomes[*index] = Some(DeliveryOutcome::failed(MISSING_RESULT_ERROR));
                        }
                    }
                }
                Err(err) => {
                    let message = err.user_message();
                    warn!(
                        "event=notification_bulk module=notify status=error recipients={} error={}",
                        payloads.len(),
                        sanitize_message(&message, MAX_LOGGED_ERROR_CHARS)
                    );
                    for index in &deliverable {
                        outcomes[*index] = Some(DeliveryOutcome::failed(message.clone()));
                    }
                }
            }
        }

        let sent_at = self.clock.now();
        let records: Vec<NotificationRecord> = readers
            .iter()
            .zip(outcomes)
            .map(|(reader, outcome)| match outcome {
                Some(outcome) if outcome.success => NotificationRecord::success(reader, sent_at),
                Some(outcome) => {
                    let message = outcome.error.unwrap_or_default();
                    self.failed(reader, &message, sent_at)
                }
                None => self.failed(reader, INVALID_EMAIL_ERROR, sent_at),
            })
            .collect();

        for record in &records {
            self.log.record(record.clone());
        }

        let summary = NotificationSummary::from_records(&records);
        info!(
            "event=notification_bulk module=notify status=done total={} sent={} failed={}",
            summary.total, summary.sent, summary.failed
        );
        records
    }

    /// Sends a backend configuration check email. Not recorded in history.
    pub fn send_test(&self, to: &str, name: &str) -> ChannelResult<DeliveryReceipt> {
        self.channel.send_test(to, name)
    }

    /// Session history, newest first.
    pub fn history(&self) -> &NotificationLog {
        &self.log
    }

    pub fn summary(&self) -> NotificationSummary {
        self.log.summary()
    }

    fn failed(
        &self,
        reader: &OverdueReader,
        message: &str,
        sent_at: DateTime<Utc>,
    ) -> NotificationRecord {
        let message = if message.trim().is_empty() {
            UNKNOWN_SEND_ERROR
        } else {
            message
        };
        warn!(
            "event=notification_send module=notify status=failed reader_id={} error={}",
            reader.reader_id,
            sanitize_message(message, MAX_LOGGED_ERROR_CHARS)
        );
        NotificationRecord::failure(reader, sent_at, message)
    }
}
