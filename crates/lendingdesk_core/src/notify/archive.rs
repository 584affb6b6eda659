//! Backend notification archive contract and HTTP binding.
//!
//! # Responsibility
//! - Read backend send counters and the paged send history.
//! - Delete archive entries and ask the backend to resend failed ones.
//!
//! # Invariants
//! - Archive calls never touch the session `NotificationLog`.
//! - A blank entry id is rejected before any request is made.
//! - A missing `data` envelope reads as zero counters or an empty first page.

use super::channel::SendResponse;
use super::{ChannelError, ChannelResult};
use crate::http::{ApiClient, ApiError, ApiResult};
use crate::model::archive::{ArchivePage, ArchiveQuery, ArchiveStats};
use crate::model::notification::DeliveryReceipt;
use log::{error, info};
use serde::Deserialize;
use std::time::Instant;

const STATS_PATH: &str = "notifications/stats";
const HISTORY_PATH: &str = "notifications/history";
const ITEM_PATH: &str = "notifications";
const RETRY_PATH: &str = "notifications/retry";
const RETRY_FALLBACK: &str = "Unknown error occurred while retrying notification";

/// Backend-side record of every notice the desk has sent.
pub trait NotificationArchive {
    fn stats(&self) -> ApiResult<ArchiveStats>;

    /// Returns one page of archived notices, newest first as the backend orders them.
    fn history(&self, query: ArchiveQuery) -> ApiResult<ArchivePage>;

    fn delete(&self, id: &str) -> ApiResult<()>;

    /// Asks the backend to resend a stored notice.
    fn retry(&self, id: &str) -> ChannelResult<DeliveryReceipt>;
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    #[serde(default)]
    data: Option<T>,
}

fn unwrap_data<T: Default>(response: Option<DataEnvelope<T>>) -> T {
    response
        .and_then(|envelope| envelope.data)
        .unwrap_or_default()
}

fn entry_path(prefix: &str, id: &str) -> ApiResult<String> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ApiError::InvalidUrl(
            "notification id must not be empty".to_string(),
        ));
    }
    Ok(format!("{prefix}/{id}"))
}

/// Archive backed by the backend `notifications` endpoints.
pub struct HttpNotificationArchive<'client> {
    client: &'client ApiClient,
}

impl<'client> HttpNotificationArchive<'client> {
    pub fn new(client: &'client ApiClient) -> Self {
        Self { client }
    }
}

impl NotificationArchive for HttpNotificationArchive<'_> {
    fn stats(&self) -> ApiResult<ArchiveStats> {
        let response: Option<DataEnvelope<ArchiveStats>> = self.client.get_json(STATS_PATH)?;
        Ok(unwrap_data(response))
    }

    fn history(&self, query: ArchiveQuery) -> ApiResult<ArchivePage> {
        let query = ArchiveQuery::new(query.page, query.limit);
        let path = format!("{HISTORY_PATH}?page={}&limit={}", query.page, query.limit);
        let response: Option<DataEnvelope<ArchivePage>> = self.client.get_json(&path)?;
        let page = unwrap_data(response);
        info!(
            "event=archive_history module=notify status=ok page={} entries={} total={}",
            query.page,
            page.notifications.len(),
            page.total
        );
        Ok(page)
    }

    fn delete(&self, id: &str) -> ApiResult<()> {
        let path = entry_path(ITEM_PATH, id)?;
        self.client.delete(&path)?;
        info!("event=archive_delete module=notify status=ok id={}", id.trim());
        Ok(())
    }

    fn retry(&self, id: &str) -> ChannelResult<DeliveryReceipt> {
        let started_at = Instant::now();
        let path = entry_path(RETRY_PATH, id)?;
        let outcome = self
            .client
            .post_json::<_, Option<SendResponse>>(&path, &serde_json::json!({}))
            .map_err(ChannelError::from)
            .and_then(|response| response.unwrap_or_default().into_receipt_or(RETRY_FALLBACK));

        match &outcome {
            Ok(_) => info!(
                "event=archive_retry module=notify status=ok id={} duration_ms={}",
                id.trim(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=archive_retry module=notify status=error id={} duration_ms={} error={}",
                id.trim(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        outcome
    }
}
