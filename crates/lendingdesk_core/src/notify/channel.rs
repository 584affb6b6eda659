//! Notification channel contract and HTTP binding.
//!
//! # Responsibility
//! - Hand rendered notices to the backend's email endpoints.
//! - Translate backend acknowledgements into receipts and per-recipient outcomes.
//!
//! # Invariants
//! - `send_bulk` either fails as a whole or returns outcomes in payload order.

use super::{ChannelError, ChannelResult};
use crate::http::ApiClient;
use crate::model::notification::{DeliveryOutcome, DeliveryReceipt, NotificationPayload};
use serde::{Deserialize, Serialize};

const SEND_OVERDUE_PATH: &str = "notifications/send-overdue";
const SEND_BULK_OVERDUE_PATH: &str = "notifications/send-bulk-overdue";
const SEND_TEST_PATH: &str = "notifications/test";

/// External email delivery service.
pub trait NotificationChannel {
    /// Delivers one notice.
    fn send(&self, payload: &NotificationPayload) -> ChannelResult<DeliveryReceipt>;

    /// Delivers many notices, one outcome per payload in payload order.
    ///
    /// The default sends one by one; a failure only marks its own outcome.
    fn send_bulk(&self, payloads: &[NotificationPayload]) -> ChannelResult<Vec<DeliveryOutcome>> {
        Ok(payloads
            .iter()
            .map(|payload| match self.send(payload) {
                Ok(receipt) => DeliveryOutcome::delivered(receipt.message_id),
                Err(err) => DeliveryOutcome::failed(err.user_message()),
            })
            .collect())
    }

    /// Sends a configuration check email.
    fn send_test(&self, to: &str, name: &str) -> ChannelResult<DeliveryReceipt>;
}

impl<C: NotificationChannel + ?Sized> NotificationChannel for &C {
    fn send(&self, payload: &NotificationPayload) -> ChannelResult<DeliveryReceipt> {
        (**self).send(payload)
    }

    fn send_bulk(&self, payloads: &[NotificationPayload]) -> ChannelResult<Vec<DeliveryOutcome>> {
        (**self).send_bulk(payloads)
    }

    fn send_test(&self, to: &str, name: &str) -> ChannelResult<DeliveryReceipt> {
        (**self).send_test(to, name)
    }
}

const REFUSED_FALLBACK: &str = "notification backend refused delivery";

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub(super) struct SendResponse {
    success: Option<bool>,
    message_id: Option<String>,
    message: Option<String>,
}

impl SendResponse {
    fn into_receipt(self) -> ChannelResult<DeliveryReceipt> {
        self.into_receipt_or(REFUSED_FALLBACK)
    }

    /// `fallback` is the rejection reason when the backend gives none.
    pub(super) fn into_receipt_or(self, fallback: &str) -> ChannelResult<DeliveryReceipt> {
        if self.success == Some(false) {
            return Err(ChannelError::Rejected(
                self.message
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| fallback.to_string()),
            ));
        }
        Ok(DeliveryReceipt {
            message_id: self.message_id,
        })
    }
}

#[derive(Serialize)]
struct BulkRequest<'a> {
    notifications: &'a [NotificationPayload],
}

#[derive(Deserialize, Default)]
struct BulkResponse {
    #[serde(default)]
    results: Vec<DeliveryOutcome>,
}

#[derive(Serialize)]
struct TestRequest<'a> {
    to: &'a str,
    name: &'a str,
}

/// Channel backed by the backend `notifications` endpoints.
pub struct HttpNotificationChannel<'client> {
    client: &'client ApiClient,
}

impl<'client> HttpNotificationChannel<'client> {
    pub fn new(client: &'client ApiClient) -> Self {
        Self { client }
    }
}

impl NotificationChannel for HttpNotificationChannel<'_> {
    fn send(&self, payload: &NotificationPayload) -> ChannelResult<DeliveryReceipt> {
        let response: Option<SendResponse> = self.client.post_json(SEND_OVERDUE_PATH, payload)?;
        response.unwrap_or_default().into_receipt()
    }

    fn send_bulk(&self, payloads: &[NotificationPayload]) -> ChannelResult<Vec<DeliveryOutcome>> {
        let response: Option<BulkResponse> = self.client.post_json(
            SEND_BULK_OVERDUE_PATH,
            &BulkRequest {
                notifications: payloads,
            },
        )?;
        Ok(response.unwrap_or_default().results)
    }

    fn send_test(&self, to: &str, name: &str) -> ChannelResult<DeliveryReceipt> {
        let response: Option<SendResponse> = self
            .client
            .post_json(SEND_TEST_PATH, &TestRequest { to, name })?;
        response.unwrap_or_default().into_receipt()
    }
}
