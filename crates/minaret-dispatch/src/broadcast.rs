//! Broadcast fan-out: one message to every recipient with a token.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, info};

use minaret_core::{Recipient, prayer_payload};
use minaret_storage::RecipientDirectory;

use crate::error::DispatchError;
use crate::sender::RecipientSender;

/// Aggregate outcome of one broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastSummary {
    /// Recipients a send was attempted for (those with tokens).
    pub recipients: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub total_recipients: usize,
    pub with_tokens: usize,
    pub without_tokens: usize,
}

/// Counters from one fan-out over an already-partitioned recipient list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutTotals {
    pub success: usize,
    pub failure: usize,
}

/// Fans a single message out to every recipient with a token.
///
/// Sends are issued concurrently and unordered; the fan-out completes only
/// once every send has settled. A recipient's failure never aborts the
/// batch; it is counted and, for stale tokens, triggers the sender's
/// directory cleanup.
pub struct BroadcastDispatcher {
    directory: Arc<dyn RecipientDirectory>,
    sender: Arc<RecipientSender>,
}

impl BroadcastDispatcher {
    pub fn new(directory: Arc<dyn RecipientDirectory>, sender: Arc<RecipientSender>) -> Self {
        Self { directory, sender }
    }

    /// Broadcasts a prayer-time notification to the whole directory.
    pub async fn broadcast(
        &self,
        prayer_name: &str,
        body: &str,
    ) -> Result<BroadcastSummary, DispatchError> {
        let all = self.directory.list().await?;
        let total_recipients = all.len();
        info!(prayer = %prayer_name, total = total_recipients, "Sending prayer time notification");

        let (with_tokens, without_tokens): (Vec<Recipient>, Vec<Recipient>) =
            all.into_iter().partition(Recipient::has_token);
        for skipped in &without_tokens {
            debug!(
                recipient_id = %skipped.id,
                email = %skipped.email_label(),
                "No device token found for recipient"
            );
        }

        let data = prayer_payload(prayer_name);
        let totals = self
            .fan_out(&with_tokens, prayer_name, body, &data)
            .await;

        info!(
            prayer = %prayer_name,
            success = totals.success,
            failed = totals.failure,
            with_tokens = with_tokens.len(),
            without_tokens = without_tokens.len(),
            "Prayer time notification sent"
        );

        Ok(BroadcastSummary {
            recipients: with_tokens.len(),
            success_count: totals.success,
            failure_count: totals.failure,
            total_recipients,
            with_tokens: with_tokens.len(),
            without_tokens: without_tokens.len(),
        })
    }

    /// Launches one independent send per recipient and joins them all;
    /// every send settles to a tagged outcome, none is abandoned and none
    /// can cancel a sibling.
    pub async fn fan_out(
        &self,
        recipients: &[Recipient],
        title: &str,
        body: &str,
        data: &HashMap<String, Value>,
    ) -> FanOutTotals {
        let sends = recipients
            .iter()
            .map(|recipient| self.sender.send_to_recipient(recipient, title, body, data));
        let outcomes = join_all(sends).await;

        let success = outcomes.iter().filter(|o| o.is_delivered()).count();
        FanOutTotals {
            success,
            failure: outcomes.len() - success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubTransport;
    use crate::transport::TransportError;
    use minaret_db_memory::InMemoryStore;

    fn recipient(id: &str, token: Option<&str>) -> Recipient {
        Recipient {
            id: id.to_string(),
            fcm_token: token.map(str::to_string),
            email: None,
        }
    }

    async fn fixture(
        recipients: &[Recipient],
    ) -> (Arc<StubTransport>, Arc<InMemoryStore>, BroadcastDispatcher) {
        let transport = Arc::new(StubTransport::new());
        let store = Arc::new(InMemoryStore::new());
        for r in recipients {
            store.upsert(r.clone()).await.unwrap();
        }
        let sender = Arc::new(RecipientSender::new(transport.clone(), store.clone()));
        let dispatcher = BroadcastDispatcher::new(store.clone(), sender);
        (transport, store, dispatcher)
    }

    #[tokio::test]
    async fn test_broadcast_aggregates_partial_failure() {
        let (transport, _store, dispatcher) = fixture(&[
            recipient("e1", Some("T1")),
            recipient("e2", Some("T2")),
            recipient("e3", None),
        ])
        .await;
        transport.fail_token("T2", TransportError::other("503"));

        let summary = dispatcher.broadcast("Fajr", "Prayer time").await.unwrap();
        assert_eq!(
            summary,
            BroadcastSummary {
                recipients: 2,
                success_count: 1,
                failure_count: 1,
                total_recipients: 3,
                with_tokens: 2,
                without_tokens: 1,
            }
        );
        // Only tokened recipients reach the transport.
        assert_eq!(transport.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_broadcast_uses_prayer_channel_payload() {
        let (transport, _store, dispatcher) = fixture(&[recipient("e1", Some("T1"))]).await;
        dispatcher.broadcast("Maghrib", "Prayer time").await.unwrap();

        let sent = transport.sent_messages();
        assert_eq!(sent[0].notification.title, "Maghrib");
        assert_eq!(sent[0].data["type"], "prayer_time");
        assert_eq!(sent[0].data["prayerName"], "Maghrib");
        assert_eq!(
            sent[0].android.notification.channel_id,
            minaret_core::PRAYER_TIME_CHANNEL
        );
    }

    #[tokio::test]
    async fn test_broadcast_empty_directory() {
        let (transport, _store, dispatcher) = fixture(&[]).await;
        let summary = dispatcher.broadcast("Isha", "Prayer time").await.unwrap();
        assert_eq!(summary.total_recipients, 0);
        assert_eq!(summary.success_count, 0);
        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_token_cleanup_during_broadcast() {
        let (transport, store, dispatcher) =
            fixture(&[recipient("e1", Some("T1")), recipient("e2", Some("T2"))]).await;
        transport.fail_token("T1", TransportError::invalid_token("bad"));

        let summary = dispatcher.broadcast("Fajr", "Prayer time").await.unwrap();
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failure_count, 1);

        let cleaned = RecipientDirectory::get(store.as_ref(), "e1")
            .await
            .unwrap()
            .unwrap();
        assert!(cleaned.fcm_token.is_none());
        let kept = RecipientDirectory::get(store.as_ref(), "e2")
            .await
            .unwrap()
            .unwrap();
        assert!(kept.fcm_token.is_some());
    }
}
