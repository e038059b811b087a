use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use minaret_core::types::marker_key;
use minaret_core::{
    NewNotificationRequest, NewScheduleEntry, NotificationRequest, Recipient, RequestStatus,
    ScheduleEntry, ScheduleStatus, SentMarker,
};
use minaret_storage::{
    RecipientDirectory, RequestStore, ScheduleStore, ScheduleUpdate, SentLedger, StorageError,
};

/// In-memory backend implementing all Minaret storage traits.
///
/// Each collection sits behind its own `RwLock`; the schedule batch commit
/// holds a single write guard for the whole batch, which is what makes it
/// atomic with respect to concurrent readers.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    requests: Arc<RwLock<HashMap<String, NotificationRequest>>>,
    schedules: Arc<RwLock<HashMap<String, ScheduleEntry>>>,
    recipients: Arc<RwLock<HashMap<String, Recipient>>>,
    ledger: Arc<RwLock<HashMap<String, SentMarker>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id() -> String {
        Uuid::new_v4().to_string()
    }
}

#[async_trait]
impl RequestStore for InMemoryStore {
    async fn create(
        &self,
        request: NewNotificationRequest,
    ) -> Result<NotificationRequest, StorageError> {
        let stored = NotificationRequest {
            id: Self::next_id(),
            status: request.status,
            fcm_token: request.fcm_token,
            title: request.title,
            body: request.body,
            data: request.data,
            user_id: request.user_id,
            created_at: OffsetDateTime::now_utc(),
            message_id: None,
            error: None,
            error_code: None,
            sent_at: None,
            failed_at: None,
        };
        let mut guard = self.requests.write().await;
        guard.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: &str) -> Result<Option<NotificationRequest>, StorageError> {
        let guard = self.requests.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn mark_sent(&self, id: &str, message_id: &str) -> Result<(), StorageError> {
        let mut guard = self.requests.write().await;
        let request = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("NotificationRequest", id))?;
        request.status = RequestStatus::Sent;
        request.message_id = Some(message_id.to_string());
        request.sent_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: &str,
        error: &str,
        error_code: Option<&str>,
    ) -> Result<(), StorageError> {
        let mut guard = self.requests.write().await;
        let request = guard
            .get_mut(id)
            .ok_or_else(|| StorageError::not_found("NotificationRequest", id))?;
        request.status = RequestStatus::Failed;
        request.error = Some(error.to_string());
        request.error_code = error_code.map(str::to_string);
        request.failed_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }
}

#[async_trait]
impl ScheduleStore for InMemoryStore {
    async fn create(&self, entry: NewScheduleEntry) -> Result<ScheduleEntry, StorageError> {
        let stored = ScheduleEntry {
            id: Self::next_id(),
            status: ScheduleStatus::Pending,
            prayer_name: entry.prayer_name,
            message: entry.message,
            scheduled_for: entry.scheduled_for,
            success_count: None,
            failure_count: None,
            reason: None,
            error: None,
            processed_at: None,
        };
        let mut guard = self.schedules.write().await;
        guard.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: &str) -> Result<Option<ScheduleEntry>, StorageError> {
        let guard = self.schedules.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn fetch_pending(&self, limit: usize) -> Result<Vec<ScheduleEntry>, StorageError> {
        let guard = self.schedules.read().await;
        let mut pending: Vec<ScheduleEntry> = guard
            .values()
            .filter(|e| e.status == ScheduleStatus::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|e| e.scheduled_for);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn commit(&self, updates: Vec<ScheduleUpdate>) -> Result<(), StorageError> {
        let mut guard = self.schedules.write().await;
        // Validate the whole batch before touching anything.
        if let Some(missing) = updates.iter().find(|u| !guard.contains_key(&u.id)) {
            return Err(StorageError::batch_error(format!(
                "unknown entry {}",
                missing.id
            )));
        }
        for update in updates {
            if let Some(entry) = guard.get_mut(&update.id) {
                entry.status = update.status;
                entry.success_count = update.success_count;
                entry.failure_count = update.failure_count;
                entry.reason = update.reason;
                entry.error = update.error;
                entry.processed_at = Some(update.processed_at);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RecipientDirectory for InMemoryStore {
    async fn list(&self) -> Result<Vec<Recipient>, StorageError> {
        let guard = self.recipients.read().await;
        let mut all: Vec<Recipient> = guard.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn get(&self, id: &str) -> Result<Option<Recipient>, StorageError> {
        let guard = self.recipients.read().await;
        Ok(guard.get(id).cloned())
    }

    async fn upsert(&self, recipient: Recipient) -> Result<(), StorageError> {
        let mut guard = self.recipients.write().await;
        guard.insert(recipient.id.clone(), recipient);
        Ok(())
    }

    async fn clear_token(&self, id: &str) -> Result<(), StorageError> {
        let mut guard = self.recipients.write().await;
        if let Some(recipient) = guard.get_mut(id) {
            recipient.fcm_token = None;
        }
        Ok(())
    }
}

#[async_trait]
impl SentLedger for InMemoryStore {
    async fn was_sent(&self, prayer_name: &str, day_key: &str) -> Result<bool, StorageError> {
        let guard = self.ledger.read().await;
        Ok(guard.contains_key(&marker_key(prayer_name, day_key)))
    }

    async fn record(&self, marker: SentMarker) -> Result<(), StorageError> {
        let mut guard = self.ledger.write().await;
        guard.insert(marker.key(), marker);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn recipient(id: &str, token: Option<&str>) -> Recipient {
        Recipient {
            id: id.to_string(),
            fcm_token: token.map(str::to_string),
            email: Some(format!("{id}@example.com")),
        }
    }

    #[tokio::test]
    async fn test_request_status_transitions() {
        let store = InMemoryStore::new();
        let created = RequestStore::create(
            &store,
            NewNotificationRequest {
                fcm_token: "T1".into(),
                title: "Fajr".into(),
                body: "Prayer time".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(created.status, RequestStatus::Pending);

        store.mark_sent(&created.id, "m1").await.unwrap();
        let stored = RequestStore::get(&store, &created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RequestStatus::Sent);
        assert_eq!(stored.message_id.as_deref(), Some("m1"));
        assert!(stored.sent_at.is_some());

        let err = store.mark_sent("nope", "m2").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_clear_token_is_idempotent() {
        let store = InMemoryStore::new();
        store.upsert(recipient("e1", Some("tok"))).await.unwrap();

        store.clear_token("e1").await.unwrap();
        // Second clear of an already-absent token is a no-op.
        store.clear_token("e1").await.unwrap();
        // Unknown recipient is a no-op too.
        store.clear_token("ghost").await.unwrap();

        let stored = RecipientDirectory::get(&store, "e1").await.unwrap().unwrap();
        assert!(stored.fcm_token.is_none());
    }

    #[tokio::test]
    async fn test_clear_token_concurrent() {
        let store = Arc::new(InMemoryStore::new());
        store.upsert(recipient("e1", Some("tok"))).await.unwrap();

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.clear_token("e1").await })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.clear_token("e1").await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let stored = RecipientDirectory::get(store.as_ref(), "e1")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.fcm_token.is_none());
    }

    #[tokio::test]
    async fn test_fetch_pending_orders_and_caps() {
        let store = InMemoryStore::new();
        let base = OffsetDateTime::now_utc();
        for i in 0..5 {
            ScheduleStore::create(
                &store,
                NewScheduleEntry {
                    prayer_name: format!("p{i}"),
                    message: None,
                    scheduled_for: base - Duration::minutes(i),
                },
            )
            .await
            .unwrap();
        }

        let pending = store.fetch_pending(3).await.unwrap();
        assert_eq!(pending.len(), 3);
        // Oldest scheduled time first.
        assert_eq!(pending[0].prayer_name, "p4");
        assert!(pending.windows(2).all(|w| w[0].scheduled_for <= w[1].scheduled_for));
    }

    #[tokio::test]
    async fn test_commit_is_all_or_nothing() {
        let store = InMemoryStore::new();
        let entry = ScheduleStore::create(
            &store,
            NewScheduleEntry {
                prayer_name: "Fajr".into(),
                message: None,
                scheduled_for: OffsetDateTime::now_utc(),
            },
        )
        .await
        .unwrap();

        let now = OffsetDateTime::now_utc();
        let err = store
            .commit(vec![
                ScheduleUpdate::sent(&entry.id, 3, 0, now),
                ScheduleUpdate::failed("ghost", "boom", now),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::BatchError { .. }));

        // The valid sibling must not have been applied.
        let stored = ScheduleStore::get(&store, &entry.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ScheduleStatus::Pending);

        store
            .commit(vec![ScheduleUpdate::skipped(&entry.id, "Already sent today", now)])
            .await
            .unwrap();
        let stored = ScheduleStore::get(&store, &entry.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ScheduleStatus::Skipped);
        assert_eq!(stored.reason.as_deref(), Some("Already sent today"));
    }

    #[tokio::test]
    async fn test_ledger_round_trip() {
        let store = InMemoryStore::new();
        let now = OffsetDateTime::now_utc();
        assert!(!store.was_sent("Fajr", &minaret_core::day_key(now)).await.unwrap());

        store
            .record(SentMarker::new("Fajr", now.date(), now))
            .await
            .unwrap();
        assert!(store.was_sent("Fajr", &minaret_core::day_key(now)).await.unwrap());
        assert!(!store.was_sent("Dhuhr", &minaret_core::day_key(now)).await.unwrap());
    }
}
