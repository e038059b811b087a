//! Storage traits the dispatch engine consumes.
//!
//! All implementations must be thread-safe (`Send + Sync`); every method is
//! a suspension point.

use async_trait::async_trait;

use minaret_core::{
    NewNotificationRequest, NewScheduleEntry, NotificationRequest, Recipient, ScheduleEntry,
    SentMarker,
};

use crate::error::StorageError;
use crate::types::ScheduleUpdate;

/// Store of individually queued notification requests.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Queues a new request. The backend mints the id and the creation
    /// timestamp.
    async fn create(
        &self,
        request: NewNotificationRequest,
    ) -> Result<NotificationRequest, StorageError>;

    /// Reads a request by id. Returns `None` if it does not exist.
    async fn get(&self, id: &str) -> Result<Option<NotificationRequest>, StorageError>;

    /// Transitions a request to `sent`, attaching the transport message id
    /// and a server-assigned timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the request does not exist.
    async fn mark_sent(&self, id: &str, message_id: &str) -> Result<(), StorageError>;

    /// Transitions a request to `failed`, attaching the error message, an
    /// optional machine-readable error code, and a server-assigned timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the request does not exist.
    async fn mark_failed(
        &self,
        id: &str,
        error: &str,
        error_code: Option<&str>,
    ) -> Result<(), StorageError>;
}

/// Store of recurring/scheduled broadcast definitions.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Creates a new pending entry.
    async fn create(&self, entry: NewScheduleEntry) -> Result<ScheduleEntry, StorageError>;

    /// Reads an entry by id. Returns `None` if it does not exist.
    async fn get(&self, id: &str) -> Result<Option<ScheduleEntry>, StorageError>;

    /// Fetches pending entries, capped at `limit`, ordered by scheduled
    /// time. This is the coarse store-level filter; the due-window fine
    /// filter happens in-process.
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<ScheduleEntry>, StorageError>;

    /// Applies a batch of status updates atomically: either every update in
    /// the batch is applied or none is.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::BatchError` if any update references an
    /// unknown entry; in that case no update has been applied.
    async fn commit(&self, updates: Vec<ScheduleUpdate>) -> Result<(), StorageError>;
}

/// Directory of known recipients and their device tokens.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Loads the entire directory.
    async fn list(&self) -> Result<Vec<Recipient>, StorageError>;

    /// Reads a recipient by id. Returns `None` if it does not exist.
    async fn get(&self, id: &str) -> Result<Option<Recipient>, StorageError>;

    /// Inserts or replaces a recipient record (external re-registration).
    async fn upsert(&self, recipient: Recipient) -> Result<(), StorageError>;

    /// Deletes the token field of a recipient, keeping the record.
    ///
    /// Idempotent: clearing an already-absent token, or a token of an
    /// unknown recipient, is a no-op.
    async fn clear_token(&self, id: &str) -> Result<(), StorageError>;
}

/// Ledger of already-dispatched `(prayerName, calendarDate)` pairs.
#[async_trait]
pub trait SentLedger: Send + Sync {
    /// Whether a marker exists for the pair. Its presence is authoritative.
    async fn was_sent(&self, prayer_name: &str, day_key: &str) -> Result<bool, StorageError>;

    /// Records a marker. Written before fan-out begins so a concurrent run
    /// observes it even while sends are still in flight.
    async fn record(&self, marker: SentMarker) -> Result<(), StorageError>;
}

// Ensure traits are object-safe by using them as trait objects
#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_request_store_object_safe(_: &dyn RequestStore) {}
    fn _assert_schedule_store_object_safe(_: &dyn ScheduleStore) {}
    fn _assert_directory_object_safe(_: &dyn RecipientDirectory) {}
    fn _assert_ledger_object_safe(_: &dyn SentLedger) {}
}
