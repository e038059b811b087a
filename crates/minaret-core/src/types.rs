//! Domain entities for the dispatch engine.
//!
//! Field names serialize in the camelCase form the mobile clients and the
//! HTTP surface use (`fcmToken`, `userId`, `scheduledFor`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// Lifecycle of an individually queued notification request.
///
/// The only transitions the dispatcher performs are `pending -> sent` and
/// `pending -> failed`; a request never leaves a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Sent,
    Failed,
}

impl Default for RequestStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Lifecycle of a scheduled broadcast entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Pending,
    Sent,
    Skipped,
    Failed,
}

/// An individually queued notification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub id: String,
    pub status: RequestStatus,
    /// Device token of the addressee. Empty means missing.
    #[serde(default)]
    pub fcm_token: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Free-form payload forwarded to the device. Values are coerced to
    /// strings at message-build time.
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    /// Directory id of the addressee, used for invalid-token cleanup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Transport message identifier, set when the request transitions to sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub sent_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub failed_at: Option<OffsetDateTime>,
}

/// Fields an external writer supplies when queueing a notification request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotificationRequest {
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub fcm_token: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// A recurring/scheduled broadcast definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: String,
    pub status: ScheduleStatus,
    pub prayer_name: String,
    /// Broadcast body; a fallback referencing the name is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_for: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_count: Option<u32>,
    /// Why the entry was skipped, when it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub processed_at: Option<OffsetDateTime>,
}

/// Fields an external writer supplies when creating a schedule entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScheduleEntry {
    pub prayer_name: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub scheduled_for: OffsetDateTime,
}

/// A known notification recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcm_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Recipient {
    /// Returns the device token if present and non-blank.
    pub fn token(&self) -> Option<&str> {
        self.fcm_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// Label used in per-recipient log lines.
    pub fn email_label(&self) -> &str {
        self.email.as_deref().unwrap_or("unknown")
    }
}

/// Duplicate-suppression record: one per `(prayerName, calendarDate)` pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMarker {
    pub prayer_name: String,
    pub date: Date,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
    pub sent_by: String,
}

impl SentMarker {
    pub fn new(prayer_name: impl Into<String>, date: Date, sent_at: OffsetDateTime) -> Self {
        Self {
            prayer_name: prayer_name.into(),
            date,
            sent_at,
            sent_by: "scheduler".to_string(),
        }
    }

    /// Ledger key, `<prayerName>_<YYYY-MM-DD>`.
    pub fn key(&self) -> String {
        marker_key(&self.prayer_name, &crate::time::format_date(self.date))
    }
}

/// Builds the ledger key for a `(prayerName, dayKey)` pair.
pub fn marker_key(prayer_name: &str, day_key: &str) -> String {
    format!("{prayer_name}_{day_key}")
}
