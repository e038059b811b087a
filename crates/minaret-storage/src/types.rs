//! Batch update records for the schedule store.

use minaret_core::ScheduleStatus;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One status write accumulated during a scheduler run and committed as part
/// of a single atomic batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleUpdate {
    pub id: String,
    pub status: ScheduleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub processed_at: OffsetDateTime,
}

impl ScheduleUpdate {
    /// Marks an entry as dispatched with per-recipient result counters.
    #[must_use]
    pub fn sent(
        id: impl Into<String>,
        success_count: u32,
        failure_count: u32,
        processed_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            status: ScheduleStatus::Sent,
            success_count: Some(success_count),
            failure_count: Some(failure_count),
            reason: None,
            error: None,
            processed_at,
        }
    }

    /// Marks an entry as skipped with a reason.
    #[must_use]
    pub fn skipped(
        id: impl Into<String>,
        reason: impl Into<String>,
        processed_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            status: ScheduleStatus::Skipped,
            success_count: None,
            failure_count: None,
            reason: Some(reason.into()),
            error: None,
            processed_at,
        }
    }

    /// Marks an entry as failed with an error message.
    #[must_use]
    pub fn failed(
        id: impl Into<String>,
        error: impl Into<String>,
        processed_at: OffsetDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            status: ScheduleStatus::Failed,
            success_count: None,
            failure_count: None,
            reason: None,
            error: Some(error.into()),
            processed_at,
        }
    }
}
