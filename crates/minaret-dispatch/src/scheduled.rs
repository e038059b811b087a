//! Scheduled dispatch: poll due entries, suppress same-day duplicates, fan
//! out, and commit status updates in one batch.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use time::{Duration, OffsetDateTime};
use tokio::time::interval;
use tracing::{error, info};

use minaret_core::{Recipient, ScheduleEntry, SentMarker, day_key, in_due_window, prayer_payload};
use minaret_storage::{RecipientDirectory, ScheduleStore, ScheduleUpdate, SentLedger};

use crate::broadcast::BroadcastDispatcher;
use crate::error::DispatchError;

const ALREADY_SENT_REASON: &str = "Already sent today";

/// Tuning knobs for the scheduled dispatcher.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// How often a run is started.
    pub poll_interval: StdDuration,
    /// Cap on the store-level pending query.
    pub page_size: usize,
    /// Entries older than this are treated as missed, not retried.
    pub due_window: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            poll_interval: StdDuration::from_secs(60),
            page_size: 100,
            due_window: Duration::minutes(2),
        }
    }
}

/// Counters for one scheduler run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Pending entries returned by the coarse query.
    pub pending: usize,
    /// Entries inside the due window this run.
    pub due: usize,
    /// Entries a status update was recorded for.
    pub processed: usize,
    pub success_count: usize,
    pub failure_count: usize,
}

/// Polls the schedule store and dispatches due entries.
///
/// Entries are processed one at a time, in query order, so a later entry's
/// ledger check observes all earlier marker writes of the same run. All
/// status updates accumulate into one batch committed at the end of the run.
pub struct ScheduledDispatcher {
    schedules: Arc<dyn ScheduleStore>,
    ledger: Arc<dyn SentLedger>,
    directory: Arc<dyn RecipientDirectory>,
    broadcast: Arc<BroadcastDispatcher>,
    settings: SchedulerSettings,
}

impl ScheduledDispatcher {
    pub fn new(
        schedules: Arc<dyn ScheduleStore>,
        ledger: Arc<dyn SentLedger>,
        directory: Arc<dyn RecipientDirectory>,
        broadcast: Arc<BroadcastDispatcher>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            schedules,
            ledger,
            directory,
            broadcast,
            settings,
        }
    }

    /// Timer loop. A failed run is logged and the next tick proceeds;
    /// nothing escapes the trigger boundary.
    pub async fn run(&self) {
        let mut ticker = interval(self.settings.poll_interval);
        info!(
            interval_secs = self.settings.poll_interval.as_secs(),
            "Scheduled dispatcher started"
        );

        loop {
            ticker.tick().await;
            match self.run_once().await {
                Ok(stats) if stats.processed > 0 => {
                    info!(
                        processed = stats.processed,
                        success = stats.success_count,
                        failed = stats.failure_count,
                        "Processed scheduled notifications"
                    );
                }
                Ok(_) => {}
                Err(err) => {
                    error!(error = %err, "Error processing scheduled notifications");
                }
            }
        }
    }

    pub async fn run_once(&self) -> Result<RunStats, DispatchError> {
        self.run_at(OffsetDateTime::now_utc()).await
    }

    /// One run against an explicit clock reading.
    pub async fn run_at(&self, now: OffsetDateTime) -> Result<RunStats, DispatchError> {
        // Coarse store-level filter (status only, capped), then the fine
        // due-window filter in-process. Two stages on purpose: the store
        // query stays index-free and cheap, precision comes second.
        let pending = self.schedules.fetch_pending(self.settings.page_size).await?;
        let due: Vec<ScheduleEntry> = pending
            .iter()
            .filter(|e| in_due_window(e.scheduled_for, now, self.settings.due_window))
            .cloned()
            .collect();

        let mut stats = RunStats {
            pending: pending.len(),
            due: due.len(),
            ..RunStats::default()
        };
        info!(pending = stats.pending, due = stats.due, "Checked for scheduled notifications");

        if due.is_empty() {
            return Ok(stats);
        }

        // One directory load shared by every due entry this run.
        let recipients: Vec<Recipient> = self
            .directory
            .list()
            .await?
            .into_iter()
            .filter(Recipient::has_token)
            .collect();
        info!(count = recipients.len(), "Recipients with device tokens");

        if recipients.is_empty() {
            info!("No recipients with device tokens found");
            return Ok(stats);
        }

        let mut updates: Vec<ScheduleUpdate> = Vec::with_capacity(due.len());
        for entry in &due {
            match self.process_entry(entry, &recipients, now).await {
                Ok(update) => {
                    stats.success_count += update.success_count.unwrap_or(0) as usize;
                    stats.failure_count += update.failure_count.unwrap_or(0) as usize;
                    updates.push(update);
                }
                Err(err) => {
                    // Entry-level failures are contained: record and move on.
                    error!(
                        entry_id = %entry.id,
                        prayer = %entry.prayer_name,
                        error = %err,
                        "Error processing scheduled entry"
                    );
                    updates.push(ScheduleUpdate::failed(&entry.id, err.to_string(), now));
                }
            }
            stats.processed += 1;
        }

        self.schedules.commit(updates).await?;
        Ok(stats)
    }

    async fn process_entry(
        &self,
        entry: &ScheduleEntry,
        recipients: &[Recipient],
        now: OffsetDateTime,
    ) -> Result<ScheduleUpdate, DispatchError> {
        let day = day_key(now);

        if self.ledger.was_sent(&entry.prayer_name, &day).await? {
            info!(
                prayer = %entry.prayer_name,
                day = %day,
                "Notification already sent today, skipping"
            );
            return Ok(ScheduleUpdate::skipped(&entry.id, ALREADY_SENT_REASON, now));
        }

        // The marker goes in before any send so a concurrent run sees it
        // even while this fan-out is still in flight.
        self.ledger
            .record(SentMarker::new(&entry.prayer_name, now.date(), now))
            .await?;

        let body = entry
            .message
            .clone()
            .unwrap_or_else(|| format!("{} time - remember Allah.", entry.prayer_name));
        let data = prayer_payload(&entry.prayer_name);
        let totals = self
            .broadcast
            .fan_out(recipients, &entry.prayer_name, &body, &data)
            .await;

        info!(
            prayer = %entry.prayer_name,
            success = totals.success,
            failed = totals.failure,
            "Sent scheduled notification"
        );
        Ok(ScheduleUpdate::sent(
            &entry.id,
            totals.success as u32,
            totals.failure as u32,
            now,
        ))
    }
}
