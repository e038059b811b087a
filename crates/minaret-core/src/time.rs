//! Calendar day keys and due-window arithmetic.

use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

/// Formats a date as `YYYY-MM-DD`, the calendar component of ledger keys.
pub fn format_date(date: Date) -> String {
    let description = format_description!("[year]-[month]-[day]");
    date.format(&description)
        .unwrap_or_else(|_| date.to_string())
}

/// Day key for "now": duplicate suppression is keyed by the current date,
/// not the entry's scheduled time.
pub fn day_key(now: OffsetDateTime) -> String {
    format_date(now.date())
}

/// Whether a scheduled time falls inside the due window ending at `now`.
///
/// Both boundaries are inclusive: an entry due exactly at `now` and one due
/// exactly `window` ago are both dispatched. Anything older silently stays
/// pending and ages out; anything in the future waits for a later run.
pub fn in_due_window(scheduled_for: OffsetDateTime, now: OffsetDateTime, window: Duration) -> bool {
    scheduled_for <= now && scheduled_for >= now - window
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const WINDOW: Duration = Duration::minutes(2);

    #[test]
    fn test_day_key_zero_pads() {
        assert_eq!(day_key(datetime!(2026-03-05 23:59 UTC)), "2026-03-05");
        assert_eq!(day_key(datetime!(2026-11-30 00:00 UTC)), "2026-11-30");
    }

    #[test]
    fn test_due_window_boundaries_inclusive() {
        let now = datetime!(2026-03-05 05:30 UTC);
        assert!(in_due_window(now, now, WINDOW));
        assert!(in_due_window(now - Duration::minutes(2), now, WINDOW));
        assert!(in_due_window(now - Duration::seconds(90), now, WINDOW));
    }

    #[test]
    fn test_due_window_excludes_stale_and_future() {
        let now = datetime!(2026-03-05 05:30 UTC);
        assert!(!in_due_window(now - Duration::minutes(2) - Duration::seconds(1), now, WINDOW));
        assert!(!in_due_window(now + Duration::seconds(1), now, WINDOW));
        assert!(!in_due_window(now - Duration::hours(3), now, WINDOW));
    }
}
