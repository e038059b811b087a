pub mod payload;
pub mod time;
pub mod types;

pub use payload::{
    GENERAL_CHANNEL, PRAYER_TIME_CHANNEL, PRAYER_TIME_TYPE, channel_for_type, notification_type,
    prayer_payload, sanitize_data,
};
pub use time::{day_key, in_due_window};
pub use types::{
    NewNotificationRequest, NewScheduleEntry, NotificationRequest, Recipient, RequestStatus,
    ScheduleEntry, ScheduleStatus, SentMarker,
};
