//! The notification dispatch and deduplication engine.
//!
//! Three flows share one per-recipient send-and-cleanup primitive:
//!
//! - [`RequestDispatcher`] consumes one newly queued request, validates it,
//!   sends it, and records the outcome.
//! - [`BroadcastDispatcher`] fans a single message out to every recipient
//!   with a token and aggregates per-recipient outcomes.
//! - [`ScheduledDispatcher`] polls due schedule entries, suppresses
//!   same-day duplicates through the sent ledger, reuses the broadcast
//!   fan-out, and commits status updates in one batch.
//!
//! Failures are contained at the smallest scope: one recipient never aborts
//! a fan-out, one entry never aborts a run, and nothing escapes a trigger
//! boundary.

pub mod broadcast;
pub mod error;
pub mod fcm;
pub mod message;
pub mod request;
pub mod scheduled;
pub mod sender;
pub mod testing;
pub mod transport;

pub use broadcast::{BroadcastDispatcher, BroadcastSummary, FanOutTotals};
pub use error::DispatchError;
pub use fcm::FcmTransport;
pub use message::PushMessage;
pub use request::RequestDispatcher;
pub use scheduled::{RunStats, ScheduledDispatcher, SchedulerSettings};
pub use sender::{RecipientSender, SendOutcome};
pub use transport::{PushTransport, TransportError, TransportErrorKind};
