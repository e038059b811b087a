//! In-memory storage backend for the Minaret dispatch service.
//!
//! Implements every trait from `minaret-storage` on top of
//! `tokio::sync::RwLock<HashMap>` state. This is the default backend and the
//! one every test drives; durable backends are external collaborators.

mod store;

pub use minaret_storage::{
    RecipientDirectory, RequestStore, ScheduleStore, SentLedger, StorageError,
};
pub use store::InMemoryStore;
