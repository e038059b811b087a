//! Storage abstraction layer for the Minaret dispatch engine.
//!
//! The engine never talks to a concrete database; it consumes the traits
//! defined here. `minaret-db-memory` provides the default backend.

pub mod error;
pub mod traits;
pub mod types;

pub use error::StorageError;
pub use traits::{RecipientDirectory, RequestStore, ScheduleStore, SentLedger};
pub use types::ScheduleUpdate;
