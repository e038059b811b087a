//! HTTP surface and process bootstrap for the Minaret dispatch engine.

pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use server::{MinaretServer, ServerBuilder, build_app};
pub use state::AppState;
