//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Duration;

use minaret_db_memory::InMemoryStore;
use minaret_dispatch::{
    BroadcastDispatcher, FcmTransport, PushTransport, RecipientSender, RequestDispatcher,
    ScheduledDispatcher, SchedulerSettings,
};
use minaret_storage::{RecipientDirectory, RequestStore, ScheduleStore, SentLedger};

use crate::config::AppConfig;

/// Store handles and dispatchers shared by the HTTP surface and the
/// scheduler task. Cloning is cheap, all fields are `Arc`s.
#[derive(Clone)]
pub struct AppState {
    pub requests: Arc<dyn RequestStore>,
    pub schedules: Arc<dyn ScheduleStore>,
    pub directory: Arc<dyn RecipientDirectory>,
    pub ledger: Arc<dyn SentLedger>,
    pub broadcast: Arc<BroadcastDispatcher>,
    pub request_dispatcher: Arc<RequestDispatcher>,
    pub scheduler: Arc<ScheduledDispatcher>,
}

impl AppState {
    /// Wires every dispatcher over the in-memory backend and the given
    /// transport. Tests hand in a stub transport here.
    pub fn with_transport(
        transport: Arc<dyn PushTransport>,
        settings: SchedulerSettings,
    ) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let requests: Arc<dyn RequestStore> = store.clone();
        let schedules: Arc<dyn ScheduleStore> = store.clone();
        let directory: Arc<dyn RecipientDirectory> = store.clone();
        let ledger: Arc<dyn SentLedger> = store;

        let sender = Arc::new(RecipientSender::new(transport, directory.clone()));
        let broadcast = Arc::new(BroadcastDispatcher::new(directory.clone(), sender.clone()));
        let request_dispatcher = Arc::new(RequestDispatcher::new(requests.clone(), sender));
        let scheduler = Arc::new(ScheduledDispatcher::new(
            schedules.clone(),
            ledger.clone(),
            directory.clone(),
            broadcast.clone(),
            settings,
        ));

        Self {
            requests,
            schedules,
            directory,
            ledger,
            broadcast,
            request_dispatcher,
            scheduler,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        let transport = Arc::new(FcmTransport::with_timeout(
            cfg.fcm.endpoint.clone(),
            cfg.fcm.auth_token.clone(),
            Duration::from_millis(cfg.fcm.timeout_ms),
        ));
        Self::with_transport(transport, cfg.scheduler_settings())
    }
}
