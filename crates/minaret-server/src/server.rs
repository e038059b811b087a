use std::net::SocketAddr;

use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::AppConfig, handlers, state::AppState};

pub struct MinaretServer {
    addr: SocketAddr,
    app: Router,
    state: AppState,
    scheduler_enabled: bool,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Broadcast trigger, callable with query params or a JSON body
        .route(
            "/send-prayer-notification",
            get(handlers::send_prayer_notification).post(handlers::send_prayer_notification),
        )
        // Request queue and schedule entries
        .route("/notifications", post(handlers::create_request))
        .route("/notifications/{id}", get(handlers::get_request))
        .route("/schedules", post(handlers::create_schedule))
        // Device re-registration
        .route("/recipients/{id}", put(handlers::upsert_recipient))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
    state: Option<AppState>,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
            state: None,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    /// Overrides the state built from configuration. Tests use this to hand
    /// in a stub transport.
    pub fn with_state(mut self, state: AppState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn build(self) -> MinaretServer {
        let state = self
            .state
            .unwrap_or_else(|| AppState::from_config(&self.config));
        let app = build_app(state.clone());

        MinaretServer {
            addr: self.addr,
            app,
            state,
            scheduler_enabled: self.config.scheduler.enabled,
        }
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MinaretServer {
    pub async fn run(self) -> anyhow::Result<()> {
        if self.scheduler_enabled {
            let scheduler = self.state.scheduler.clone();
            tokio::spawn(async move {
                scheduler.run().await;
            });
        } else {
            tracing::info!("Scheduled dispatcher disabled by configuration");
        }

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
