//! Wiring of the engine, its background tasks and the HTTP surface from a configuration.

use std::sync::Arc;

use axum::Router;
use tokio::task::JoinHandle;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::AppConfig,
    extract::MarqueeExtractor,
    routes,
    services::{
        connection_supervisor::{self, PollTiming},
        manual_timer,
        sync_engine::{EngineOptions, MatchEngine},
    },
    sinks,
    source::{HttpSnapshotSource, SnapshotSource},
    state::{AppState, SharedState, SseHub},
};

const SSE_CAPACITY: usize = 64;

/// Assembled application, ready to spawn its tasks and serve.
pub struct App {
    state: SharedState,
    source: Arc<dyn SnapshotSource>,
    timing: PollTiming,
}

impl App {
    /// Build the scoring client, the sinks and the engine described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, reqwest::Error> {
        let source: Arc<dyn SnapshotSource> = Arc::new(HttpSnapshotSource::new(
            &config.base_address,
            config.endpoints.clone(),
            config.connection_timeout(),
        )?);

        let events = SseHub::new(SSE_CAPACITY);
        let engine = MatchEngine::new(
            config.into(),
            EngineOptions::from(config),
            source.clone(),
            Arc::new(MarqueeExtractor),
            sinks::dispatcher_from_config(config),
            events.clone(),
        );

        Ok(Self {
            state: AppState::new(engine, events),
            source,
            timing: PollTiming::from(config),
        })
    }

    /// Shared state handed to the HTTP handlers.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Start the connection supervisor and, when enabled, the manual timer ticker.
    pub fn spawn_tasks(&self) -> Vec<JoinHandle<()>> {
        let mut tasks = vec![tokio::spawn(connection_supervisor::run(
            self.state.clone(),
            self.source.clone(),
            self.timing,
        ))];

        if self.state.engine().options().manual_timer {
            info!("manual timer enabled");
            tasks.push(tokio::spawn(manual_timer::run(self.state.engine().clone())));
        }
        tasks
    }

    /// Top-level router with cross-cutting middleware layers.
    pub fn router(&self) -> Router<()> {
        routes::router(self.state.clone())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
    }
}
