pub mod connection;
pub mod display;
pub mod manual_timer;
pub mod match_state;
mod sse;
pub mod switchover;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    dto::sse::{ConnectionEvent, ServerEvent},
    services::sync_engine::MatchEngine,
};

pub use self::connection::ConnectionState;
pub use self::sse::SseHub;

/// Cheaply cloneable handle to [`AppState`].
pub type SharedState = Arc<AppState>;

const EVENT_CONNECTION: &str = "connection";

/// Central application state shared by the poll supervisor and the HTTP handlers.
pub struct AppState {
    engine: MatchEngine,
    events: SseHub,
    connection: watch::Sender<ConnectionState>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts disconnected until the first probe reaches the scoring system.
    pub fn new(engine: MatchEngine, events: SseHub) -> SharedState {
        let (connection, _rx) = watch::channel(ConnectionState::Disconnected);
        Arc::new(Self {
            engine,
            events,
            connection,
        })
    }

    /// Synchronization engine driving the display.
    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }

    /// Broadcast hub used for the status SSE stream.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Current link state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    /// Whether the latest fetch succeeded.
    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Record a link state and broadcast it when the value changes.
    pub fn update_connection(&self, state: ConnectionState) {
        let changed = self.connection.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
        if !changed {
            return;
        }

        info!(connection = ?state, "scoring system link changed");
        let payload = ConnectionEvent {
            connection: state,
            connected: state == ConnectionState::Connected,
        };
        match ServerEvent::json(Some(EVENT_CONNECTION.to_string()), &payload) {
            Ok(event) => self.events.broadcast(event),
            Err(err) => warn!(error = %err, "failed to serialise connection event"),
        }
    }
}
