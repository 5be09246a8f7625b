use serde::Serialize;
use utoipa::ToSchema;

use crate::state::ConnectionState;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    pub message: String,
    pub connection: ConnectionState,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the link to the scoring system changes state.
pub struct ConnectionEvent {
    pub connection: ConnectionState,
    pub connected: bool,
}
