use std::time::SystemTime;

use crate::{
    dto::{format_system_time, status::StatusResponse},
    state::SharedState,
};

/// Snapshot of the link and of everything currently on the display.
pub async fn status(state: &SharedState) -> StatusResponse {
    let connection = state.connection_state();
    StatusResponse {
        connection,
        connected: state.is_connected(),
        display: state.engine().status().await,
        generated_at: format_system_time(SystemTime::now()),
    }
}
