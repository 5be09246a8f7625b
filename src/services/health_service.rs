use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the scoring system answered the latest fetch.
pub fn health_status(state: &SharedState) -> HealthResponse {
    if state.is_connected() {
        HealthResponse::ok()
    } else {
        HealthResponse::disconnected()
    }
}
