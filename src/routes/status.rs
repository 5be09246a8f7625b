use axum::{Json, Router, extract::State, routing::get};

use crate::{dto::status::StatusResponse, services::status_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/status",
    tag = "status",
    responses((status = 200, description = "Current link and display state", body = StatusResponse))
)]
/// Return the link state and every value currently on the display.
pub async fn status(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(status_service::status(&state).await)
}

/// Configure the status routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/status", get(status))
}
