use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::{
        control::{ActionResponse, ManualTimerRequest, MatchNumberRequest},
        status::{DisplayStatus, ManualTimerStatus},
    },
    error::AppError,
    services::control_service,
    state::SharedState,
};

/// Operator endpoints driving the display by hand.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/switchover", post(switchover))
        .route("/resync", post(resync))
        .route("/manual-timer", post(manual_timer))
        .route("/match-number", post(match_number))
}

/// Show the next scheduled match now.
#[utoipa::path(
    post,
    path = "/switchover",
    tag = "control",
    responses(
        (status = 200, description = "Switched over", body = DisplayStatus),
        (status = 409, description = "A match is in progress or no upcoming matches are cached")
    )
)]
pub async fn switchover(State(state): State<SharedState>) -> Result<Json<DisplayStatus>, AppError> {
    let status = control_service::switchover(&state).await?;
    Ok(Json(status))
}

/// Rewrite the cached display values to every sink.
#[utoipa::path(
    post,
    path = "/resync",
    tag = "control",
    responses((status = 200, description = "Display rewritten", body = ActionResponse))
)]
pub async fn resync(State(state): State<SharedState>) -> Json<ActionResponse> {
    Json(control_service::resync(&state).await)
}

/// Start, stop or reset the manual timer.
#[utoipa::path(
    post,
    path = "/manual-timer",
    tag = "control",
    request_body = ManualTimerRequest,
    responses(
        (status = 200, description = "Manual timer updated", body = ManualTimerStatus),
        (status = 400, description = "Invalid timer length"),
        (status = 409, description = "Manual timer disabled")
    )
)]
pub async fn manual_timer(
    State(state): State<SharedState>,
    Json(payload): Json<ManualTimerRequest>,
) -> Result<Json<ManualTimerStatus>, AppError> {
    let status = control_service::manual_timer(&state, payload).await?;
    Ok(Json(status))
}

/// Correct the current match number.
#[utoipa::path(
    post,
    path = "/match-number",
    tag = "control",
    request_body = MatchNumberRequest,
    responses(
        (status = 200, description = "Match number updated", body = DisplayStatus),
        (status = 400, description = "Match number out of range")
    )
)]
pub async fn match_number(
    State(state): State<SharedState>,
    Json(payload): Json<MatchNumberRequest>,
) -> Result<Json<DisplayStatus>, AppError> {
    let status = control_service::set_match_number(&state, payload).await?;
    Ok(Json(status))
}
