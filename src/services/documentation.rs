use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the scoring mirror.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::status::status,
        crate::routes::sse::status_stream,
        crate::routes::control::switchover,
        crate::routes::control::resync,
        crate::routes::control::manual_timer,
        crate::routes::control::match_number,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::status::StatusResponse,
            crate::dto::status::DisplayStatus,
            crate::dto::status::ManualTimerStatus,
            crate::dto::control::ManualTimerRequest,
            crate::dto::control::ManualTimerAction,
            crate::dto::control::MatchNumberRequest,
            crate::dto::control::ActionResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::ConnectionEvent,
            crate::state::ConnectionState,
            crate::state::match_state::MatchMode,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "status", description = "Display and connection status"),
        (name = "control", description = "Operator controls"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
