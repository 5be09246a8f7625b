use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "disconnected").
    pub status: String,
}

impl HealthResponse {
    /// The scoring system answered the latest fetch.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// The scoring system is unreachable; the display keeps its last values.
    pub fn disconnected() -> Self {
        Self {
            status: "disconnected".to_string(),
        }
    }
}
