use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    model::QuadrantTable,
    state::{ConnectionState, match_state::MatchMode},
};

/// Manual countdown state.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ManualTimerStatus {
    /// Whether the countdown drives the published timer.
    pub enabled: bool,
    /// Whether the countdown is running.
    pub running: bool,
    /// Seconds left.
    pub remaining_secs: u32,
    /// Remaining time rendered as `m:ss`.
    pub text: String,
}

/// Values currently shown on the display and the match the engine is tracking.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DisplayStatus {
    pub mode: MatchMode,
    pub phase: String,
    /// `0` until a match has been established.
    pub match_number: u32,
    pub timer: String,
    pub match_label: String,
    /// Quadrant labels keyed by field number, then by color.
    #[schema(value_type = Object)]
    pub quadrants: QuadrantTable,
    /// Matches cached for the current between-matches period.
    pub upcoming_matches: usize,
    /// Seconds until the automatic switchover, when one is armed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub switchover_due_secs: Option<f64>,
    pub manual_timer: ManualTimerStatus,
}

/// Response of `GET /status`.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Link to the scoring system.
    pub connection: ConnectionState,
    pub connected: bool,
    pub display: DisplayStatus,
    /// RFC 3339 time the snapshot was taken.
    pub generated_at: String,
}
