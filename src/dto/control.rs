use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::services::sync_engine::ManualTimerCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Manual timer action.
pub enum ManualTimerAction {
    Start,
    Stop,
    Reset,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
/// Payload for `POST /manual-timer`.
pub struct ManualTimerRequest {
    pub action: ManualTimerAction,
    /// Seconds loaded by `reset`; defaults to the configured length.
    #[validate(range(min = 1, max = 3600))]
    pub seconds: Option<u32>,
}

impl ManualTimerRequest {
    /// Engine command carried by the request.
    pub fn command(&self) -> ManualTimerCommand {
        match self.action {
            ManualTimerAction::Start => ManualTimerCommand::Start,
            ManualTimerAction::Stop => ManualTimerCommand::Stop,
            ManualTimerAction::Reset => ManualTimerCommand::Reset(self.seconds),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
/// Payload for `POST /match-number`.
pub struct MatchNumberRequest {
    #[validate(range(min = 1, max = 9999))]
    pub number: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Generic acknowledgement returned by control routes.
pub struct ActionResponse {
    pub message: String,
}

impl ActionResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
