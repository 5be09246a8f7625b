use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        control::{ActionResponse, ManualTimerRequest, MatchNumberRequest},
        status::{DisplayStatus, ManualTimerStatus},
    },
    error::ServiceError,
    services::sync_engine::SwitchoverOutcome,
    state::SharedState,
};

/// Advance to the next scheduled match now, dropping any pending switchover.
pub async fn switchover(state: &SharedState) -> Result<DisplayStatus, ServiceError> {
    let reason = match state.engine().trigger_switchover().await {
        SwitchoverOutcome::Advanced => {
            info!("switchover triggered by operator");
            return Ok(state.engine().status().await);
        }
        SwitchoverOutcome::MatchInProgress => {
            "a match is in progress; switchover is only possible between matches"
        }
        SwitchoverOutcome::NothingScheduled => "no upcoming matches cached",
        SwitchoverOutcome::Superseded => "match state changed during the switchover",
    };
    Err(ServiceError::InvalidState(reason.into()))
}

/// Rewrite every cached display value to the sinks.
pub async fn resync(state: &SharedState) -> ActionResponse {
    state.engine().resync().await;
    ActionResponse::new("display state rewritten to every sink")
}

/// Start, stop or reset the manual timer.
pub async fn manual_timer(
    state: &SharedState,
    request: ManualTimerRequest,
) -> Result<ManualTimerStatus, ServiceError> {
    request.validate()?;
    if !state.engine().options().manual_timer {
        return Err(ServiceError::InvalidState("manual timer is disabled".into()));
    }

    Ok(state.engine().manual_timer(request.command()).await)
}

/// Override the current match number.
pub async fn set_match_number(
    state: &SharedState,
    request: MatchNumberRequest,
) -> Result<DisplayStatus, ServiceError> {
    request.validate()?;
    state.engine().set_match_number(request.number).await;
    Ok(state.engine().status().await)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        dto::control::ManualTimerAction,
        extract::MarqueeExtractor,
        services::sync_engine::{EngineOptions, MatchEngine},
        sinks::SinkDispatcher,
        source::{Endpoint, FetchError, FetchResult, SnapshotSource},
        state::{AppState, SseHub, match_state::SwitchoverSettings},
    };

    struct Offline;

    impl SnapshotSource for Offline {
        fn fetch(&self, endpoint: Endpoint) -> BoxFuture<'static, FetchResult<Vec<u8>>> {
            Box::pin(async move {
                Err(FetchError::Timeout {
                    endpoint: endpoint.name(),
                })
            })
        }
    }

    fn app_state() -> SharedState {
        let events = SseHub::new(4);
        let engine = MatchEngine::new(
            SwitchoverSettings {
                auto_switchover: true,
                switchover_time: Duration::from_secs(10),
                manual_timer: false,
                manual_timer_length: 150,
                field_count: 1,
            },
            EngineOptions {
                show_team_names: false,
                manual_timer: false,
                show_match_phase: true,
            },
            Arc::new(Offline),
            Arc::new(MarqueeExtractor),
            SinkDispatcher::default(),
            events.clone(),
        );
        AppState::new(engine, events)
    }

    #[tokio::test]
    async fn switchover_without_cached_matches_is_rejected() {
        let state = app_state();

        match switchover(&state).await {
            Err(ServiceError::InvalidState(message)) => {
                assert_eq!(message, "no upcoming matches cached")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn switchover_during_match_is_rejected() {
        let state = app_state();
        state
            .engine()
            .handle_live_document(
                br#"<div class="nameAndTimer"><h3>Qualification 4</h3><h2>1:00</h2></div>"#,
            )
            .await;

        assert!(matches!(
            switchover(&state).await,
            Err(ServiceError::InvalidState(message)) if message.contains("in progress")
        ));
    }

    #[tokio::test]
    async fn manual_timer_route_requires_manual_mode() {
        let state = app_state();
        let request = ManualTimerRequest {
            action: ManualTimerAction::Start,
            seconds: None,
        };

        assert!(matches!(
            manual_timer(&state, request).await,
            Err(ServiceError::InvalidState(_))
        ));
    }
}
