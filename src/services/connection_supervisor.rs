use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    source::{Endpoint, SnapshotSource},
    state::{
        SharedState,
        connection::{ConnectionTracker, PollFailure},
    },
};

/// Pacing of the probe and poll loops.
#[derive(Debug, Clone, Copy)]
pub struct PollTiming {
    /// Pause between two probes while the link is down.
    pub retry_delay: Duration,
    /// Pause between two live document fetches while connected.
    pub parsing_period: Duration,
    /// Consecutive failed polls after which the link is declared lost.
    pub quick_retry_max: u32,
}

impl From<&AppConfig> for PollTiming {
    fn from(config: &AppConfig) -> Self {
        Self {
            retry_delay: config.connection_retry_delay(),
            parsing_period: config.parsing_period(),
            quick_retry_max: config.quick_retry_max_count,
        }
    }
}

/// Keep the display in sync with the scoring system for as long as the task lives.
///
/// Alternates between a slow probe loop, run until a fetch succeeds, and a fast poll loop
/// that hands every live document to the engine and returns to probing after
/// [`PollTiming::quick_retry_max`] consecutive failures. Exactly one loop runs at a time.
pub async fn run(state: SharedState, source: Arc<dyn SnapshotSource>, timing: PollTiming) {
    let mut tracker = ConnectionTracker::new(timing.quick_retry_max);

    loop {
        probe(&state, source.as_ref(), &mut tracker, timing.retry_delay).await;
        poll(&state, source.as_ref(), &mut tracker, timing.parsing_period).await;
    }
}

async fn probe(
    state: &SharedState,
    source: &dyn SnapshotSource,
    tracker: &mut ConnectionTracker,
    retry_delay: Duration,
) {
    tracker.start_probing();
    state.update_connection(tracker.state());

    let mut attempt: u32 = 0;
    loop {
        sleep(retry_delay).await;
        attempt += 1;

        match source.fetch(Endpoint::LiveMatch).await {
            Ok(body) => {
                tracker.probe_succeeded();
                state.update_connection(tracker.state());
                info!(attempt, "connected to the scoring system");
                state.engine().handle_live_document(&body).await;
                return;
            }
            Err(err) => {
                if attempt == 1 {
                    warn!(error = %err, "scoring system unreachable; probing");
                } else {
                    debug!(attempt, error = %err, "probe failed");
                }
            }
        }
    }
}

async fn poll(
    state: &SharedState,
    source: &dyn SnapshotSource,
    tracker: &mut ConnectionTracker,
    parsing_period: Duration,
) {
    loop {
        sleep(parsing_period).await;

        match source.fetch(Endpoint::LiveMatch).await {
            Ok(body) => {
                if tracker.poll_succeeded() {
                    info!("scoring system answering again");
                }
                state.update_connection(tracker.state());
                state.engine().handle_live_document(&body).await;
            }
            Err(err) => match tracker.poll_failed() {
                PollFailure::Retry { attempt } => {
                    warn!(attempt, error = %err, "live document fetch failed; retrying");
                    state.update_connection(tracker.state());
                }
                PollFailure::Lost => {
                    warn!(error = %err, "lost connection to the scoring system");
                    return;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::VecDeque, sync::Mutex};

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        extract::MarqueeExtractor,
        services::sync_engine::{EngineOptions, MatchEngine},
        sinks::SinkDispatcher,
        source::{FetchError, FetchResult},
        state::{AppState, ConnectionState, SseHub, match_state::SwitchoverSettings},
    };

    /// Source answering live document fetches from a script; `None` is a timeout.
    /// Once the script runs out every fetch fails.
    struct ScriptedSource {
        script: Mutex<VecDeque<Option<&'static str>>>,
    }

    impl ScriptedSource {
        fn new(script: &[Option<&'static str>]) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.iter().copied().collect()),
            })
        }
    }

    impl SnapshotSource for ScriptedSource {
        fn fetch(&self, endpoint: Endpoint) -> BoxFuture<'static, FetchResult<Vec<u8>>> {
            let next = match endpoint {
                Endpoint::LiveMatch => self.script.lock().unwrap().pop_front().flatten(),
                _ => None,
            };
            Box::pin(async move {
                next.map(|body| body.as_bytes().to_vec())
                    .ok_or(FetchError::Timeout {
                        endpoint: endpoint.name(),
                    })
            })
        }
    }

    const LIVE: &str = r#"<div class="nameAndTimer"><h3>Qualification 4</h3><h2>1:00</h2></div>"#;

    fn app_state(source: Arc<ScriptedSource>) -> SharedState {
        let events = SseHub::new(16);
        let engine = MatchEngine::new(
            SwitchoverSettings {
                auto_switchover: true,
                switchover_time: Duration::from_secs(10),
                manual_timer: false,
                manual_timer_length: 150,
                field_count: 2,
            },
            EngineOptions {
                show_team_names: false,
                manual_timer: false,
                show_match_phase: true,
            },
            source,
            Arc::new(MarqueeExtractor),
            SinkDispatcher::default(),
            events.clone(),
        );
        AppState::new(engine, events)
    }

    fn timing() -> PollTiming {
        PollTiming {
            retry_delay: Duration::from_secs(1),
            parsing_period: Duration::from_millis(500),
            quick_retry_max: 3,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn probes_until_first_success_then_polls() {
        let source = ScriptedSource::new(&[None, None, Some(LIVE), Some(LIVE)]);
        let state = app_state(source.clone());
        let task = tokio::spawn(run(state.clone(), source, timing()));

        sleep(Duration::from_millis(2_500)).await;
        assert_eq!(state.connection_state(), ConnectionState::Probing);

        sleep(Duration::from_millis(600)).await;
        assert!(state.is_connected());
        assert_eq!(state.engine().status().await.match_number, 4);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_poll_failures_fall_back_to_probing() {
        let source = ScriptedSource::new(&[Some(LIVE), None, None, Some(LIVE), None, None, None]);
        let state = app_state(source.clone());
        let task = tokio::spawn(run(state.clone(), source, timing()));

        // probe at 1s, then failures at 1.5s and 2s
        sleep(Duration::from_millis(2_100)).await;
        assert_eq!(state.connection_state(), ConnectionState::Disconnected);

        // success at 2.5s resets the counter
        sleep(Duration::from_millis(500)).await;
        assert!(state.is_connected());

        // three more failures at 3s, 3.5s and 4s
        sleep(Duration::from_millis(1_500)).await;
        assert_eq!(state.connection_state(), ConnectionState::Probing);

        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn connection_changes_are_broadcast() {
        let source = ScriptedSource::new(&[Some(LIVE)]);
        let state = app_state(source.clone());
        let mut events = state.events().subscribe();
        let task = tokio::spawn(run(state.clone(), source, timing()));

        sleep(Duration::from_millis(1_100)).await;
        task.abort();

        let mut connection_events = Vec::new();
        while let Ok(event) = events.try_recv() {
            if event.event.as_deref() == Some("connection") {
                connection_events.push(event.data);
            }
        }
        assert_eq!(
            connection_events,
            vec![
                r#"{"connection":"probing","connected":false}"#.to_string(),
                r#"{"connection":"connected","connected":true}"#.to_string(),
            ]
        );
    }
}
