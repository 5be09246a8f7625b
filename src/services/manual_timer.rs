use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tracing::debug;

use crate::services::sync_engine::MatchEngine;

const TICK: Duration = Duration::from_secs(1);

/// Count the manual timer down once per second while it runs.
pub async fn run(engine: MatchEngine) {
    let mut ticker = interval(TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;
    debug!("manual timer ticker started");

    loop {
        ticker.tick().await;
        engine.tick_manual_timer().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        extract::MarqueeExtractor,
        services::sync_engine::{EngineOptions, ManualTimerCommand},
        sinks::SinkDispatcher,
        source::{Endpoint, FetchError, FetchResult, SnapshotSource},
        state::{SseHub, match_state::SwitchoverSettings},
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

    #[tokio::test(start_paused = true)]
    async fn counts_down_only_while_running() {
        let engine = MatchEngine::new(
            SwitchoverSettings {
                auto_switchover: true,
                switchover_time: Duration::from_secs(10),
                manual_timer: true,
                manual_timer_length: 5,
                field_count: 1,
            },
            EngineOptions {
                show_team_names: false,
                manual_timer: true,
                show_match_phase: true,
            },
            Arc::new(Offline),
            Arc::new(MarqueeExtractor),
            SinkDispatcher::default(),
            SseHub::new(4),
        );
        let task = tokio::spawn(run(engine.clone()));

        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(engine.status().await.manual_timer.remaining_secs, 5);

        engine.manual_timer(ManualTimerCommand::Start).await;
        tokio::time::sleep(Duration::from_secs(2)).await;
        let status = engine.status().await;
        assert_eq!(status.manual_timer.remaining_secs, 3);
        assert_eq!(status.timer, "0:03");

        tokio::time::sleep(Duration::from_secs(10)).await;
        let status = engine.status().await;
        assert_eq!(status.manual_timer.remaining_secs, 0);
        assert!(!status.manual_timer.running);

        task.abort();
    }
}
