use std::{future::Future, time::Duration};

use tokio::{
    sync::oneshot,
    task::JoinHandle,
    time::{Instant, sleep},
};
use tracing::debug;

struct PendingSwitchover {
    cancel: oneshot::Sender<()>,
    handle: JoinHandle<()>,
    due: Instant,
}

/// Single-shot, cancellable timer driving the automatic switchover.
///
/// Cancellation is best-effort: once the delay has elapsed the fire future runs to
/// completion, even if a cancel arrives while it waits for the engine lock. That race is
/// accepted; callers must not rely on exactly-once cancellation.
#[derive(Default)]
pub struct SwitchoverScheduler {
    pending: Option<PendingSwitchover>,
}

impl SwitchoverScheduler {
    /// Scheduler with nothing armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fire` after `delay`, replacing any previously armed timer.
    pub fn arm<F>(&mut self, delay: Duration, fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel_if_pending();

        let (cancel, cancelled) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = sleep(delay) => fire.await,
                _ = cancelled => debug!("switchover timer cancelled"),
            }
        });

        self.pending = Some(PendingSwitchover {
            cancel,
            handle,
            due: Instant::now() + delay,
        });
    }

    /// Cancel the armed timer, if any. Returns `true` when a timer was still waiting.
    pub fn cancel_if_pending(&mut self) -> bool {
        let Some(pending) = self.pending.take() else {
            return false;
        };
        if pending.handle.is_finished() {
            return false;
        }
        pending.cancel.send(()).is_ok()
    }

    /// Time left before the armed timer fires.
    pub fn due_in(&self) -> Option<Duration> {
        self.pending
            .as_ref()
            .filter(|pending| !pending.handle.is_finished())
            .map(|pending| pending.due.saturating_duration_since(Instant::now()))
    }
}
