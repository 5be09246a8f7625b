use serde::Serialize;
use utoipa::ToSchema;

/// Health of the link to the scoring system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No successful fetch yet, or the latest fast poll failed and is being retried.
    Disconnected,
    /// Link declared lost; the slow probe loop is running.
    Probing,
    /// The latest fetch succeeded.
    Connected,
}

/// What the fast poll loop should do after a failed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollFailure {
    /// Below the quick retry threshold: skip this cycle and poll again.
    Retry {
        /// Consecutive failures so far.
        attempt: u32,
    },
    /// Threshold reached: leave the fast poll loop and go back to probing.
    Lost,
}

/// Two-tier reconnect state machine: a slow probe loop until the first success, then a fast
/// poll loop tolerating a bounded number of consecutive failures.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    state: ConnectionState,
    quick_retry_count: u32,
    quick_retry_max: u32,
}

impl ConnectionTracker {
    /// Create a tracker declaring the link lost after `quick_retry_max` consecutive failures.
    pub fn new(quick_retry_max: u32) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            quick_retry_count: 0,
            quick_retry_max: quick_retry_max.max(1),
        }
    }

    /// Current link state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Consecutive failed fast polls.
    pub fn quick_retry_count(&self) -> u32 {
        self.quick_retry_count
    }

    /// Whether the latest fetch succeeded.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Enter the probe loop.
    pub fn start_probing(&mut self) {
        self.state = ConnectionState::Probing;
        self.quick_retry_count = 0;
    }

    /// A probe reached the scoring system; the fast poll loop takes over.
    pub fn probe_succeeded(&mut self) {
        self.state = ConnectionState::Connected;
        self.quick_retry_count = 0;
    }

    /// A fast poll succeeded. Returns `true` when it ends a run of failures.
    pub fn poll_succeeded(&mut self) -> bool {
        let restored = self.quick_retry_count != 0;
        self.quick_retry_count = 0;
        self.state = ConnectionState::Connected;
        restored
    }

    /// A fast poll failed.
    pub fn poll_failed(&mut self) -> PollFailure {
        self.quick_retry_count += 1;
        if self.quick_retry_count >= self.quick_retry_max {
            self.start_probing();
            PollFailure::Lost
        } else {
            self.state = ConnectionState::Disconnected;
            PollFailure::Retry {
                attempt: self.quick_retry_count,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(max: u32) -> ConnectionTracker {
        let mut tracker = ConnectionTracker::new(max);
        tracker.start_probing();
        tracker.probe_succeeded();
        tracker
    }

    #[test]
    fn starts_disconnected() {
        let tracker = ConnectionTracker::new(4);
        assert_eq!(tracker.state(), ConnectionState::Disconnected);
        assert!(!tracker.is_connected());
    }

    #[test]
    fn threshold_of_consecutive_failures_returns_to_probing() {
        let mut tracker = connected(4);

        for attempt in 1..4 {
            assert_eq!(tracker.poll_failed(), PollFailure::Retry { attempt });
            assert!(!tracker.is_connected());
        }
        assert_eq!(tracker.poll_failed(), PollFailure::Lost);
        assert_eq!(tracker.state(), ConnectionState::Probing);
        assert_eq!(tracker.quick_retry_count(), 0);
    }

    #[test]
    fn interleaved_success_resets_the_counter() {
        let mut tracker = connected(4);

        tracker.poll_failed();
        tracker.poll_failed();
        tracker.poll_failed();
        assert!(tracker.poll_succeeded());
        assert_eq!(tracker.quick_retry_count(), 0);
        assert!(tracker.is_connected());

        for _ in 0..3 {
            assert!(matches!(tracker.poll_failed(), PollFailure::Retry { .. }));
        }
        assert_eq!(tracker.poll_failed(), PollFailure::Lost);
    }

    #[test]
    fn plain_success_is_not_a_restore() {
        let mut tracker = connected(4);
        assert!(!tracker.poll_succeeded());
    }
}
