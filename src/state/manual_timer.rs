use crate::model::format_timer;

/// Local countdown replacing the live document timer when the manual timer mode is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualTimer {
    length: u32,
    remaining: u32,
    running: bool,
}

impl ManualTimer {
    /// Stopped timer holding `length` seconds.
    pub fn new(length: u32) -> Self {
        Self {
            length,
            remaining: length,
            running: false,
        }
    }

    /// Seconds left.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether the countdown is running.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Countdown text, `m:ss`.
    pub fn text(&self) -> String {
        format_timer(self.remaining)
    }

    /// Resume counting down. A timer at zero stays stopped.
    pub fn start(&mut self) {
        self.running = self.remaining > 0;
    }

    /// Pause the countdown.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Stop and load `seconds`, or the configured length.
    pub fn reset(&mut self, seconds: Option<u32>) {
        self.running = false;
        self.remaining = seconds.unwrap_or(self.length);
    }

    /// Advance by one second. Returns the new remaining time when the timer was running.
    pub fn tick(&mut self) -> Option<u32> {
        if !self.running {
            return None;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
        }
        Some(self.remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_and_stops_at_zero() {
        let mut timer = ManualTimer::new(2);
        assert_eq!(timer.tick(), None);

        timer.start();
        assert_eq!(timer.tick(), Some(1));
        assert_eq!(timer.text(), "0:01");
        assert_eq!(timer.tick(), Some(0));
        assert!(!timer.is_running());
        assert_eq!(timer.tick(), None);

        timer.start();
        assert!(!timer.is_running());
    }

    #[test]
    fn reset_loads_length_or_override() {
        let mut timer = ManualTimer::new(150);
        timer.start();
        timer.tick();
        timer.reset(None);
        assert_eq!(timer.remaining(), 150);
        assert!(!timer.is_running());

        timer.reset(Some(30));
        assert_eq!(timer.text(), "0:30");
    }
}
