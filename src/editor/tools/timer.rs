use std::time::Duration;

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Upper bound on intervals reported by one `advance`. A longer stall drops
/// the backlog instead of replaying it.
pub const MAX_CATCH_UP: u32 = 10;

/// Fixed-interval timer driven by host ticks.
///
/// The owner drops the value to cancel it; a dropped timer can never fire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepeatingTimer {
    interval: Duration,
    pending: Duration,
}

impl RepeatingTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(MIN_INTERVAL),
            pending: Duration::ZERO,
        }
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Advances by `elapsed` and returns how many intervals completed, at
    /// most [`MAX_CATCH_UP`].
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.pending = self.pending.saturating_add(elapsed);
        let due = self.pending.as_nanos() / self.interval.as_nanos();
        if due > u128::from(MAX_CATCH_UP) {
            tracing::debug!(due = %due, "timer fell behind; dropping backlog");
            self.pending = Duration::ZERO;
            return MAX_CATCH_UP;
        }
        let fired = due as u32;
        self.pending -= self.interval * fired;
        fired
    }
}
