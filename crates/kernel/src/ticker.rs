use std::time::Duration;

/// Interval timer for the fixed-rate tick loop.
///
/// Fires at most once per [`poll`](Self::poll). When the caller falls more
/// than a full period behind, the missed ticks are dropped and the schedule
/// restarts from the current time instead of bursting to catch up.
#[derive(Debug, Clone)]
pub struct FixedTicker {
    period: Duration,
    next_deadline: Duration,
    fired: u64,
    skipped: u64,
}

impl FixedTicker {
    /// First tick is due one period after `start`.
    pub fn new(period: Duration, start: Duration) -> Self {
        assert!(!period.is_zero(), "tick period must be non-zero");
        Self {
            period,
            next_deadline: start + period,
            fired: 0,
            skipped: 0,
        }
    }

    pub fn next_deadline(&self) -> Duration {
        self.next_deadline
    }

    /// Ticks fired so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Ticks dropped because the loop ran late.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Returns true if a tick is due at `now`, and schedules the next one.
    pub fn poll(&mut self, now: Duration) -> bool {
        if now < self.next_deadline {
            return false;
        }

        let late = now - self.next_deadline;
        if late >= self.period {
            let missed = (late.as_nanos() / self.period.as_nanos()) as u64;
            self.skipped += missed;
            tracing::warn!(
                missed,
                late_ms = late.as_secs_f64() * 1000.0,
                "tick loop running late, skipping ticks"
            );
            self.next_deadline = now + self.period;
        } else {
            self.next_deadline += self.period;
        }

        self.fired += 1;
        true
    }
}
