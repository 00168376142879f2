//! Cooperative repeating schedule.
//!
//! A [`Ticker`] never spawns anything. Its owner asks it how many firings
//! are due at a given instant and runs its handler that many times. This is
//! what drives both the pomodoro one-second tick and the hourly streak
//! expiry sweep.

use chrono::{DateTime, Duration, Local};

#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next_due: Option<DateTime<Local>>,
}

impl Ticker {
    /// Create a stopped ticker. Non-positive periods are clamped to one
    /// second.
    pub fn new(period: Duration) -> Self {
        let period = if period <= Duration::zero() {
            Duration::seconds(1)
        } else {
            period
        };
        Self {
            period,
            next_due: None,
        }
    }

    pub fn every_secs(secs: u64) -> Self {
        Self::new(Duration::seconds(secs.min(u64::from(u32::MAX)) as i64))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Arm the ticker. The first firing is one period after `now`.
    /// Restarting an armed ticker re-bases it on `now`.
    pub fn start(&mut self, now: DateTime<Local>) {
        self.next_due = Some(now + self.period);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn next_due(&self) -> Option<DateTime<Local>> {
        self.next_due
    }

    /// Number of firings due at `now`; the schedule moves past all of them.
    pub fn due(&mut self, now: DateTime<Local>) -> u32 {
        let Some(next) = self.next_due else {
            return 0;
        };
        if now < next {
            return 0;
        }

        let period_ms = self.period.num_milliseconds().max(1);
        let late_ms = (now - next).num_milliseconds();
        let fired = late_ms / period_ms + 1;
        self.next_due = Some(next + Duration::milliseconds(fired * period_ms));
        u32::try_from(fired).unwrap_or(u32::MAX)
    }
}
