use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::BotCfg;

/// Fixed-cadence schedule anchored to the previous cycle's start, so a restart
/// neither double-fires nor drifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    interval: Duration,
    floor: Duration,
}

impl Cadence {
    pub fn new(interval: Duration, floor: Duration) -> Self {
        Self { interval, floor }
    }

    pub fn from_cfg(cfg: &BotCfg) -> Self {
        Self::new(cfg.cycle_interval(), cfg.min_delay())
    }

    /// Time to wait before the next cycle. Never below the floor, including
    /// when no cycle has run yet or the previous one is overdue.
    pub fn next_delay(
        &self,
        last_cycle_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Duration {
        let Some(last) = last_cycle_at else {
            return self.floor;
        };
        let elapsed = (now - last).to_std().unwrap_or(Duration::ZERO);
        self.interval.saturating_sub(elapsed).max(self.floor)
    }
}
