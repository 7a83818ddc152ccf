//! Manually driven [`Clock`] for deterministic time in tests.

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use crate::port::Clock;

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock reading `epoch_secs`.
    pub fn at(epoch_secs: i64) -> Self {
        let now = Utc
            .timestamp_opt(epoch_secs, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        *self.now.lock() += chrono::Duration::seconds(secs);
    }

    pub fn set_epoch_secs(&self, epoch_secs: i64) {
        if let Some(now) = Utc.timestamp_opt(epoch_secs, 0).single() {
            *self.now.lock() = now;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_epoch_seconds() {
        let clock = ManualClock::at(100);
        clock.advance_secs(61);
        assert_eq!(clock.epoch_secs(), 161);
        clock.set_epoch_secs(5);
        assert_eq!(clock.epoch_secs(), 5);
    }
}
