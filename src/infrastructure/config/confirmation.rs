//! Receipt tracking settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// `[confirmation]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConfirmationConfig {
    /// Interval between receipt polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Give up waiting for a receipt after this many seconds. Unset waits
    /// indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Capacity of the slot event channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

const fn default_poll_interval_ms() -> u64 {
    2_000
}

const fn default_event_capacity() -> usize {
    256
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: None,
            event_capacity: default_event_capacity(),
        }
    }
}

impl ConfirmationConfig {
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}
