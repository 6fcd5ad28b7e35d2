//! Reconnection policy for the engine connection.
//!
//! The policy is a fixed delay between attempts with no retry limit: the
//! supervisor keeps trying until the client is shut down.

use std::time::Duration;

/// Default delay between connection attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Configuration for reconnection behavior.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before every reconnect attempt.
    pub delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

/// Tracks consecutive failed attempts and yields the delay before the next.
pub struct ReconnectState {
    config: ReconnectConfig,
    attempts: u64,
}

impl ReconnectState {
    /// Creates a new reconnect state with the given configuration.
    #[must_use]
    pub fn new(config: ReconnectConfig) -> Self {
        Self {
            config,
            attempts: 0,
        }
    }

    /// Records a failed or terminated connection and returns the delay
    /// before the next attempt.
    pub fn on_failure(&mut self) -> Duration {
        self.attempts = self.attempts.saturating_add(1);
        self.config.delay
    }

    /// Resets the attempt counter after a successful connection.
    pub fn on_success(&mut self) {
        self.attempts = 0;
    }

    /// Returns the number of attempts since the last successful connection.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        self.attempts
    }
}
