//! Lifecycle engine settings.

use std::time::Duration;

/// Longest accepted advance interval; longer intervals are clamped to it.
pub const MAX_ADVANCE_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Settings for the lifecycle engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Time between consecutive automatic status advances.
    pub advance_interval: Duration,

    /// How often the background worker looks for due advances.
    pub poll_interval: Duration,

    /// Attempts per status write before a version conflict is reported.
    pub max_cas_attempts: u32,

    /// Upper bound on a single notification delivery.
    pub notify_timeout: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            advance_interval: Duration::from_secs(60),
            poll_interval: Duration::from_secs(1),
            max_cas_attempts: 3,
            notify_timeout: Duration::from_secs(5),
        }
    }
}

impl LifecycleConfig {
    /// Sets the advance interval, clamped to [`MAX_ADVANCE_INTERVAL`].
    pub fn with_advance_interval(mut self, interval: Duration) -> Self {
        self.advance_interval = interval.min(MAX_ADVANCE_INTERVAL);
        self
    }

    /// Sets the worker poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the notification delivery timeout.
    pub fn with_notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }
}
