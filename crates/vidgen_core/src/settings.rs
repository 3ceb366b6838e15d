/// Milliseconds on the caller's monotonic clock.
pub type Millis = u64;

/// Poll timing for the status poller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub interval_ms: Millis,
}

impl PollSettings {
    pub const DEFAULT_INTERVAL_MS: Millis = 3_000;
    pub const MIN_INTERVAL_MS: Millis = 500;
    pub const MAX_INTERVAL_MS: Millis = 60_000;

    /// Builds settings with the interval clamped into the accepted range.
    pub fn with_interval_ms(interval_ms: Millis) -> Self {
        Self {
            interval_ms: interval_ms.clamp(Self::MIN_INTERVAL_MS, Self::MAX_INTERVAL_MS),
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: Self::DEFAULT_INTERVAL_MS,
        }
    }
}
