//! The interactive `watch` loop and the pieces it drives.
pub mod app;
mod effects;
pub(crate) mod persistence;
pub mod render;

use std::time::Instant;

use vidgen_core::Millis;

/// Monotonic milliseconds since the loop started, shared by every thread
/// that stamps messages.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Clock {
    origin: Instant,
}

impl Clock {
    pub(crate) fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub(crate) fn now(&self) -> Millis {
        Millis::try_from(self.origin.elapsed().as_millis()).unwrap_or(Millis::MAX)
    }
}
