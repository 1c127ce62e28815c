//! Idle fail-safe deadline
//!
//! Armed while any player input is held; if a full window passes without a
//! payload confirming a held input, every player is forced back to neutral.

use tokio::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct IdleWatch {
    deadline: Option<Instant>,
}

impl IdleWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Replace any pending deadline with `now + window`
    pub fn arm(&mut self, now: Instant, window: Duration) -> Instant {
        let deadline = now + window;
        self.deadline = Some(deadline);
        deadline
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    /// Consume the expiry for `deadline`. Returns false if the watch was
    /// re-armed or disarmed since that deadline was scheduled.
    pub fn expire(&mut self, deadline: Instant) -> bool {
        if self.deadline == Some(deadline) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}
