//! Special key debounce
//!
//! The encoder never sends an explicit "special key released" payload; it
//! repeats the special tag for as long as the key is held. Release is
//! inferred from a short window of silence.

use log::debug;
use tokio::time::{Duration, Instant};

use crate::encoder::types::{Button, InputEvent};

#[derive(Debug, Default)]
pub struct SpecialKey {
    pressed: bool,
    deadline: Option<Instant>,
}

impl SpecialKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// True while a release deadline is pending
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Handle a special-tagged payload received at `now`.
    ///
    /// Reports a press only on the rising edge, and always moves the release
    /// deadline to `now + window`. Returns the event (if any) and the new
    /// deadline to arm the timer with.
    pub fn on_special_frame(&mut self, now: Instant, window: Duration) -> (Option<InputEvent>, Instant) {
        let event = if self.pressed {
            None
        } else {
            debug!("Special key pressed");
            self.pressed = true;
            Some(InputEvent::press(Button::Mode))
        };

        let deadline = now + window;
        self.deadline = Some(deadline);
        (event, deadline)
    }

    /// Timer expiry for `deadline`. Ignored if a newer payload re-armed the
    /// deadline in the meantime.
    pub fn on_expiry(&mut self, deadline: Instant) -> Option<InputEvent> {
        if self.deadline != Some(deadline) {
            debug!("Stale special key expiry ignored");
            return None;
        }

        self.deadline = None;
        self.pressed = false;
        debug!("Special key released (timeout)");
        Some(InputEvent::release(Button::Mode))
    }

    /// Release without waiting for the timer. Only reports if the key is
    /// currently pressed.
    pub fn force_release(&mut self) -> Option<InputEvent> {
        self.deadline = None;
        if self.pressed {
            self.pressed = false;
            Some(InputEvent::release(Button::Mode))
        } else {
            None
        }
    }

    /// Idle fail-safe release: force the key up unless a release deadline is
    /// still pending, in which case the special timer owns the release.
    pub fn release_if_unarmed(&mut self) -> Option<InputEvent> {
        if self.is_armed() {
            return None;
        }
        self.force_release()
    }
}
