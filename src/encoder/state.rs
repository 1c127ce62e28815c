//! Per-player state diffing
//!
//! Compares each newly decoded bitfield against the last one seen for the
//! same player and turns the differences into discrete events.
//!
//! The axis, not the individual direction bit, is the observable unit: an
//! axis event is emitted whenever either bit of its pair changes, and going
//! straight from up to down produces a single vertical event (-1 -> +1).
//! Axes are emitted first (vertical, horizontal), then the eight buttons in
//! [`Button::PLAYER_BUTTONS`] order.

use log::debug;

use crate::encoder::types::{Axis, Button, ControlState, InputEvent, Player};

/// Result of applying a new bitfield
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDiff {
    /// Events in emission order
    pub events: Vec<InputEvent>,
    /// True if any button or direction is still held after the update
    pub held: bool,
}

/// Last observed bitfield for one player
#[derive(Debug, Clone)]
pub struct PlayerState {
    player: Player,
    previous: ControlState,
}

impl PlayerState {
    pub fn new(player: Player) -> Self {
        Self {
            player,
            previous: ControlState::NEUTRAL,
        }
    }

    pub fn player(&self) -> Player {
        self.player
    }

    /// Current (last applied) state
    pub fn current(&self) -> ControlState {
        self.previous
    }

    /// Diff `next` against the previous state and replace it
    pub fn apply(&mut self, next: ControlState) -> StateDiff {
        let previous = self.previous;
        let mut events = Vec::new();

        for axis in Axis::ALL {
            if previous.axis_changed(&next, axis) {
                let value = next.axis(axis);
                debug!("{} {:?} axis -> {}", self.player, axis, value);
                events.push(InputEvent::Axis { axis, value });
            }
        }

        for button in Button::PLAYER_BUTTONS {
            let pressed = next.is_pressed(button);
            if previous.is_pressed(button) != pressed {
                debug!(
                    "{} {:?} {}",
                    self.player,
                    button,
                    if pressed { "pressed" } else { "released" }
                );
                events.push(InputEvent::Button { button, pressed });
            }
        }

        self.previous = next;

        StateDiff {
            events,
            held: !next.is_neutral(),
        }
    }

    /// Force everything back to neutral (idle fail-safe)
    pub fn reset(&mut self) -> StateDiff {
        self.apply(ControlState::NEUTRAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::constants::*;

    #[test]
    fn test_single_button_press_and_release() {
        let mut state = PlayerState::new(Player::One);

        let diff = state.apply(ControlState::new(BTN_A, 0));
        assert_eq!(diff.events, vec![InputEvent::press(Button::A)]);
        assert!(diff.held);

        let diff = state.apply(ControlState::NEUTRAL);
        assert_eq!(diff.events, vec![InputEvent::release(Button::A)]);
        assert!(!diff.held);
    }

    #[test]
    fn test_repeated_state_emits_nothing() {
        let mut state = PlayerState::new(Player::One);
        state.apply(ControlState::new(BTN_B | BTN_START, DIR_LEFT));

        let diff = state.apply(ControlState::new(BTN_B | BTN_START, DIR_LEFT));
        assert!(diff.events.is_empty());
        assert!(diff.held);
    }

    #[test]
    fn test_up_to_down_is_one_axis_event() {
        let mut state = PlayerState::new(Player::Two);
        let diff = state.apply(ControlState::new(0, DIR_UP));
        assert_eq!(
            diff.events,
            vec![InputEvent::Axis { axis: Axis::Vertical, value: -1 }]
        );

        let diff = state.apply(ControlState::new(0, DIR_DOWN));
        assert_eq!(
            diff.events,
            vec![InputEvent::Axis { axis: Axis::Vertical, value: 1 }]
        );
    }

    #[test]
    fn test_opposite_directions_cancel() {
        let mut state = PlayerState::new(Player::One);
        state.apply(ControlState::new(0, DIR_RIGHT));

        let diff = state.apply(ControlState::new(0, DIR_LEFT | DIR_RIGHT));
        assert_eq!(
            diff.events,
            vec![InputEvent::Axis { axis: Axis::Horizontal, value: 0 }]
        );
        // Both directions are still physically held
        assert!(diff.held);
    }

    #[test]
    fn test_emission_order() {
        let mut state = PlayerState::new(Player::One);
        let diff = state.apply(ControlState::new(
            BTN_SELECT | BTN_A | BTN_TR | BTN_X,
            DIR_UP | DIR_LEFT,
        ));

        assert_eq!(
            diff.events,
            vec![
                InputEvent::Axis { axis: Axis::Vertical, value: -1 },
                InputEvent::Axis { axis: Axis::Horizontal, value: -1 },
                InputEvent::press(Button::A),
                InputEvent::press(Button::X),
                InputEvent::press(Button::TR),
                InputEvent::press(Button::Select),
            ]
        );
    }

    #[test]
    fn test_reset_releases_everything_held() {
        let mut state = PlayerState::new(Player::Two);
        state.apply(ControlState::new(BTN_Y | BTN_TL, DIR_DOWN));

        let diff = state.reset();
        assert_eq!(
            diff.events,
            vec![
                InputEvent::Axis { axis: Axis::Vertical, value: 0 },
                InputEvent::release(Button::Y),
                InputEvent::release(Button::TL),
            ]
        );
        assert!(!diff.held);
        assert!(state.current().is_neutral());

        // Nothing left to release
        assert!(state.reset().events.is_empty());
    }
}
