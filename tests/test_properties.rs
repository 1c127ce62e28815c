//! Property tests for decoding and state diffing

use arcade_encoder::encoder::{decode, FrameBuffer, PlayerState};
use arcade_encoder::{Axis, Button, ControlState, InputEvent, Player};
use proptest::prelude::*;

fn control_state() -> impl Strategy<Value = ControlState> {
    (any::<u8>(), 0u8..16).prop_map(|(buttons, directions)| ControlState::new(buttons, directions))
}

/// Rebuild the externally observable state from an event stream
fn replay(start: ControlState, events: &[InputEvent]) -> ControlState {
    events.iter().fold(start, |state, event| match *event {
        InputEvent::Button { button, pressed } => state.with_button(button, pressed),
        InputEvent::Axis { axis, value } => state.with_axis(axis, value),
    })
}

proptest! {
    #[test]
    fn axis_events_track_latest_bitfield(states in prop::collection::vec(control_state(), 1..64)) {
        let mut player = PlayerState::new(Player::One);
        let mut axes = [0i8; 2];

        for state in &states {
            for event in player.apply(*state).events {
                if let InputEvent::Axis { axis, value } = event {
                    prop_assert!((-1..=1).contains(&value));
                    axes[axis as usize] = value;
                }
            }
            prop_assert_eq!(axes[Axis::Vertical as usize], state.axis(Axis::Vertical));
            prop_assert_eq!(axes[Axis::Horizontal as usize], state.axis(Axis::Horizontal));
        }
    }

    #[test]
    fn replayed_events_reconstruct_state(states in prop::collection::vec(control_state(), 1..64)) {
        let mut player = PlayerState::new(Player::Two);
        let mut observed = ControlState::NEUTRAL;

        for state in &states {
            let diff = player.apply(*state);
            observed = replay(observed, &diff.events);

            prop_assert_eq!(observed.buttons(), state.buttons());
            for axis in Axis::ALL {
                prop_assert_eq!(observed.axis(axis), state.axis(axis));
            }
            prop_assert_eq!(diff.held, !state.is_neutral());
        }
    }

    #[test]
    fn mode_never_comes_from_player_payloads(states in prop::collection::vec(control_state(), 1..32)) {
        let mut player = PlayerState::new(Player::One);
        for state in &states {
            let diff = player.apply(*state);
            let no_mode = diff
                .events
                .iter()
                .all(|e| !matches!(e, InputEvent::Button { button: Button::Mode, .. }));
            prop_assert!(no_mode, "mode reported from a player payload: {:?}", diff.events);
        }
    }

    #[test]
    fn filler_runs_decode_to_nothing(count in 0usize..64) {
        let bytes: Vec<u8> = std::iter::repeat([0xFF, 0xFF]).take(count).flatten().collect();
        prop_assert_eq!(decode(&bytes).count(), 0);
    }

    #[test]
    fn arbitrary_bytes_never_exceed_capacity(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let mut buffer = FrameBuffer::new();
        for byte in bytes {
            if let Some(group) = buffer.push(byte) {
                prop_assert!(group.len() % 2 == 0);
                prop_assert!(decode(group.as_bytes()).count() <= group.len() / 2);
                buffer.clear();
            }
            prop_assert!(buffer.len() < 2);
        }
    }
}
