//! Packet decoding
//!
//! Each 2-byte payload is laid out as:
//!
//! ```text
//! byte 0: [ tag:4 | up down left right ]
//! byte 1: [ A X Y TR B TL START SELECT ]
//! ```
//!
//! Fields are extracted with explicit shifts and masks so the result does
//! not depend on host byte order.

use log::trace;

use crate::encoder::constants::*;
use crate::encoder::types::{ControlState, Player};

/// A raw 2-byte payload with field accessors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputFrame {
    raw: [u8; PAYLOAD_LEN],
}

impl InputFrame {
    pub fn from_bytes(raw: [u8; PAYLOAD_LEN]) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> [u8; PAYLOAD_LEN] {
        self.raw
    }

    /// 4-bit source tag
    pub fn tag(&self) -> u8 {
        self.raw[0] >> TAG_SHIFT
    }

    /// Direction nibble
    pub fn directions(&self) -> u8 {
        self.raw[0] & DIRECTION_MASK
    }

    /// Button byte
    pub fn buttons(&self) -> u8 {
        self.raw[1]
    }

    pub fn is_filler(&self) -> bool {
        self.raw == FILLER_SENTINEL
    }

    pub fn control_state(&self) -> ControlState {
        ControlState::new(self.buttons(), self.directions())
    }
}

/// A payload that carries meaning for the encoder session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packet {
    /// New button/direction state for one player
    Player { player: Player, state: ControlState },
    /// The special key is being held
    Special,
}

impl Packet {
    /// Interpret one payload. Filler and unknown tags yield `None`.
    pub fn decode(frame: InputFrame) -> Option<Packet> {
        if frame.is_filler() {
            trace!("Skipping filler payload");
            return None;
        }

        match frame.tag() {
            TAG_PLAYER1 => Some(Packet::Player {
                player: Player::One,
                state: frame.control_state(),
            }),
            TAG_PLAYER2 => Some(Packet::Player {
                player: Player::Two,
                state: frame.control_state(),
            }),
            TAG_SPECIAL => Some(Packet::Special),
            tag => {
                trace!("Ignoring payload with unknown tag 0x{:x}: {:02x?}", tag, frame.raw());
                None
            }
        }
    }
}

/// Walk a frame group two bytes at a time, yielding meaningful packets.
/// A trailing odd byte is ignored.
pub fn decode(bytes: &[u8]) -> impl Iterator<Item = Packet> + '_ {
    bytes
        .chunks_exact(PAYLOAD_LEN)
        .map(|pair| InputFrame::from_bytes([pair[0], pair[1]]))
        .filter_map(Packet::decode)
}
