//! Arcade encoder type definitions
//!
//! This module defines the basic data types used throughout the encoder
//! module: players, buttons, axes, the decoded control state, and the
//! events reported to the virtual controllers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::encoder::constants::*;

/// One of the two virtual controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const ALL: [Player; 2] = [Player::One, Player::Two];

    /// Zero-based slot, used to index per-player state
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    /// One-based player number as printed on the cabinet
    pub fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.number())
    }
}

/// Buttons reported by the virtual controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    A,
    B,
    X,
    Y,
    /// Left trigger
    TL,
    /// Right trigger
    TR,
    Start,
    Select,
    /// Special (mode) key, player 1 only
    Mode,
}

impl Button {
    /// The eight per-player buttons, in emission order
    pub const PLAYER_BUTTONS: [Button; 8] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::TL,
        Button::TR,
        Button::Start,
        Button::Select,
    ];

    /// Bit of this button in the second payload byte. `Mode` has no bit, it
    /// travels as its own tag.
    pub fn mask(self) -> u8 {
        match self {
            Button::A => BTN_A,
            Button::B => BTN_B,
            Button::X => BTN_X,
            Button::Y => BTN_Y,
            Button::TL => BTN_TL,
            Button::TR => BTN_TR,
            Button::Start => BTN_START,
            Button::Select => BTN_SELECT,
            Button::Mode => 0,
        }
    }
}

/// Absolute axes derived from the directional bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Y axis: up = -1, down = +1
    Vertical,
    /// X axis: left = -1, right = +1
    Horizontal,
}

impl Axis {
    /// Axes in emission order
    pub const ALL: [Axis; 2] = [Axis::Vertical, Axis::Horizontal];

    /// (negative, positive) direction bits for this axis
    fn bits(self) -> (u8, u8) {
        match self {
            Axis::Vertical => (DIR_UP, DIR_DOWN),
            Axis::Horizontal => (DIR_LEFT, DIR_RIGHT),
        }
    }
}

/// Decoded button + direction bitfield for one player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ControlState {
    buttons: u8,
    directions: u8,
}

impl ControlState {
    /// All buttons released, stick centered
    pub const NEUTRAL: ControlState = ControlState {
        buttons: 0,
        directions: 0,
    };

    /// Build from the raw button byte and direction nibble
    pub fn new(buttons: u8, directions: u8) -> Self {
        Self {
            buttons,
            directions: directions & DIRECTION_MASK,
        }
    }

    pub fn buttons(&self) -> u8 {
        self.buttons
    }

    pub fn directions(&self) -> u8 {
        self.directions
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        let mask = button.mask();
        mask != 0 && self.buttons & mask != 0
    }

    pub fn up(&self) -> bool {
        self.directions & DIR_UP != 0
    }

    pub fn down(&self) -> bool {
        self.directions & DIR_DOWN != 0
    }

    pub fn left(&self) -> bool {
        self.directions & DIR_LEFT != 0
    }

    pub fn right(&self) -> bool {
        self.directions & DIR_RIGHT != 0
    }

    /// Axis value in {-1, 0, 1}. Opposite directions cancel out.
    pub fn axis(&self, axis: Axis) -> i8 {
        let (negative, positive) = axis.bits();
        (self.directions & positive != 0) as i8 - (self.directions & negative != 0) as i8
    }

    /// True if either bit of the axis pair differs from `other`
    pub fn axis_changed(&self, other: &ControlState, axis: Axis) -> bool {
        let (negative, positive) = axis.bits();
        (self.directions ^ other.directions) & (negative | positive) != 0
    }

    /// True if no button and no direction is held
    pub fn is_neutral(&self) -> bool {
        self.buttons == 0 && self.directions == 0
    }

    /// Return a copy with `button` set or cleared
    pub fn with_button(mut self, button: Button, pressed: bool) -> Self {
        if pressed {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
        self
    }

    /// Return a copy with the direction bits set from an axis value
    pub fn with_axis(mut self, axis: Axis, value: i8) -> Self {
        let (negative, positive) = axis.bits();
        self.directions &= !(negative | positive);
        match value.signum() {
            1 => self.directions |= positive,
            -1 => self.directions |= negative,
            _ => {}
        }
        self
    }
}

/// A single change reported to a virtual controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Button { button: Button, pressed: bool },
    Axis { axis: Axis, value: i8 },
}

impl InputEvent {
    pub fn press(button: Button) -> Self {
        InputEvent::Button { button, pressed: true }
    }

    pub fn release(button: Button) -> Self {
        InputEvent::Button { button, pressed: false }
    }
}

/// Timer windows for one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Silence after which every held input is forced back to neutral
    pub idle_timeout: Duration,
    /// Silence after which the special key is considered released
    pub special_key_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_millis(IDLE_TIMEOUT_MS),
            special_key_timeout: Duration::from_millis(SPECIAL_KEY_TIMEOUT_MS),
        }
    }
}
