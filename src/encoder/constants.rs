//! Arcade encoder protocol constants
//!
//! This module contains all the constants needed to talk to the encoder:
//! - Frame sizes and the filler sentinel
//! - Source tags carried in the high nibble of the first byte
//! - Direction and button bit masks
//! - Device identity reported for the two virtual controllers
//! - Default timing windows

// ============================================================================
// Framing
// ============================================================================

/// Maximum number of bytes buffered before a frame group is processed.
/// Enough for both players plus one special key payload.
pub const FRAME_BUFFER_CAPACITY: usize = 6;

/// Size of a single tagged payload
pub const PAYLOAD_LEN: usize = 2;

/// Trailing garbage the encoder emits between reports; carries no state
pub const FILLER_SENTINEL: [u8; PAYLOAD_LEN] = [0xFF, 0xFF];

// ============================================================================
// Source tags (high nibble of byte 0)
// ============================================================================

pub const TAG_SHIFT: u8 = 4;
pub const TAG_PLAYER1: u8 = 0xC;
pub const TAG_PLAYER2: u8 = 0xD;
pub const TAG_SPECIAL: u8 = 0xE;

// ============================================================================
// Directions (low nibble of byte 0)
// ============================================================================

pub const DIRECTION_MASK: u8 = 0x0F;
pub const DIR_UP: u8 = 0x08;
pub const DIR_DOWN: u8 = 0x04;
pub const DIR_LEFT: u8 = 0x02;
pub const DIR_RIGHT: u8 = 0x01;

// ============================================================================
// Buttons (byte 1)
// ============================================================================

pub const BTN_A: u8 = 0x80;
pub const BTN_X: u8 = 0x40;
pub const BTN_Y: u8 = 0x20;
pub const BTN_TR: u8 = 0x10;
pub const BTN_B: u8 = 0x08;
pub const BTN_TL: u8 = 0x04;
pub const BTN_START: u8 = 0x02;
pub const BTN_SELECT: u8 = 0x01;

// ============================================================================
// Device identity
// ============================================================================

pub const DEVICE_NAME_PREFIX: &str = "PandoraClone Arcade encoder Player";
pub const DEVICE_VENDOR: u16 = 0x0000;
pub const DEVICE_PRODUCT: u16 = 0x0001;
pub const DEVICE_VERSION: u16 = 0x0100;

/// Range reported for both absolute axes
pub const AXIS_MIN: i32 = -1;
pub const AXIS_MAX: i32 = 1;

// ============================================================================
// Timing Constants
// ============================================================================

/// Idle fail-safe window (milliseconds). Way longer than the transmit period.
pub const IDLE_TIMEOUT_MS: u64 = 20;

/// Special key release window (milliseconds)
pub const SPECIAL_KEY_TIMEOUT_MS: u64 = 12;
