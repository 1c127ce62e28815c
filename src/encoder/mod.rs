//! Arcade encoder protocol support
//!
//! This module provides the protocol side of the encoder:
//! - Byte accumulation into frame groups
//! - Payload decoding
//! - Per-player state diffing
//! - Special key debounce and idle fail-safe deadlines

pub mod constants;
pub mod types;
pub mod frame;
pub mod packet;
pub mod state;
pub mod special;
pub mod idle;

// Re-export commonly used items
pub use constants::*;
pub use types::*;
pub use frame::{FrameBuffer, FrameGroup};
pub use packet::{decode, InputFrame, Packet};
pub use state::{PlayerState, StateDiff};
pub use special::SpecialKey;
pub use idle::IdleWatch;
