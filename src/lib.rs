//! arcade-encoder: two-player UART arcade encoder decoder
//!
//! This library decodes the encoder's 2-byte-per-player serial protocol into
//! button and axis events for two virtual controllers, with timer-driven
//! release of the special key and an idle fail-safe against stuck inputs.

pub mod backend;
pub mod config;
pub mod encoder;
pub mod manager;
pub mod session;

// Re-export commonly used items
pub use backend::{DeviceHost, InputSink};
pub use config::Config;
pub use encoder::{Axis, Button, ControlState, InputEvent, Player, Timing};
pub use manager::EncoderManager;
pub use session::{Session, SessionError};
