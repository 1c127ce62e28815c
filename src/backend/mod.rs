//! Backend abstraction for virtual controller devices
//!
//! This module provides a unified interface for allocating, registering and
//! feeding the two virtual controllers the encoder session reports to.

pub mod channel;
pub mod mock;

pub use channel::{ChannelHost, ChannelSink, ControllerEvent};
pub use mock::{MockHost, RecordedEvent, RecordingSink};

use thiserror::Error;

use crate::encoder::constants::*;
use crate::encoder::types::{Axis, Button, InputEvent, Player};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Backend operation failed: {0}")]
    Operation(String),

    #[error("Failed to allocate device: {0}")]
    Allocation(String),

    #[error("Failed to register device: {0}")]
    Registration(String),

    #[error("Event channel is full")]
    ChannelFull,

    #[error("Event channel disconnected")]
    ChannelClosed,
}

/// Bus the encoder is attached through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    Rs232,
}

/// Absolute axis parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisInfo {
    pub axis: Axis,
    pub min: i32,
    pub max: i32,
    pub fuzz: i32,
    pub flat: i32,
}

/// Everything a host needs to create one virtual controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    pub player: Player,
    pub name: String,
    pub phys: String,
    pub bus: BusType,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
    pub keys: Vec<Button>,
    pub axes: Vec<AxisInfo>,
}

impl DeviceDescriptor {
    /// Descriptor for `player` on the transport at `transport_phys`.
    /// Only player 1 carries the mode key.
    pub fn for_player(player: Player, transport_phys: &str) -> Self {
        let mut keys = Button::PLAYER_BUTTONS.to_vec();
        if player == Player::One {
            keys.push(Button::Mode);
        }

        let axes = Axis::ALL
            .iter()
            .map(|&axis| AxisInfo {
                axis,
                min: AXIS_MIN,
                max: AXIS_MAX,
                fuzz: 0,
                flat: 0,
            })
            .collect();

        Self {
            player,
            name: format!("{} {}", DEVICE_NAME_PREFIX, player.number()),
            phys: format!("{}/serio{}", transport_phys, player.index()),
            bus: BusType::Rs232,
            vendor: DEVICE_VENDOR,
            product: DEVICE_PRODUCT,
            version: DEVICE_VERSION,
            keys,
            axes,
        }
    }

    pub fn supports(&self, button: Button) -> bool {
        self.keys.contains(&button)
    }
}

/// Unified interface for one virtual controller
pub trait InputSink: Send + 'static {
    /// Report a key transition
    fn report_key(&mut self, button: Button, pressed: bool) -> Result<(), BackendError>;

    /// Report an absolute axis value
    fn report_axis(&mut self, axis: Axis, value: i8) -> Result<(), BackendError>;

    /// Commit the transitions reported since the last sync
    fn sync(&mut self) -> Result<(), BackendError>;

    /// Report a decoded event
    fn report(&mut self, event: InputEvent) -> Result<(), BackendError> {
        match event {
            InputEvent::Button { button, pressed } => self.report_key(button, pressed),
            InputEvent::Axis { axis, value } => self.report_axis(axis, value),
        }
    }
}

/// Creates and registers virtual controllers with whatever consumes them
pub trait DeviceHost {
    type Sink: InputSink;

    /// Allocate a device. Nothing is visible to consumers yet.
    fn allocate(&mut self, descriptor: &DeviceDescriptor) -> Result<Self::Sink, BackendError>;

    /// Make an allocated device visible to consumers
    fn register(&mut self, sink: &mut Self::Sink) -> Result<(), BackendError>;

    /// Remove a registered device
    fn unregister(&mut self, sink: &mut Self::Sink);
}
