//! Channel device backend
//!
//! Forwards every report to a bounded crossbeam channel so a consumer thread
//! can handle controller events. Sends never block: the byte producer may
//! run in an interrupt-like context, so a full channel drops the event and
//! reports an error instead.

use crossbeam_channel::{Sender, TrySendError};
use log::{debug, info};

use crate::backend::{BackendError, DeviceDescriptor, DeviceHost, InputSink};
use crate::encoder::types::{Axis, Button, InputEvent, Player};

/// Controller event as seen by channel consumers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    Connected { player: Player, name: String, phys: String },
    Input { player: Player, event: InputEvent },
    Sync { player: Player },
    Disconnected { player: Player },
}

/// Sink that forwards reports over a channel
#[derive(Debug)]
pub struct ChannelSink {
    descriptor: DeviceDescriptor,
    sender: Sender<ControllerEvent>,
    registered: bool,
}

impl ChannelSink {
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    fn send(&self, event: ControllerEvent) -> Result<(), BackendError> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => BackendError::ChannelFull,
            TrySendError::Disconnected(_) => BackendError::ChannelClosed,
        })
    }
}

impl InputSink for ChannelSink {
    fn report_key(&mut self, button: Button, pressed: bool) -> Result<(), BackendError> {
        if !self.descriptor.supports(button) {
            return Err(BackendError::Operation(format!(
                "{:?} is not a capability of '{}'",
                button, self.descriptor.name
            )));
        }
        self.report(InputEvent::Button { button, pressed })
    }

    fn report_axis(&mut self, axis: Axis, value: i8) -> Result<(), BackendError> {
        self.report(InputEvent::Axis { axis, value })
    }

    fn sync(&mut self) -> Result<(), BackendError> {
        if !self.registered {
            return Err(BackendError::Operation(format!(
                "'{}' is not registered",
                self.descriptor.name
            )));
        }
        self.send(ControllerEvent::Sync {
            player: self.descriptor.player,
        })
    }

    fn report(&mut self, event: InputEvent) -> Result<(), BackendError> {
        if !self.registered {
            return Err(BackendError::Operation(format!(
                "'{}' is not registered",
                self.descriptor.name
            )));
        }
        self.send(ControllerEvent::Input {
            player: self.descriptor.player,
            event,
        })
    }
}

/// Host that creates [`ChannelSink`]s sharing one sender
#[derive(Debug, Clone)]
pub struct ChannelHost {
    sender: Sender<ControllerEvent>,
}

impl ChannelHost {
    pub fn new(sender: Sender<ControllerEvent>) -> Self {
        Self { sender }
    }
}

impl DeviceHost for ChannelHost {
    type Sink = ChannelSink;

    fn allocate(&mut self, descriptor: &DeviceDescriptor) -> Result<ChannelSink, BackendError> {
        debug!("Allocating '{}'", descriptor.name);
        Ok(ChannelSink {
            descriptor: descriptor.clone(),
            sender: self.sender.clone(),
            registered: false,
        })
    }

    fn register(&mut self, sink: &mut ChannelSink) -> Result<(), BackendError> {
        sink.send(ControllerEvent::Connected {
            player: sink.descriptor.player,
            name: sink.descriptor.name.clone(),
            phys: sink.descriptor.phys.clone(),
        })
        .map_err(|e| BackendError::Registration(format!("{}: {}", sink.descriptor.name, e)))?;

        sink.registered = true;
        info!("✓ Registered '{}' ({})", sink.descriptor.name, sink.descriptor.phys);
        Ok(())
    }

    fn unregister(&mut self, sink: &mut ChannelSink) {
        if !sink.registered {
            return;
        }
        sink.registered = false;
        // Consumer may already be gone during shutdown
        let _ = sink.send(ControllerEvent::Disconnected {
            player: sink.descriptor.player,
        });
        info!("Unregistered '{}'", sink.descriptor.name);
    }
}
