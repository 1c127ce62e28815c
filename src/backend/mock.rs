//! Mock device backend for testing.
//!
//! This backend records every report into a shared log instead of handing
//! it to a real input subsystem, and logs it at info level. Allocation and
//! registration failures can be injected per player to exercise rollback.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::backend::{BackendError, DeviceDescriptor, DeviceHost, InputSink};
use crate::encoder::types::{Axis, Button, InputEvent, Player};

/// One report as seen by a mock sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordedEvent {
    Key { player: Player, button: Button, pressed: bool },
    Axis { player: Player, axis: Axis, value: i8 },
    Sync { player: Player },
}

impl RecordedEvent {
    pub fn player(&self) -> Player {
        match *self {
            RecordedEvent::Key { player, .. }
            | RecordedEvent::Axis { player, .. }
            | RecordedEvent::Sync { player } => player,
        }
    }

    /// The decoded event, or `None` for a sync marker
    pub fn input_event(&self) -> Option<InputEvent> {
        match *self {
            RecordedEvent::Key { button, pressed, .. } => Some(InputEvent::Button { button, pressed }),
            RecordedEvent::Axis { axis, value, .. } => Some(InputEvent::Axis { axis, value }),
            RecordedEvent::Sync { .. } => None,
        }
    }
}

type EventLog = Arc<Mutex<Vec<RecordedEvent>>>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock sink that records reports instead of sending them.
#[derive(Debug)]
pub struct RecordingSink {
    player: Player,
    name: String,
    log: EventLog,
    live: Arc<AtomicUsize>,
}

impl RecordingSink {
    pub fn player(&self) -> Player {
        self.player
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn record(&self, event: RecordedEvent) {
        lock(&self.log).push(event);
    }
}

impl Drop for RecordingSink {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl InputSink for RecordingSink {
    fn report_key(&mut self, button: Button, pressed: bool) -> Result<(), BackendError> {
        info!(
            "[MOCK {}] Key {}: {:?}",
            self.player,
            if pressed { "DOWN" } else { "UP" },
            button
        );
        self.record(RecordedEvent::Key {
            player: self.player,
            button,
            pressed,
        });
        Ok(())
    }

    fn report_axis(&mut self, axis: Axis, value: i8) -> Result<(), BackendError> {
        info!("[MOCK {}] Axis {:?}: {}", self.player, axis, value);
        self.record(RecordedEvent::Axis {
            player: self.player,
            axis,
            value,
        });
        Ok(())
    }

    fn sync(&mut self) -> Result<(), BackendError> {
        self.record(RecordedEvent::Sync { player: self.player });
        Ok(())
    }
}

/// Mock host handing out [`RecordingSink`]s that share one event log.
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    log: EventLog,
    registered: Arc<Mutex<Vec<String>>>,
    live: Arc<AtomicUsize>,
    fail_allocate: Option<Player>,
    fail_register: Option<Player>,
}

impl MockHost {
    /// Create a new mock host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make allocation of `player`'s device fail
    pub fn with_allocation_failure(mut self, player: Player) -> Self {
        self.fail_allocate = Some(player);
        self
    }

    /// Make registration of `player`'s device fail
    pub fn with_registration_failure(mut self, player: Player) -> Self {
        self.fail_register = Some(player);
        self
    }

    /// Every report recorded so far, sync markers included
    pub fn events(&self) -> Vec<RecordedEvent> {
        lock(&self.log).clone()
    }

    /// Decoded events reported for `player`, sync markers excluded
    pub fn events_for(&self, player: Player) -> Vec<InputEvent> {
        lock(&self.log)
            .iter()
            .filter(|e| e.player() == player)
            .filter_map(RecordedEvent::input_event)
            .collect()
    }

    /// Number of sync markers recorded for `player`
    pub fn syncs_for(&self, player: Player) -> usize {
        lock(&self.log)
            .iter()
            .filter(|e| matches!(e, RecordedEvent::Sync { player: p } if *p == player))
            .count()
    }

    pub fn clear_events(&self) {
        lock(&self.log).clear();
    }

    /// Names of currently registered devices
    pub fn registered(&self) -> Vec<String> {
        lock(&self.registered).clone()
    }

    /// Number of allocated sinks not yet dropped
    pub fn live_devices(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl DeviceHost for MockHost {
    type Sink = RecordingSink;

    fn allocate(&mut self, descriptor: &DeviceDescriptor) -> Result<RecordingSink, BackendError> {
        if self.fail_allocate == Some(descriptor.player) {
            return Err(BackendError::Allocation(descriptor.name.clone()));
        }

        self.live.fetch_add(1, Ordering::SeqCst);
        info!("[MOCK HOST] Allocated '{}' ({})", descriptor.name, descriptor.phys);
        Ok(RecordingSink {
            player: descriptor.player,
            name: descriptor.name.clone(),
            log: Arc::clone(&self.log),
            live: Arc::clone(&self.live),
        })
    }

    fn register(&mut self, sink: &mut RecordingSink) -> Result<(), BackendError> {
        if self.fail_register == Some(sink.player) {
            return Err(BackendError::Registration(sink.name.clone()));
        }

        info!("[MOCK HOST] Registered '{}'", sink.name);
        lock(&self.registered).push(sink.name.clone());
        Ok(())
    }

    fn unregister(&mut self, sink: &mut RecordingSink) {
        info!("[MOCK HOST] Unregistered '{}'", sink.name);
        lock(&self.registered).retain(|name| name != &sink.name);
    }
}
