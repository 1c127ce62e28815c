//! Encoder session
//!
//! A session ties one transport attachment to two virtual controllers. It
//! owns the frame buffer, both player states, the special key state and the
//! two fail-safe timers. All of them live behind a single mutex that is
//! held while a frame group is processed and while either timer callback
//! runs, so the three contexts never observe each other half-way.

mod timer;

use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::backend::{BackendError, DeviceDescriptor, DeviceHost, InputSink};
use crate::encoder::frame::FrameBuffer;
use crate::encoder::idle::IdleWatch;
use crate::encoder::packet::{self, Packet};
use crate::encoder::special::SpecialKey;
use crate::encoder::state::PlayerState;
use crate::encoder::types::{ControlState, InputEvent, Player, Timing};
use timer::TimerHandle;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No tokio runtime available to drive the session timers")]
    NoRuntime,

    #[error("Failed to allocate '{device}': {source}")]
    Allocation {
        device: String,
        #[source]
        source: BackendError,
    },

    #[error("Failed to register '{device}': {source}")]
    Registration {
        device: String,
        #[source]
        source: BackendError,
    },
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the byte producer and both timer callbacks
struct Shared<S: InputSink> {
    frame: FrameBuffer,
    players: [PlayerState; 2],
    sinks: [S; 2],
    special: SpecialKey,
    idle: IdleWatch,
    idle_timer: TimerHandle,
    special_timer: TimerHandle,
    timing: Timing,
    attached: bool,
}

impl<S: InputSink> Shared<S> {
    fn receive_byte(&mut self, byte: u8) {
        if !self.attached {
            return;
        }

        if let Some(group) = self.frame.push(byte) {
            self.process_group(group.as_bytes());
            self.frame.clear();
        }
    }

    /// Decode one frame group and update timers.
    ///
    /// The idle timer is (re)armed only when a player payload in this group
    /// decoded to a held input. It is disarmed once a group carrying player
    /// data leaves both players neutral; otherwise a pending deadline is left
    /// to run, so a hold that stopped being confirmed still times out.
    /// Special-key payloads alone never touch it.
    fn process_group(&mut self, bytes: &[u8]) {
        let now = Instant::now();
        let mut player_seen = false;
        let mut held = false;

        for packet in packet::decode(bytes) {
            match packet {
                Packet::Player { player, state } => {
                    player_seen = true;
                    let diff = self.players[player.index()].apply(state);
                    held |= diff.held;
                    self.dispatch(player, &diff.events);
                }
                Packet::Special => {
                    let window = self.timing.special_key_timeout;
                    let (event, deadline) = self.special.on_special_frame(now, window);
                    if let Some(event) = event {
                        self.dispatch(Player::One, &[event]);
                    }
                    self.special_timer.arm(deadline);
                }
            }
        }

        if !player_seen {
            return;
        }

        if held {
            let deadline = self.idle.arm(now, self.timing.idle_timeout);
            self.idle_timer.arm(deadline);
        } else if self.players.iter().all(|p| p.current().is_neutral()) {
            self.idle.disarm();
            self.idle_timer.disarm();
        }
    }

    fn on_idle_expiry(&mut self, deadline: Instant) {
        if !self.attached || !self.idle.expire(deadline) {
            return;
        }

        debug!("No input confirmed within {:?}, forcing neutral", self.timing.idle_timeout);

        for player in Player::ALL {
            let mut events = Vec::new();
            // A pressed special key normally still has its own deadline
            // pending and is left to that timer
            if player == Player::One {
                events.extend(self.special.release_if_unarmed());
            }
            events.extend(self.players[player.index()].reset().events);
            self.dispatch(player, &events);
        }
    }

    fn on_special_expiry(&mut self, deadline: Instant) {
        if !self.attached {
            return;
        }

        if let Some(event) = self.special.on_expiry(deadline) {
            self.dispatch(Player::One, &[event]);
        }
    }

    /// Report a batch to one player's sink and commit it
    fn dispatch(&mut self, player: Player, events: &[InputEvent]) {
        if events.is_empty() {
            return;
        }

        let sink = &mut self.sinks[player.index()];
        for event in events {
            if let Err(e) = sink.report(*event) {
                warn!("Failed to report {:?} for {}: {}", event, player, e);
            }
        }
        if let Err(e) = sink.sync() {
            warn!("Failed to sync {}: {}", player, e);
        }
    }
}

/// One transport attachment
pub struct Session<S: InputSink> {
    shared: Arc<Mutex<Shared<S>>>,
    phys: String,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: InputSink> Session<S> {
    /// Create both virtual controllers on `host` and start the timers.
    ///
    /// Must be called from within a tokio runtime. Both devices are
    /// allocated before either is registered; any failure rolls back what
    /// was already done and no timer is started.
    pub fn attach<H>(host: &mut H, phys: &str, timing: Timing) -> Result<Self, SessionError>
    where
        H: DeviceHost<Sink = S>,
    {
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;

        let p1_descriptor = DeviceDescriptor::for_player(Player::One, phys);
        let p2_descriptor = DeviceDescriptor::for_player(Player::Two, phys);

        let mut p1 = host
            .allocate(&p1_descriptor)
            .map_err(|source| SessionError::Allocation {
                device: p1_descriptor.name.clone(),
                source,
            })?;
        let mut p2 = host
            .allocate(&p2_descriptor)
            .map_err(|source| SessionError::Allocation {
                device: p2_descriptor.name.clone(),
                source,
            })?;

        host.register(&mut p1)
            .map_err(|source| SessionError::Registration {
                device: p1_descriptor.name.clone(),
                source,
            })?;
        if let Err(source) = host.register(&mut p2) {
            host.unregister(&mut p1);
            return Err(SessionError::Registration {
                device: p2_descriptor.name.clone(),
                source,
            });
        }

        let (idle_timer, idle_task) = timer::channel("idle");
        let (special_timer, special_task) = timer::channel("special key");

        let shared = Arc::new(Mutex::new(Shared {
            frame: FrameBuffer::new(),
            players: [PlayerState::new(Player::One), PlayerState::new(Player::Two)],
            sinks: [p1, p2],
            special: SpecialKey::new(),
            idle: IdleWatch::new(),
            idle_timer,
            special_timer,
            timing,
            attached: true,
        }));

        let cancel = CancellationToken::new();

        let idle_shared = Arc::clone(&shared);
        let idle_join = idle_task.spawn(&runtime, cancel.clone(), move |deadline| {
            lock(&idle_shared).on_idle_expiry(deadline);
        });

        let special_shared = Arc::clone(&shared);
        let special_join = special_task.spawn(&runtime, cancel.clone(), move |deadline| {
            lock(&special_shared).on_special_expiry(deadline);
        });

        info!("✓ Encoder session attached on {}", phys);

        Ok(Self {
            shared,
            phys: phys.to_string(),
            cancel,
            tasks: Mutex::new(vec![idle_join, special_join]),
        })
    }

    /// Feed one transport byte. Never waits on anything but the session
    /// guard, which is only held for bounded work.
    pub fn receive_byte(&self, byte: u8) {
        lock(&self.shared).receive_byte(byte);
    }

    /// Feed a run of transport bytes, one at a time
    pub fn receive(&self, bytes: &[u8]) {
        for &byte in bytes {
            self.receive_byte(byte);
        }
    }

    pub fn phys(&self) -> &str {
        &self.phys
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.shared).attached
    }

    pub fn timing(&self) -> Timing {
        lock(&self.shared).timing
    }

    /// Last state applied for `player`
    pub fn player_state(&self, player: Player) -> ControlState {
        lock(&self.shared).players[player.index()].current()
    }

    pub fn special_key_pressed(&self) -> bool {
        lock(&self.shared).special.is_pressed()
    }

    pub fn idle_timer_armed(&self) -> bool {
        lock(&self.shared).idle.is_armed()
    }

    pub fn special_timer_armed(&self) -> bool {
        lock(&self.shared).special.is_armed()
    }

    /// Stop both timers, wait for any running callback to finish, then
    /// unregister both controllers. Calling it again is a no-op.
    pub async fn detach<H>(&self, host: &mut H)
    where
        H: DeviceHost<Sink = S>,
    {
        let was_attached = {
            let mut shared = lock(&self.shared);
            std::mem::replace(&mut shared.attached, false)
        };
        if !was_attached {
            debug!("Session on {} already detached", self.phys);
            return;
        }

        info!("Detaching encoder session on {}...", self.phys);
        self.cancel.cancel();

        let tasks = std::mem::take(&mut *lock(&self.tasks));
        for task in tasks {
            if let Err(e) = task.await {
                warn!("Timer task ended abnormally: {}", e);
            }
        }

        {
            let mut shared = lock(&self.shared);
            shared.frame.clear();
            for sink in shared.sinks.iter_mut() {
                host.unregister(sink);
            }
        }

        info!("✓ Encoder session on {} detached", self.phys);
    }
}

impl<S: InputSink> Drop for Session<S> {
    fn drop(&mut self) {
        // Timers must not outlive the session even if detach was skipped
        self.cancel.cancel();
    }
}
