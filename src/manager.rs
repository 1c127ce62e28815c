//! High-level encoder manager
//!
//! This module wires a byte transport to an encoder session: it owns the
//! runtime that drives the session timers, the channel host the virtual
//! controllers report through, and the thread that reads the transport.

use crossbeam_channel::{bounded, Receiver};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tokio::runtime::{Builder, Runtime};

use crate::backend::{ChannelHost, ChannelSink, ControllerEvent};
use crate::config::Config;
use crate::session::{Session, SessionError};

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Manager is already running")]
    AlreadyRunning,

    #[error("Failed to create timer runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Failed to open transport {path}: {source}")]
    Transport {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to spawn transport thread: {0}")]
    Thread(#[source] std::io::Error),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Manager for one encoder attached to a serial device
pub struct EncoderManager {
    config: Config,
    runtime: Runtime,
    host: ChannelHost,
    event_receiver: Receiver<ControllerEvent>,
    session: Option<Arc<Session<ChannelSink>>>,
    /// Reader thread; may outlive `stop` while blocked on a read
    transport: Option<JoinHandle<()>>,
    /// Running flag
    running: Arc<AtomicBool>,
}

impl EncoderManager {
    /// Create a new encoder manager
    pub fn new(config: Config) -> Result<Self, ManagerError> {
        let (event_sender, event_receiver) = bounded(config.events.channel_capacity);

        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("encoder-timers")
            .enable_time()
            .build()
            .map_err(ManagerError::Runtime)?;

        Ok(Self {
            config,
            runtime,
            host: ChannelHost::new(event_sender),
            event_receiver,
            session: None,
            transport: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Open the configured serial device and start decoding it
    pub fn start(&mut self) -> Result<(), ManagerError> {
        let path = self.config.device.path.clone();
        let file = File::open(&path).map_err(|source| ManagerError::Transport { path, source })?;
        self.start_with_reader(BufReader::new(file))
    }

    /// Start decoding bytes from an arbitrary reader
    pub fn start_with_reader<R>(&mut self, reader: R) -> Result<(), ManagerError>
    where
        R: Read + Send + 'static,
    {
        if self.running.load(Ordering::SeqCst) || self.session.is_some() || self.transport_active() {
            return Err(ManagerError::AlreadyRunning);
        }
        self.reap_transport();

        info!("Starting encoder manager...");

        let session = {
            let _guard = self.runtime.enter();
            Session::attach(&mut self.host, &self.config.device.phys, self.config.timing())?
        };
        let session = Arc::new(session);

        self.running.store(true, Ordering::SeqCst);
        match self.start_transport_thread(reader, Arc::clone(&session)) {
            Ok(handle) => self.transport = Some(handle),
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                self.runtime.block_on(session.detach(&mut self.host));
                return Err(e);
            }
        }
        self.session = Some(session);

        info!("✓ Manager started! Waiting for encoder data...");
        Ok(())
    }

    /// Stop reading and detach the session.
    ///
    /// The reader thread cannot be interrupted mid-read. If it is still
    /// blocked it keeps running until its next byte or EOF, feeding nothing
    /// into the detached session; [`transport_active`](Self::transport_active)
    /// reports it and a new `start` is refused until it has exited.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(session) = self.session.take() {
            info!("Stopping encoder manager...");
            self.runtime.block_on(session.detach(&mut self.host));
        }

        self.reap_transport();
        if self.transport_active() {
            debug!("Transport thread still blocked on read, it exits on the next byte or EOF");
        }
    }

    /// True while the reader thread has not exited
    pub fn transport_active(&self) -> bool {
        self.transport.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn reap_transport(&mut self) {
        if self.transport.as_ref().is_some_and(JoinHandle::is_finished) {
            if let Some(handle) = self.transport.take() {
                if handle.join().is_err() {
                    warn!("Transport thread panicked");
                }
            }
        }
    }

    /// Check if the transport is still being read
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the event receiver (for external event processing)
    pub fn get_event_receiver(&self) -> &Receiver<ControllerEvent> {
        &self.event_receiver
    }

    /// Active session, if started
    pub fn session(&self) -> Option<&Session<ChannelSink>> {
        self.session.as_deref()
    }

    /// Start the thread delivering transport bytes one at a time
    fn start_transport_thread<R>(
        &self,
        reader: R,
        session: Arc<Session<ChannelSink>>,
    ) -> Result<JoinHandle<()>, ManagerError>
    where
        R: Read + Send + 'static,
    {
        let running = Arc::clone(&self.running);

        thread::Builder::new()
            .name("transport".to_string())
            .spawn(move || {
                info!("Transport thread started");

                for byte in reader.bytes() {
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    match byte {
                        Ok(byte) => session.receive_byte(byte),
                        Err(e) => {
                            warn!("Transport read error: {}", e);
                            break;
                        }
                    }
                }

                running.store(false, Ordering::SeqCst);
                info!("Transport thread exited");
            })
            .map_err(ManagerError::Thread)
    }
}

/// Implement Drop to detach the session and unregister both controllers
impl Drop for EncoderManager {
    fn drop(&mut self) {
        self.stop();
    }
}
