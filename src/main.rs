//! Arcade encoder bridge - Main Application
//!
//! Reads the encoder's serial stream from the configured device and logs
//! the controller events decoded from it.
//!
//! Usage: arcade-encoder [CONFIG_PATH]   (default: configs/default.toml)

use arcade_encoder::backend::ControllerEvent;
use arcade_encoder::config::Config;
use arcade_encoder::EncoderManager;
use crossbeam_channel::RecvTimeoutError;
use log::{info, warn};
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    info!("✓ Loaded configuration, reading from {}", config.device.path.display());

    let mut manager = EncoderManager::new(config)?;
    manager.start()?;

    let events = manager.get_event_receiver().clone();
    loop {
        match events.recv_timeout(Duration::from_millis(250)) {
            Ok(ControllerEvent::Connected { player, name, phys }) => {
                info!("{} connected: {} ({})", player, name, phys);
            }
            Ok(ControllerEvent::Input { player, event }) => {
                info!("{} {:?}", player, event);
            }
            Ok(ControllerEvent::Sync { .. }) => {}
            Ok(ControllerEvent::Disconnected { player }) => {
                info!("{} disconnected", player);
            }
            Err(RecvTimeoutError::Timeout) => {
                if !manager.is_running() {
                    info!("Transport closed");
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Event channel disconnected");
                break;
            }
        }
    }

    manager.stop();
    Ok(())
}
