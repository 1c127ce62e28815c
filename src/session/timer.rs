//! One-shot, re-armable timer tasks
//!
//! The owner publishes the current deadline through a `watch` channel; each
//! arm replaces the pending deadline instead of stacking a new one. The
//! task calls its expiry callback with the deadline it slept until, so the
//! callback can tell a stale expiry (deadline superseded while it waited for
//! the session guard) from a real one.

use log::trace;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Schedule {
    Disarmed,
    At(Instant),
}

/// Arm/disarm side, kept inside the guarded session state
#[derive(Debug)]
pub(crate) struct TimerHandle {
    name: &'static str,
    schedule: watch::Sender<Schedule>,
}

impl TimerHandle {
    /// Replace any pending deadline. Never blocks.
    pub(crate) fn arm(&self, deadline: Instant) {
        trace!("{} timer armed", self.name);
        self.schedule.send_replace(Schedule::At(deadline));
    }

    pub(crate) fn disarm(&self) {
        trace!("{} timer disarmed", self.name);
        self.schedule.send_replace(Schedule::Disarmed);
    }
}

/// Task side, consumed when the timer is spawned
pub(crate) struct TimerTask {
    name: &'static str,
    schedule: watch::Receiver<Schedule>,
}

pub(crate) fn channel(name: &'static str) -> (TimerHandle, TimerTask) {
    let (tx, rx) = watch::channel(Schedule::Disarmed);
    (
        TimerHandle { name, schedule: tx },
        TimerTask { name, schedule: rx },
    )
}

impl TimerTask {
    /// Run the timer on `runtime` until `cancel` fires or the handle is dropped
    pub(crate) fn spawn<F>(self, runtime: &Handle, cancel: CancellationToken, on_expiry: F) -> JoinHandle<()>
    where
        F: FnMut(Instant) + Send + 'static,
    {
        runtime.spawn(self.run(cancel, on_expiry))
    }

    async fn run<F>(mut self, cancel: CancellationToken, mut on_expiry: F)
    where
        F: FnMut(Instant) + Send + 'static,
    {
        loop {
            let schedule = *self.schedule.borrow_and_update();

            if let Schedule::At(deadline) = schedule {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    changed = self.schedule.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        // Re-armed or disarmed before the deadline
                        continue;
                    }
                    _ = sleep_until(deadline) => {}
                }

                trace!("{} timer expired", self.name);
                on_expiry(deadline);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                changed = self.schedule.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        trace!("{} timer stopped", self.name);
    }
}
