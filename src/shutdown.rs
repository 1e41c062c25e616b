//! Cancellation token for the gate loop.
//!
//! Firing the [`ShutdownTrigger`] drops the only sender of a zero-capacity
//! channel.  Every [`Shutdown`] clone then observes a disconnected receiver,
//! immediately and forever, which makes it usable both as a flag and as a
//! `select!` arm next to the reader worker's channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

/// Create a connected trigger/token pair.
pub fn shutdown_pair() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = channel::bounded(0);
    (
        ShutdownTrigger {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        Shutdown { rx },
    )
}

/// Fires the shutdown.  Cloneable so a signal handler can own one.
#[derive(Clone)]
pub struct ShutdownTrigger {
    tx: Arc<Mutex<Option<Sender<()>>>>,
}

impl ShutdownTrigger {
    /// Idempotent.
    pub fn fire(&self) {
        let mut guard = match self.tx.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.take().is_some() {
            log::info!("Shutdown requested");
        }
    }
}

/// Observer side of the shutdown signal.
#[derive(Clone)]
pub struct Shutdown {
    rx: Receiver<()>,
}

impl Shutdown {
    /// A token that never fires (tests, one-shot CLI commands).
    pub fn never() -> Self {
        let (trigger, shutdown) = shutdown_pair();
        // Keep the sender alive for the life of the process.
        std::mem::forget(trigger);
        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleep for `duration` unless shutdown fires first.
    ///
    /// Returns `true` if the full duration elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        match self.rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => true,
            Err(RecvTimeoutError::Disconnected) | Ok(()) => false,
        }
    }

    /// Receiver for use in `select!`; becomes ready once shutdown fires.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }
}
