//! Blocking reader on a dedicated worker thread.
//!
//! The physical read blocks with no timeout.  Running it on its own
//! thread lets the gate loop wait on *either* the next identifier or the
//! shutdown token, so a termination signal is honoured even while no card
//! is presented.
//!
//! ```text
//!   worker: inner.read_identifier() ──▶ bounded(1) ──┐
//!                                                    ├─▶ select! ─▶ GateLoop
//!   ShutdownTrigger::fire() ──────────▶ Shutdown ────┘
//! ```
//!
//! The channel holds one result, so the worker never reads ahead by more
//! than one card.  The worker exits after the inner reader reports
//! [`GateError::Cancelled`] or once the adapter is dropped.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, select};
use log::{debug, warn};

use crate::app::ports::CardReader;
use crate::card::Identifier;
use crate::error::{GateError, ReaderFault};
use crate::shutdown::Shutdown;

pub struct ThreadedReader {
    results: Receiver<Result<Identifier, GateError>>,
    shutdown: Shutdown,
    worker: Option<JoinHandle<()>>,
}

impl ThreadedReader {
    /// Move `inner` onto a worker thread named `card-reader`.
    pub fn spawn<R>(mut inner: R, shutdown: Shutdown) -> std::io::Result<Self>
    where
        R: CardReader + Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);
        let worker = thread::Builder::new()
            .name("card-reader".into())
            .spawn(move || {
                loop {
                    let result = inner.read_identifier();
                    let done = matches!(result, Err(GateError::Cancelled));
                    if tx.send(result).is_err() || done {
                        break;
                    }
                }
                debug!("card-reader worker exiting");
            })?;

        Ok(Self {
            results: rx,
            shutdown,
            worker: Some(worker),
        })
    }
}

impl CardReader for ThreadedReader {
    fn read_identifier(&mut self) -> Result<Identifier, GateError> {
        if self.shutdown.is_triggered() {
            return Err(GateError::Cancelled);
        }
        select! {
            recv(self.results) -> msg => match msg {
                Ok(result) => result,
                // Worker gone without reporting end of input.
                Err(_) => Err(ReaderFault::new("reader worker stopped").into()),
            },
            recv(self.shutdown.receiver()) -> _ => Err(GateError::Cancelled),
        }
    }
}

impl Drop for ThreadedReader {
    fn drop(&mut self) {
        // The worker may be parked in a blocking read that never returns;
        // detach it rather than join.
        if let Some(worker) = self.worker.take() {
            if worker.is_finished() {
                if worker.join().is_err() {
                    warn!("card-reader worker panicked");
                }
            } else {
                debug!("card-reader worker still blocked; detaching");
            }
        }
    }
}
