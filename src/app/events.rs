//! Outbound gate events.
//!
//! The [`GateLoop`](super::service::GateLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to the console, append to a
//! monitoring file, etc.

use crate::card::Identifier;
use crate::error::GateError;

/// Structured events emitted by the gate core.
#[derive(Debug, Clone, PartialEq)]
pub enum GateEvent {
    /// The loop is ready for the first card.
    Ready { max_daily_scans: u32 },

    /// A never-seen identifier was registered.
    CardRegistered(Identifier),

    /// A scan was appended to the ledger.
    ScanRecorded {
        identifier: Identifier,
        sequence_id: u64,
        /// Today's count for this card, including this scan.
        count: u32,
    },

    /// Quota allowed the scan; the output is about to pulse.
    AccessAllowed {
        identifier: Identifier,
        count: u32,
        max_daily_scans: u32,
    },

    /// Quota exhausted; no actuation.
    AccessDenied {
        identifier: Identifier,
        count: u32,
        max_daily_scans: u32,
    },

    /// A repeat read inside the anti-spam window was ignored.
    Suppressed(Identifier),

    /// The reader failed; the iteration was skipped.
    ReadError(String),

    /// Any other per-iteration failure (storage, actuation, contract).
    Fault(GateError),

    /// Output forced inactive and store released.
    ShutdownComplete,
}
