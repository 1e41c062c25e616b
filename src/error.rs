//! Unified error types for the gate controller.
//!
//! Every fallible step of the gate loop funnels into [`GateError`], which
//! keeps the iteration-boundary handler a single `match`.  Each variant maps
//! to one fault class of the controller:
//!
//! | Variant              | Raised by            | Loop reaction              |
//! |----------------------|----------------------|----------------------------|
//! | `Reader`             | card reader          | report, pause, continue    |
//! | `UnknownIdentifier`  | ledger `append_scan` | report, continue           |
//! | `Storage`            | ledger               | report, continue           |
//! | `Actuation`          | actuator sequencer   | report, continue           |
//! | `Cancelled`          | shutdown token       | leave loop, run cleanup    |

use core::fmt;

use embedded_hal::digital::ErrorKind;

use crate::card::Identifier;

// ---------------------------------------------------------------------------
// Top-level gate error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The reader failed to deliver an identifier (transient).
    Reader(ReaderFault),
    /// `append_scan` was called for an identifier with no card record.
    UnknownIdentifier(Identifier),
    /// The durable store failed a read or write.
    Storage(StorageFault),
    /// The physical output could not be driven.
    Actuation(ActuationFault),
    /// The external termination signal fired.
    Cancelled,
}

impl GateError {
    /// True if the loop must stop rather than isolate this error.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Short tag used in log lines and events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reader(_) => "reader",
            Self::UnknownIdentifier(_) => "unknown-identifier",
            Self::Storage(_) => "storage",
            Self::Actuation(_) => "actuation",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for GateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader(e) => write!(f, "reader: {e}"),
            Self::UnknownIdentifier(id) => write!(f, "unknown identifier: {id}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Actuation(e) => write!(f, "actuation: {e}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::error::Error for GateError {}

// ---------------------------------------------------------------------------
// Reader faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderFault {
    pub detail: String,
}

impl ReaderFault {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ReaderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.detail)
    }
}

impl std::error::Error for ReaderFault {}

impl From<ReaderFault> for GateError {
    fn from(e: ReaderFault) -> Self {
        Self::Reader(e)
    }
}

// ---------------------------------------------------------------------------
// Storage faults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageFault {
    /// Ledger operation that failed (`open`, `append_scan`, ...).
    pub op: &'static str,
    pub detail: String,
}

impl StorageFault {
    pub fn new(op: &'static str, detail: impl fmt::Display) -> Self {
        Self {
            op,
            detail: detail.to_string(),
        }
    }
}

impl fmt::Display for StorageFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.op, self.detail)
    }
}

impl std::error::Error for StorageFault {}

impl From<StorageFault> for GateError {
    fn from(e: StorageFault) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Actuation faults
// ---------------------------------------------------------------------------

/// Which edge of the pulse failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseEdge {
    Activate,
    Deactivate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuationFault {
    pub edge: PulseEdge,
    pub kind: ErrorKind,
}

impl fmt::Display for ActuationFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let edge = match self.edge {
            PulseEdge::Activate => "activate",
            PulseEdge::Deactivate => "deactivate",
        };
        write!(f, "GPIO {edge} failed ({:?})", self.kind)
    }
}

impl From<ActuationFault> for GateError {
    fn from(e: ActuationFault) -> Self {
        Self::Actuation(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, GateError>;
