//! Port traits — the hexagonal boundary between gate logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GateLoop (domain)
//! ```
//!
//! Driven adapters (reader, ledger, clock, event sinks, config store)
//! implement these traits.  The [`GateLoop`](super::service::GateLoop)
//! owns them via generics, so the domain core never touches hardware
//! or SQL directly.  The physical output is the `embedded-hal`
//! [`OutputPin`](embedded_hal::digital::OutputPin) trait rather than a
//! port of our own.

use chrono::{DateTime, NaiveDate, Utc};

use crate::card::{Identifier, ScanEvent};
use crate::config::GateConfig;
use crate::error::GateError;

// ───────────────────────────────────────────────────────────────
// Reader port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Source of card identifiers.
pub trait CardReader {
    /// Block until a card is presented.
    ///
    /// Returns [`GateError::Reader`] on a transient fault and
    /// [`GateError::Cancelled`] once no further reads are possible.
    fn read_identifier(&mut self) -> Result<Identifier, GateError>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall clock plus the zone used to partition scans into days.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Local calendar date of `at` in this clock's zone.
    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        (**self).local_date(at)
    }
}

// ───────────────────────────────────────────────────────────────
// Ledger port (driven adapter: domain ↔ durable store)
// ───────────────────────────────────────────────────────────────

/// Append-only durable record of known cards and their scans.
///
/// # Contract
///
/// - Every mutating call is durable before it returns.
/// - Each call is atomic on its own; there is no transaction spanning
///   `ensure_card` + `append_scan`.  A card with zero scans is valid.
/// - Storage failures surface as [`GateError::Storage`]; they are never
///   swallowed here.
pub trait ScanLedger {
    /// Register `identifier` if unknown.  Returns `true` if a record was created.
    fn ensure_card(&mut self, identifier: &Identifier, clock: &impl Clock)
    -> Result<bool, GateError>;

    /// Append one scan for a registered identifier.
    ///
    /// Fails with [`GateError::UnknownIdentifier`] if `ensure_card` was
    /// never called for it.
    fn append_scan(
        &mut self,
        identifier: &Identifier,
        clock: &impl Clock,
    ) -> Result<ScanEvent, GateError>;

    /// Scans for `identifier` counted under local `date`, including any just appended.
    fn count_scans_on_day(&self, identifier: &Identifier, date: NaiveDate)
    -> Result<u32, GateError>;

    /// Release the store handle.
    fn close(self) -> Result<(), GateError>
    where
        Self: Sized;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`GateEvent`](super::events::GateEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::GateEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists gate configuration.
///
/// Implementations MUST validate config values before persisting and
/// after loading.  Invalid ranges are rejected with
/// [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration.  Returns [`ConfigError::NotFound`] if no
    /// stored config exists; callers decide whether defaults apply.
    fn load(&self) -> Result<GateConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &GateConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found at the given location.
    NotFound,
    /// Stored config failed to deserialize.
    Corrupted(String),
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError(String),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted(msg) => write!(f, "config corrupted: {}", msg),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
