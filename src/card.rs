//! Card domain types: identifiers, registrations, and scan events.

use core::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ReaderFault;

/// Longest identifier accepted from a reader, in bytes.
pub const IDENTIFIER_MAX_LEN: usize = 64;

/// Opaque card token.  Equality is exact string match after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier(heapless::String<IDENTIFIER_MAX_LEN>);

impl Identifier {
    /// Trim incidental whitespace and validate a raw reader token.
    pub fn parse(raw: &str) -> Result<Self, ReaderFault> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReaderFault::new("empty identifier"));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ReaderFault::new("identifier contains control characters"));
        }
        let mut s = heapless::String::new();
        s.push_str(trimmed).map_err(|()| {
            ReaderFault::new(format!(
                "identifier longer than {IDENTIFIER_MAX_LEN} bytes"
            ))
        })?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Durable registration of a known identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardRecord {
    pub identifier: Identifier,
    pub first_seen: DateTime<Utc>,
}

/// One recorded presentation of a card.  Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanEvent {
    /// Strictly increasing in write order, never reused.
    pub sequence_id: u64,
    pub identifier: Identifier,
    pub timestamp: DateTime<Utc>,
    /// Local calendar date the event is counted under.
    pub local_date: NaiveDate,
}
