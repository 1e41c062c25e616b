//! Daily quota policy.
//!
//! A card opens the gate on its 1st through `max_daily_scans`-th scan of a
//! local calendar day.  The count is read *after* the current scan has been
//! appended, so it already includes the scan being decided.

use chrono::{DateTime, Utc};

use crate::card::Identifier;
use crate::error::GateError;

use super::ports::{Clock, ScanLedger};

/// Outcome of a quota evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Scans today, including the one being decided.
    pub count: u32,
    pub allowed: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct QuotaPolicy {
    max_daily_scans: u32,
}

impl QuotaPolicy {
    pub fn new(max_daily_scans: u32) -> Self {
        Self { max_daily_scans }
    }

    pub fn max_daily_scans(&self) -> u32 {
        self.max_daily_scans
    }

    /// Pure threshold rule.
    pub fn decide(&self, count: u32) -> Decision {
        Decision {
            count,
            allowed: count <= self.max_daily_scans,
        }
    }

    /// Count `identifier`'s scans on the local date of `now` and decide.
    pub fn evaluate(
        &self,
        ledger: &impl ScanLedger,
        clock: &impl Clock,
        identifier: &Identifier,
        now: DateTime<Utc>,
    ) -> Result<Decision, GateError> {
        let count = ledger.count_scans_on_day(identifier, clock.local_date(now))?;
        Ok(self.decide(count))
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}
