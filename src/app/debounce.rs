//! Anti-spam filter for repeat reads.
//!
//! A reader held against the same card reports it many times per second.
//! The filter drops a read when it names the same identifier as the last
//! *accepted* read and arrives within the window.  Suppressed reads do not
//! move the window, so a card left on the reader is accepted again once
//! the window measured from its last acceptance has passed.
//!
//! State is in-memory only; accounting lives in the ledger.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::card::Identifier;

pub struct DebounceFilter {
    window: Duration,
    last: Option<(Identifier, DateTime<Utc>)>,
}

impl DebounceFilter {
    pub fn new(window: Duration) -> Self {
        Self { window, last: None }
    }

    /// Check a read and, if accepted, record it as the new reference.
    pub fn should_suppress(&mut self, identifier: &Identifier, now: DateTime<Utc>) -> bool {
        if let Some((last_id, last_time)) = &self.last {
            // A clock that stepped backwards yields a negative delta, which
            // `to_std` rejects; such reads are accepted.
            if last_id == identifier {
                if let Ok(elapsed) = (now - *last_time).to_std() {
                    if elapsed < self.window {
                        return true;
                    }
                }
            }
        }
        self.last = Some((identifier.clone(), now));
        false
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Identifier of the last accepted read.
    pub fn last_identifier(&self) -> Option<&Identifier> {
        self.last.as_ref().map(|(id, _)| id)
    }
}
