//! Clock adapters.
//!
//! - [`SystemClock`] — wall clock with an explicit day-boundary zone:
//!   the host's local zone or a fixed UTC offset from config.
//! - [`ManualClock`] — settable clock for tests and replay.

use std::cell::Cell;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, TimeDelta, Utc};

use crate::app::ports::Clock;

/// Zone used to derive the local calendar date of a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockZone {
    /// Host time zone (honours DST transitions).
    Local,
    Fixed(FixedOffset),
}

impl ClockZone {
    pub fn from_offset(offset: Option<FixedOffset>) -> Self {
        offset.map_or(Self::Local, Self::Fixed)
    }

    fn date_of(self, at: DateTime<Utc>) -> NaiveDate {
        match self {
            Self::Local => at.with_timezone(&Local).date_naive(),
            Self::Fixed(offset) => at.with_timezone(&offset).date_naive(),
        }
    }
}

pub struct SystemClock {
    zone: ClockZone,
}

impl SystemClock {
    pub fn new(zone: ClockZone) -> Self {
        Self { zone }
    }

    pub fn zone(&self) -> ClockZone {
        self.zone
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        self.zone.date_of(at)
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
    offset: FixedOffset,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Cell::new(start),
            offset,
        }
    }

    /// Clock in UTC+0 starting at `start`.
    pub fn utc(start: DateTime<Utc>) -> Self {
        Self::new(start, Utc.fix())
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.now.set(at);
    }

    pub fn advance(&self, by: TimeDelta) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }
}
