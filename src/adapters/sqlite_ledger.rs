//! SQLite scan ledger.
//!
//! Implements [`ScanLedger`] on a single `rusqlite` connection.
//!
//! # Durability
//!
//! - `synchronous = FULL` in WAL mode: a committed statement survives power
//!   loss, so every `ensure_card` / `append_scan` is durable on return.
//! - Each mutating call is one autocommit statement; there is no partial
//!   write to roll back.
//! - `foreign_keys = ON`: the store itself refuses a scan for an unknown
//!   card, which surfaces as [`GateError::UnknownIdentifier`].
//!
//! # Schema
//!
//! `scans.scan_date` holds the clock's local date of `ts_us`, fixed at
//! write time.  Day counts are an indexed equality lookup and do not
//! depend on the zone the process runs in later.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, params};

use crate::app::ports::{Clock, ScanLedger};
use crate::card::{CardRecord, Identifier, ScanEvent};
use crate::error::{GateError, StorageFault};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cards (
    uid           TEXT PRIMARY KEY,
    first_seen_us INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS scans (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    uid       TEXT    NOT NULL REFERENCES cards(uid),
    ts_us     INTEGER NOT NULL,
    scan_date TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS scans_uid_date ON scans(uid, scan_date);
";

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteLedger {
    conn: Connection,
}

impl SqliteLedger {
    /// Open (or create) the ledger file at `path`.
    pub fn open(path: &Path) -> Result<Self, GateError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StorageFault::new("open", e))?;
            }
        }
        let conn = Connection::open(path).map_err(|e| StorageFault::new("open", e))?;
        let ledger = Self::init(conn)?;
        info!("Ledger ready at {}", path.display());
        Ok(ledger)
    }

    /// Private in-memory ledger (tests, dry runs).
    pub fn open_in_memory() -> Result<Self, GateError> {
        let conn = Connection::open_in_memory().map_err(|e| StorageFault::new("open", e))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, GateError> {
        let fault = |e: rusqlite::Error| StorageFault::new("init", e);
        conn.busy_timeout(Duration::from_millis(3_000)).map_err(fault)?;
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(fault)?;
        debug!("Ledger journal_mode={}", mode);
        conn.pragma_update(None, "synchronous", "FULL").map_err(fault)?;
        conn.pragma_update(None, "foreign_keys", "ON").map_err(fault)?;
        conn.execute_batch(SCHEMA).map_err(fault)?;
        Ok(Self { conn })
    }

    // ── Audit queries ─────────────────────────────────────────

    /// Every registered card, most recently registered first.
    pub fn list_cards(&self) -> Result<Vec<CardRecord>, GateError> {
        let fault = |e: rusqlite::Error| StorageFault::new("list_cards", e);
        let mut stmt = self
            .conn
            .prepare("SELECT uid, first_seen_us FROM cards ORDER BY first_seen_us DESC, uid")
            .map_err(fault)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(fault)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(fault)?;

        rows.into_iter()
            .map(|(uid, first_seen_us)| {
                Ok(CardRecord {
                    identifier: stored_identifier(&uid, "list_cards")?,
                    first_seen: from_micros(first_seen_us, "list_cards")?,
                })
            })
            .collect()
    }

    /// Registration record for one card, if known.
    pub fn card(&self, identifier: &Identifier) -> Result<Option<CardRecord>, GateError> {
        let first_seen_us: Option<i64> = self
            .conn
            .query_row(
                "SELECT first_seen_us FROM cards WHERE uid = ?1",
                params![identifier.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageFault::new("card", e))?;

        first_seen_us
            .map(|us| {
                Ok(CardRecord {
                    identifier: identifier.clone(),
                    first_seen: from_micros(us, "card")?,
                })
            })
            .transpose()
    }

    /// A card's scans on one local date, in write order.
    pub fn scans_on_day(
        &self,
        identifier: &Identifier,
        date: NaiveDate,
    ) -> Result<Vec<ScanEvent>, GateError> {
        let fault = |e: rusqlite::Error| StorageFault::new("scans_on_day", e);
        let mut stmt = self
            .conn
            .prepare("SELECT id, ts_us FROM scans WHERE uid = ?1 AND scan_date = ?2 ORDER BY id")
            .map_err(fault)?;
        let rows = stmt
            .query_map(params![identifier.as_str(), date_key(date)], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(fault)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(fault)?;

        rows.into_iter()
            .map(|(id, ts_us)| {
                Ok(ScanEvent {
                    sequence_id: id as u64,
                    identifier: identifier.clone(),
                    timestamp: from_micros(ts_us, "scans_on_day")?,
                    local_date: date,
                })
            })
            .collect()
    }
}

impl ScanLedger for SqliteLedger {
    fn ensure_card(
        &mut self,
        identifier: &Identifier,
        clock: &impl Clock,
    ) -> Result<bool, GateError> {
        let created = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO cards (uid, first_seen_us) VALUES (?1, ?2)",
                params![identifier.as_str(), clock.now().timestamp_micros()],
            )
            .map_err(|e| StorageFault::new("ensure_card", e))?;
        Ok(created == 1)
    }

    fn append_scan(
        &mut self,
        identifier: &Identifier,
        clock: &impl Clock,
    ) -> Result<ScanEvent, GateError> {
        let ts_us = clock.now().timestamp_micros();
        let timestamp = from_micros(ts_us, "append_scan")?;
        let local_date = clock.local_date(timestamp);

        match self.conn.execute(
            "INSERT INTO scans (uid, ts_us, scan_date) VALUES (?1, ?2, ?3)",
            params![identifier.as_str(), ts_us, date_key(local_date)],
        ) {
            Ok(_) => {}
            Err(e) if is_foreign_key_violation(&e) => {
                return Err(GateError::UnknownIdentifier(identifier.clone()));
            }
            Err(e) => return Err(StorageFault::new("append_scan", e).into()),
        }

        Ok(ScanEvent {
            sequence_id: self.conn.last_insert_rowid() as u64,
            identifier: identifier.clone(),
            timestamp,
            local_date,
        })
    }

    fn count_scans_on_day(
        &self,
        identifier: &Identifier,
        date: NaiveDate,
    ) -> Result<u32, GateError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM scans WHERE uid = ?1 AND scan_date = ?2",
                params![identifier.as_str(), date_key(date)],
                |row| row.get(0),
            )
            .map_err(|e| StorageFault::new("count_scans_on_day", e))?;
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn close(self) -> Result<(), GateError> {
        self.conn
            .close()
            .map_err(|(_, e)| StorageFault::new("close", e).into())
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn from_micros(us: i64, op: &'static str) -> Result<DateTime<Utc>, GateError> {
    DateTime::from_timestamp_micros(us)
        .ok_or_else(|| StorageFault::new(op, format!("timestamp {us}us out of range")).into())
}

fn stored_identifier(uid: &str, op: &'static str) -> Result<Identifier, GateError> {
    Identifier::parse(uid).map_err(|e| StorageFault::new(op, format!("stored uid {uid:?}: {e}")).into())
}

fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}
