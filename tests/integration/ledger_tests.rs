//! Ledger durability across process restarts.
//!
//! Each test writes through one [`SqliteLedger`] handle, closes it, and
//! reopens the same file the way a restarted gate would.

use chrono::{FixedOffset, NaiveDate, TimeDelta};

use rfidgate::adapters::sqlite_ledger::SqliteLedger;
use rfidgate::adapters::time::ManualClock;
use rfidgate::app::ports::ScanLedger;
use rfidgate::app::quota::QuotaPolicy;

use crate::mock_hw::{at, id, utc_clock};

#[test]
fn counts_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gate.sqlite3");
    let clock = utc_clock(at(2025, 3, 10, 10, 0, 0));
    let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let mut ledger = SqliteLedger::open(&path).unwrap();
    assert!(ledger.ensure_card(&id("A1B2"), &clock).unwrap());
    for _ in 0..3 {
        ledger.append_scan(&id("A1B2"), &clock).unwrap();
        clock.advance(TimeDelta::minutes(5));
    }
    ledger.close().unwrap();

    // Restart: the fourth scan of the day must still be denied.
    let mut ledger = SqliteLedger::open(&path).unwrap();
    assert!(!ledger.ensure_card(&id("A1B2"), &clock).unwrap());
    let scan = ledger.append_scan(&id("A1B2"), &clock).unwrap();
    let decision = QuotaPolicy::default()
        .evaluate(&ledger, &clock, &id("A1B2"), scan.timestamp)
        .unwrap();
    assert_eq!(decision.count, 4);
    assert!(!decision.allowed);
    assert_eq!(ledger.count_scans_on_day(&id("A1B2"), today).unwrap(), 4);
}

#[test]
fn sequence_ids_keep_increasing_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gate.sqlite3");
    let clock = utc_clock(at(2025, 3, 10, 10, 0, 0));

    let mut ledger = SqliteLedger::open(&path).unwrap();
    ledger.ensure_card(&id("A1B2"), &clock).unwrap();
    let first = ledger.append_scan(&id("A1B2"), &clock).unwrap();
    ledger.close().unwrap();

    let mut ledger = SqliteLedger::open(&path).unwrap();
    let second = ledger.append_scan(&id("A1B2"), &clock).unwrap();
    assert!(second.sequence_id > first.sequence_id);
}

#[test]
fn scan_day_is_fixed_when_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gate.sqlite3");
    // 23:30 UTC is already the next day at UTC+2.
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let clock = ManualClock::new(at(2025, 3, 10, 23, 30, 0), plus_two);

    let mut ledger = SqliteLedger::open(&path).unwrap();
    ledger.ensure_card(&id("C3D4"), &clock).unwrap();
    let scan = ledger.append_scan(&id("C3D4"), &clock).unwrap();
    assert_eq!(scan.local_date, NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
    ledger.close().unwrap();

    let ledger = SqliteLedger::open(&path).unwrap();
    let next_day = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
    let utc_day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    assert_eq!(ledger.count_scans_on_day(&id("C3D4"), next_day).unwrap(), 1);
    assert_eq!(ledger.count_scans_on_day(&id("C3D4"), utc_day).unwrap(), 0);
}

#[test]
fn audit_queries_read_back_what_was_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("gate.sqlite3");
    let clock = utc_clock(at(2025, 3, 10, 8, 0, 0));

    let mut ledger = SqliteLedger::open(&path).unwrap();
    ledger.ensure_card(&id("AAAA"), &clock).unwrap();
    clock.advance(TimeDelta::minutes(1));
    ledger.ensure_card(&id("BBBB"), &clock).unwrap();
    for _ in 0..2 {
        clock.advance(TimeDelta::minutes(1));
        ledger.append_scan(&id("AAAA"), &clock).unwrap();
    }
    ledger.close().unwrap();

    let ledger = SqliteLedger::open(&path).unwrap();
    let cards: Vec<String> = ledger
        .list_cards()
        .unwrap()
        .into_iter()
        .map(|c| c.identifier.to_string())
        .collect();
    assert_eq!(cards, vec!["BBBB", "AAAA"]);

    let record = ledger.card(&id("AAAA")).unwrap().unwrap();
    assert_eq!(record.first_seen, at(2025, 3, 10, 8, 0, 0));
    assert!(ledger.card(&id("ZZZZ")).unwrap().is_none());

    let scans = ledger
        .scans_on_day(&id("AAAA"), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap())
        .unwrap();
    assert_eq!(scans.len(), 2);
    assert!(scans[0].sequence_id < scans[1].sequence_id);
    assert_eq!(scans[1].timestamp, at(2025, 3, 10, 8, 3, 0));
}
