//! Integration tests for the reader → debounce → ledger → quota → output
//! pipeline.
//!
//! Every test drives a real in-memory SQLite ledger through the
//! [`GateLoop`] with a scripted reader, a recording pin, and a manual
//! clock.

use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;

use rfidgate::app::events::GateEvent;
use rfidgate::app::service::{GateLoop, StepOutcome};
use rfidgate::config::GateConfig;
use rfidgate::drivers::actuator::{OutputState, PulseOutcome};
use rfidgate::error::{GateError, PulseEdge};
use rfidgate::shutdown::{Shutdown, shutdown_pair};

use crate::mock_hw::{FlakyLedger, Read, RecordingPin, RecordingSink, ScriptedReader, at, id, utc_clock};

fn fast_config() -> GateConfig {
    GateConfig {
        pulse_duration_ms: 10,
        loop_pause_ms: 0,
        suppressed_pause_ms: 0,
        read_error_pause_ms: 0,
        ..Default::default()
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn allowed(outcome: &StepOutcome) -> bool {
    matches!(outcome, StepOutcome::Allowed { .. })
}

// ── Quota ─────────────────────────────────────────────────────

#[test]
fn fourth_scan_of_the_day_is_denied() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(
        &clock,
        vec![
            Read::Card(at(2025, 3, 10, 10, 0, 0), "A1B2"),
            Read::Card(at(2025, 3, 10, 10, 5, 0), "A1B2"),
            Read::Card(at(2025, 3, 10, 10, 10, 0), "A1B2"),
            Read::Card(at(2025, 3, 10, 10, 15, 0), "A1B2"),
        ],
    );
    let pin = RecordingPin::new();
    let sink = RecordingSink::new();
    let mut gate = GateLoop::new(
        &fast_config(),
        reader,
        FlakyLedger::new(),
        pin.clone(),
        &clock,
        sink.clone(),
        Shutdown::never(),
    )
    .unwrap();

    let outcomes: Vec<_> = (0..4).map(|_| gate.step().unwrap()).collect();
    let verdicts: Vec<bool> = outcomes.iter().map(allowed).collect();
    assert_eq!(verdicts, vec![true, true, true, false]);

    match &outcomes[3] {
        StepOutcome::Denied { decision, .. } => assert_eq!(decision.count, 4),
        other => panic!("expected denial, got {:?}", other),
    }

    // Denied scans are still recorded.
    assert_eq!(gate.ledger().scans_on("A1B2", day(2025, 3, 10)), 4);
    assert_eq!(pin.pulses(), 3);
    assert!(!pin.is_high());
    assert_eq!(
        sink.count(|e| matches!(e, GateEvent::CardRegistered(_))),
        1,
        "card registered once"
    );
}

#[test]
fn day_boundary_resets_the_count() {
    let clock = utc_clock(at(2025, 3, 10, 23, 0, 0));
    let reader = ScriptedReader::new(
        &clock,
        vec![
            Read::Card(at(2025, 3, 10, 23, 59, 58), "C3D4"),
            Read::Card(at(2025, 3, 11, 0, 0, 2), "C3D4"),
        ],
    );
    let mut gate = GateLoop::new(
        &fast_config(),
        reader,
        FlakyLedger::new(),
        RecordingPin::new(),
        &clock,
        RecordingSink::new(),
        Shutdown::never(),
    )
    .unwrap();

    for _ in 0..2 {
        match gate.step().unwrap() {
            StepOutcome::Allowed { decision, .. } => assert_eq!(decision.count, 1),
            other => panic!("expected allowed, got {:?}", other),
        }
    }
    assert_eq!(gate.ledger().scans_on("C3D4", day(2025, 3, 10)), 1);
    assert_eq!(gate.ledger().scans_on("C3D4", day(2025, 3, 11)), 1);
}

#[test]
fn cards_have_independent_quotas() {
    let clock = utc_clock(at(2025, 3, 10, 8, 0, 0));
    let mut script = Vec::new();
    for minute in 0..3 {
        script.push(Read::Card(at(2025, 3, 10, 8, minute * 2, 0), "AAAA"));
        script.push(Read::Card(at(2025, 3, 10, 8, minute * 2 + 1, 0), "BBBB"));
    }
    let reader = ScriptedReader::new(&clock, script);
    let mut gate = GateLoop::new(
        &fast_config(),
        reader,
        FlakyLedger::new(),
        RecordingPin::new(),
        &clock,
        RecordingSink::new(),
        Shutdown::never(),
    )
    .unwrap();

    for _ in 0..6 {
        assert!(allowed(&gate.step().unwrap()));
    }
}

// ── Debounce ──────────────────────────────────────────────────

#[test]
fn repeat_read_inside_window_is_not_recorded() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(
        &clock,
        vec![
            Read::Card(at(2025, 3, 10, 10, 0, 0), "A1B2"),
            Read::Card(at(2025, 3, 10, 10, 0, 1), "A1B2"),
        ],
    );
    let pin = RecordingPin::new();
    let sink = RecordingSink::new();
    let mut gate = GateLoop::new(
        &fast_config(),
        reader,
        FlakyLedger::new(),
        pin.clone(),
        &clock,
        sink.clone(),
        Shutdown::never(),
    )
    .unwrap();

    assert!(allowed(&gate.step().unwrap()));
    assert_eq!(gate.step().unwrap(), StepOutcome::Suppressed(id("A1B2")));

    assert_eq!(gate.ledger().scans_on("A1B2", day(2025, 3, 10)), 1);
    assert_eq!(pin.pulses(), 1);
    assert_eq!(sink.count(|e| matches!(e, GateEvent::Suppressed(_))), 1);
    assert_eq!(sink.count(|e| matches!(e, GateEvent::ScanRecorded { .. })), 1);
}

#[test]
fn other_card_inside_window_is_recorded() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(
        &clock,
        vec![
            Read::Card(at(2025, 3, 10, 10, 0, 0), "A1B2"),
            Read::Card(at(2025, 3, 10, 10, 0, 1), "C3D4"),
        ],
    );
    let mut gate = GateLoop::new(
        &fast_config(),
        reader,
        FlakyLedger::new(),
        RecordingPin::new(),
        &clock,
        RecordingSink::new(),
        Shutdown::never(),
    )
    .unwrap();

    assert!(allowed(&gate.step().unwrap()));
    assert!(allowed(&gate.step().unwrap()));
}

// ── Events ────────────────────────────────────────────────────

#[test]
fn first_scan_emits_registration_then_scan_then_allow() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(&clock, vec![Read::Card(at(2025, 3, 10, 9, 30, 0), "E5F6")]);
    let sink = RecordingSink::new();
    let mut gate = GateLoop::new(
        &fast_config(),
        reader,
        FlakyLedger::new(),
        RecordingPin::new(),
        &clock,
        sink.clone(),
        Shutdown::never(),
    )
    .unwrap();

    gate.step().unwrap();
    let events = sink.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0], GateEvent::CardRegistered(id("E5F6")));
    assert!(matches!(
        &events[1],
        GateEvent::ScanRecorded { identifier, count: 1, .. } if identifier.as_str() == "E5F6"
    ));
    assert_eq!(
        events[2],
        GateEvent::AccessAllowed {
            identifier: id("E5F6"),
            count: 1,
            max_daily_scans: 3,
        }
    );
}

// ── Error isolation ───────────────────────────────────────────

#[test]
fn storage_fault_skips_one_iteration_only() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(
        &clock,
        vec![
            Read::Card(at(2025, 3, 10, 10, 0, 0), "A1B2"),
            Read::Card(at(2025, 3, 10, 10, 1, 0), "A1B2"),
        ],
    );
    let mut ledger = FlakyLedger::new();
    ledger.fail_appends = 1;
    let pin = RecordingPin::new();
    let sink = RecordingSink::new();
    let gate = GateLoop::new(
        &fast_config(),
        reader,
        ledger,
        pin.clone(),
        &clock,
        sink.clone(),
        Shutdown::never(),
    )
    .unwrap();

    gate.run().unwrap();

    let events = sink.events();
    assert!(matches!(events.first(), Some(GateEvent::Ready { max_daily_scans: 3 })));
    assert_eq!(events.last(), Some(&GateEvent::ShutdownComplete));
    assert_eq!(
        sink.count(|e| matches!(e, GateEvent::Fault(GateError::Storage(_)))),
        1
    );
    // Only the second read reached the output.
    assert_eq!(pin.pulses(), 1);
    assert!(!pin.is_high());
}

#[test]
fn failed_quota_read_does_not_actuate() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(&clock, vec![Read::Card(at(2025, 3, 10, 10, 0, 0), "A1B2")]);
    let ledger = FlakyLedger::new();
    ledger.fail_counts.set(1);
    let pin = RecordingPin::new();
    let mut gate = GateLoop::new(
        &fast_config(),
        reader,
        ledger,
        pin.clone(),
        &clock,
        RecordingSink::new(),
        Shutdown::never(),
    )
    .unwrap();

    assert!(matches!(gate.step(), Err(GateError::Storage(_))));
    assert_eq!(pin.pulses(), 0);
    // The append itself landed.
    assert_eq!(gate.ledger().scans_on("A1B2", day(2025, 3, 10)), 1);
}

#[test]
fn reader_fault_is_reported_and_loop_continues() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(
        &clock,
        vec![
            Read::Fault("checksum mismatch"),
            Read::Card(at(2025, 3, 10, 10, 0, 0), "A1B2"),
        ],
    );
    let pin = RecordingPin::new();
    let sink = RecordingSink::new();
    let gate = GateLoop::new(
        &fast_config(),
        reader,
        FlakyLedger::new(),
        pin.clone(),
        &clock,
        sink.clone(),
        Shutdown::never(),
    )
    .unwrap();

    gate.run().unwrap();

    assert!(
        sink.events()
            .contains(&GateEvent::ReadError("checksum mismatch".into()))
    );
    assert_eq!(pin.pulses(), 1);
}

#[test]
fn unregistered_append_is_reported_as_fault() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(&clock, vec![Read::Card(at(2025, 3, 10, 10, 0, 0), "A1B2")]);
    let mut ledger = FlakyLedger::new();
    ledger.skip_registration = true;
    let sink = RecordingSink::new();
    let pin = RecordingPin::new();
    let gate = GateLoop::new(
        &fast_config(),
        reader,
        ledger,
        pin.clone(),
        &clock,
        sink.clone(),
        Shutdown::never(),
    )
    .unwrap();

    gate.run().unwrap();

    assert!(
        sink.events()
            .contains(&GateEvent::Fault(GateError::UnknownIdentifier(id("A1B2"))))
    );
    assert_eq!(pin.pulses(), 0);
}

// ── Output safety ─────────────────────────────────────────────

#[test]
fn failed_activation_leaves_output_low() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(&clock, vec![Read::Card(at(2025, 3, 10, 10, 0, 0), "A1B2")]);
    let pin = RecordingPin::new();
    let mut gate = GateLoop::new(
        &fast_config(),
        reader,
        FlakyLedger::new(),
        pin.clone(),
        &clock,
        RecordingSink::new(),
        Shutdown::never(),
    )
    .unwrap();
    pin.fail_next_high(true);

    match gate.step() {
        Err(GateError::Actuation(fault)) => assert_eq!(fault.edge, PulseEdge::Activate),
        other => panic!("expected activation fault, got {:?}", other),
    }
    assert!(!pin.is_high());
    assert_eq!(gate.output_state(), OutputState::Idle);
    // The scan was recorded before the output was touched.
    assert_eq!(gate.ledger().scans_on("A1B2", day(2025, 3, 10)), 1);
}

#[test]
fn failed_release_is_retried_at_shutdown() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(&clock, vec![Read::Card(at(2025, 3, 10, 10, 0, 0), "A1B2")]);
    let pin = RecordingPin::new();
    let sink = RecordingSink::new();
    let mut gate = GateLoop::new(
        &fast_config(),
        reader,
        FlakyLedger::new(),
        pin.clone(),
        &clock,
        sink.clone(),
        Shutdown::never(),
    )
    .unwrap();
    pin.fail_next_lows(2);

    match gate.step() {
        Err(GateError::Actuation(fault)) => assert_eq!(fault.edge, PulseEdge::Deactivate),
        other => panic!("expected release fault, got {:?}", other),
    }
    assert!(pin.is_high());
    assert_eq!(gate.output_state(), OutputState::Active);

    // Script is exhausted: run() goes straight to cleanup.
    gate.run().unwrap();
    assert!(!pin.is_high());
    assert_eq!(sink.events().last(), Some(&GateEvent::ShutdownComplete));
}

// ── Cancellation ──────────────────────────────────────────────

#[test]
fn shutdown_during_pulse_ends_the_hold_early() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(&clock, vec![Read::Card(at(2025, 3, 10, 10, 0, 0), "A1B2")]);
    let pin = RecordingPin::new();
    let (trigger, shutdown) = shutdown_pair();
    let config = GateConfig {
        pulse_duration_ms: 30_000,
        ..fast_config()
    };
    let mut gate = GateLoop::new(
        &config,
        reader,
        FlakyLedger::new(),
        pin.clone(),
        &clock,
        RecordingSink::new(),
        shutdown,
    )
    .unwrap();

    let fire = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        trigger.fire();
    });
    let start = Instant::now();
    match gate.step().unwrap() {
        StepOutcome::Allowed { pulse, .. } => assert_eq!(pulse, PulseOutcome::Interrupted),
        other => panic!("expected allowed, got {:?}", other),
    }
    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(!pin.is_high());
    fire.join().unwrap();
}

#[test]
fn run_exits_immediately_when_already_cancelled() {
    let clock = utc_clock(at(2025, 3, 10, 9, 0, 0));
    let reader = ScriptedReader::new(&clock, vec![Read::Card(at(2025, 3, 10, 10, 0, 0), "A1B2")]);
    let (trigger, shutdown) = shutdown_pair();
    let sink = RecordingSink::new();
    let gate = GateLoop::new(
        &fast_config(),
        reader,
        FlakyLedger::new(),
        RecordingPin::new(),
        &clock,
        sink.clone(),
        shutdown,
    )
    .unwrap();

    trigger.fire();
    gate.run().unwrap();

    assert_eq!(
        sink.events(),
        vec![
            GateEvent::Ready { max_daily_scans: 3 },
            GateEvent::ShutdownComplete
        ]
    );
}
