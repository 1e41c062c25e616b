//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured gate events to the
//! `log` facade (console and optional log file in production).
//! A future monitoring adapter would implement the same trait.

use log::{debug, info, warn};

use crate::app::events::GateEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`GateEvent`] as one `TAG | key=value` line.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &GateEvent) {
        match event {
            GateEvent::Ready { max_daily_scans } => {
                info!("READY | present a card | quota={}/day", max_daily_scans);
            }
            GateEvent::CardRegistered(id) => {
                info!("CARD  | new card registered | uid={}", id);
            }
            GateEvent::ScanRecorded {
                identifier,
                sequence_id,
                count,
            } => {
                info!(
                    "SCAN  | uid={} | seq={} | today={}",
                    identifier, sequence_id, count
                );
            }
            GateEvent::AccessAllowed {
                identifier,
                count,
                max_daily_scans,
            } => {
                info!(
                    "ALLOW | uid={} | scan {}/{} | pulsing output",
                    identifier, count, max_daily_scans
                );
            }
            GateEvent::AccessDenied {
                identifier,
                count,
                max_daily_scans,
            } => {
                info!(
                    "DENY  | uid={} | scan {} exceeds {}/day",
                    identifier, count, max_daily_scans
                );
            }
            GateEvent::Suppressed(id) => {
                debug!("SKIP  | uid={} | repeat read inside anti-spam window", id);
            }
            GateEvent::ReadError(detail) => {
                warn!("READ  | error: {}", detail);
            }
            GateEvent::Fault(e) => {
                warn!("FAULT | kind={} | {}", e.kind(), e);
            }
            GateEvent::ShutdownComplete => {
                info!("CLEAN | output low, ledger closed");
            }
        }
    }
}
