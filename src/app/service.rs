//! Gate loop — the hexagonal core.
//!
//! [`GateLoop`] owns every collaborator for one run: reader, ledger,
//! output pin, clock, event sink, and shutdown token.  Nothing is global;
//! the resources are handed in at construction and released in
//! [`GateLoop::run`]'s cleanup.
//!
//! ```text
//!  CardReader ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │           GateLoop            │
//!  ScanLedger ◀──▶│ Debounce · Quota · Sequencer  │──▶ OutputPin
//!                 └──────────────────────────────┘
//! ```
//!
//! One iteration ([`GateLoop::step`]):
//!
//! 1. blocking read
//! 2. debounce check (suppressed → done)
//! 3. `ensure_card`
//! 4. `append_scan`
//! 5–6. quota evaluation on the updated ledger
//! 7. pulse or deny
//!
//! [`GateLoop::run`] adds the fixed pauses and the iteration-boundary
//! error handling; only cancellation leaves the loop.

use std::time::Duration;

use embedded_hal::digital::OutputPin;
use log::{error, info};

use crate::card::Identifier;
use crate::config::GateConfig;
use crate::drivers::actuator::{ActuatorSequencer, OutputState, PulseOutcome};
use crate::error::GateError;
use crate::shutdown::Shutdown;

use super::debounce::DebounceFilter;
use super::events::GateEvent;
use super::ports::{CardReader, Clock, EventSink, ScanLedger};
use super::quota::{Decision, QuotaPolicy};

/// Result of one completed iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Repeat read inside the anti-spam window; nothing recorded.
    Suppressed(Identifier),
    /// Scan recorded and the output pulsed.
    Allowed {
        identifier: Identifier,
        decision: Decision,
        pulse: PulseOutcome,
    },
    /// Scan recorded, quota exhausted, no actuation.
    Denied {
        identifier: Identifier,
        decision: Decision,
    },
}

/// Fixed delays between iterations.
#[derive(Debug, Clone, Copy)]
struct LoopTiming {
    pulse: Duration,
    after_scan: Duration,
    after_suppressed: Duration,
    after_error: Duration,
}

pub struct GateLoop<R, L, P, C, E>
where
    R: CardReader,
    L: ScanLedger,
    P: OutputPin,
    C: Clock,
    E: EventSink,
{
    reader: R,
    ledger: L,
    actuator: ActuatorSequencer<P>,
    clock: C,
    sink: E,
    shutdown: Shutdown,
    debounce: DebounceFilter,
    policy: QuotaPolicy,
    timing: LoopTiming,
    iterations: u64,
}

impl<R, L, P, C, E> GateLoop<R, L, P, C, E>
where
    R: CardReader,
    L: ScanLedger,
    P: OutputPin,
    C: Clock,
    E: EventSink,
{
    /// Build the loop.  Drives the output low before returning.
    pub fn new(
        config: &GateConfig,
        reader: R,
        ledger: L,
        pin: P,
        clock: C,
        sink: E,
        shutdown: Shutdown,
    ) -> Result<Self, GateError> {
        Ok(Self {
            reader,
            ledger,
            actuator: ActuatorSequencer::new(pin)?,
            clock,
            sink,
            shutdown,
            debounce: DebounceFilter::new(config.antispam_window()),
            policy: QuotaPolicy::new(config.max_daily_scans),
            timing: LoopTiming {
                pulse: config.pulse_duration(),
                after_scan: config.loop_pause(),
                after_suppressed: config.suppressed_pause(),
                after_error: config.read_error_pause(),
            },
            iterations: 0,
        })
    }

    // ── Per-iteration orchestration ───────────────────────────

    /// Run one iteration without pauses or error isolation.
    pub fn step(&mut self) -> Result<StepOutcome, GateError> {
        self.iterations += 1;

        // 1. Blocking read
        let identifier = self.reader.read_identifier()?;

        // 2. Anti-spam
        if self.debounce.should_suppress(&identifier, self.clock.now()) {
            self.sink.emit(&GateEvent::Suppressed(identifier.clone()));
            return Ok(StepOutcome::Suppressed(identifier));
        }

        // 3. Registration
        if self.ledger.ensure_card(&identifier, &self.clock)? {
            self.sink.emit(&GateEvent::CardRegistered(identifier.clone()));
        }

        // 4. Record the scan
        let scan = self.ledger.append_scan(&identifier, &self.clock)?;

        // 5–6. Quota on the updated ledger, for the day the scan was written under
        let decision = self
            .policy
            .evaluate(&self.ledger, &self.clock, &identifier, scan.timestamp)?;
        self.sink.emit(&GateEvent::ScanRecorded {
            identifier: identifier.clone(),
            sequence_id: scan.sequence_id,
            count: decision.count,
        });

        // 7. Actuate or deny
        let max_daily_scans = self.policy.max_daily_scans();
        if decision.allowed {
            self.sink.emit(&GateEvent::AccessAllowed {
                identifier: identifier.clone(),
                count: decision.count,
                max_daily_scans,
            });
            let pulse = self.actuator.pulse(self.timing.pulse, &self.shutdown)?;
            Ok(StepOutcome::Allowed {
                identifier,
                decision,
                pulse,
            })
        } else {
            self.sink.emit(&GateEvent::AccessDenied {
                identifier: identifier.clone(),
                count: decision.count,
                max_daily_scans,
            });
            Ok(StepOutcome::Denied {
                identifier,
                decision,
            })
        }
    }

    /// Loop until the shutdown token fires, then clean up.
    ///
    /// Returns the first cleanup failure, if any; iteration errors are
    /// reported through the sink and never end the loop.
    pub fn run(mut self) -> Result<(), GateError> {
        self.sink.emit(&GateEvent::Ready {
            max_daily_scans: self.policy.max_daily_scans(),
        });

        while !self.shutdown.is_triggered() {
            let pause = match self.step() {
                Ok(StepOutcome::Suppressed(_)) => self.timing.after_suppressed,
                Ok(_) => self.timing.after_scan,
                Err(GateError::Cancelled) => break,
                Err(GateError::Reader(fault)) => {
                    self.sink.emit(&GateEvent::ReadError(fault.detail));
                    self.timing.after_error
                }
                Err(e @ GateError::UnknownIdentifier(_)) => {
                    error!("Ledger contract violated: {}", e);
                    self.sink.emit(&GateEvent::Fault(e));
                    self.timing.after_error
                }
                Err(e) => {
                    self.sink.emit(&GateEvent::Fault(e));
                    self.timing.after_error
                }
            };
            if !self.shutdown.sleep(pause) {
                break;
            }
        }

        self.cleanup()
    }

    /// Force the output low, release the ledger, report completion.
    fn cleanup(self) -> Result<(), GateError> {
        let Self {
            ledger,
            mut actuator,
            mut sink,
            iterations,
            ..
        } = self;

        let output = actuator.force_inactive();
        if let Err(e) = &output {
            error!("Shutdown: could not force output low: {}", e);
        }
        let store = ledger.close();
        if let Err(e) = &store {
            error!("Shutdown: ledger close failed: {}", e);
        }

        info!("Gate loop stopped after {} iterations", iterations);
        sink.emit(&GateEvent::ShutdownComplete);
        output.and(store)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    pub fn output_state(&self) -> OutputState {
        self.actuator.state()
    }

    /// Iterations started since construction (including failed ones).
    pub fn iterations(&self) -> u64 {
        self.iterations
    }
}
