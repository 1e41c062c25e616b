//! Unlock output sequencer.
//!
//! Drives an active-high [`OutputPin`] through one `Idle → Active → Idle`
//! pulse.  The active phase is owned by an [`ActiveGuard`]; whatever ends
//! the hold (timeout, shutdown, a failed release, a panic unwinding through
//! the loop) the pin is driven low before control leaves the sequencer.
//!
//! ## Failure contract
//!
//! - Activation fails → best-effort `set_low`, then `ActuationFault(Activate)`.
//! - Release fails → one retry; if that also fails the state stays
//!   `Active` and `ActuationFault(Deactivate)` is returned so shutdown
//!   cleanup can try again via [`ActuatorSequencer::force_inactive`].

use std::time::Duration;

use embedded_hal::digital::{Error as _, OutputPin};
use log::{error, info, warn};

use crate::error::{ActuationFault, GateError, PulseEdge};
use crate::shutdown::Shutdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Idle,
    Active,
}

/// How the hold phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseOutcome {
    /// Held for the full duration.
    Completed,
    /// Shutdown fired during the hold; released early.
    Interrupted,
}

pub struct ActuatorSequencer<P: OutputPin> {
    pin: P,
    state: OutputState,
}

impl<P: OutputPin> ActuatorSequencer<P> {
    /// Take ownership of `pin` and drive it low.
    pub fn new(mut pin: P) -> Result<Self, GateError> {
        pin.set_low().map_err(|e| fault(PulseEdge::Deactivate, &e))?;
        Ok(Self {
            pin,
            state: OutputState::Idle,
        })
    }

    /// Hold the output active for `hold`, or until `shutdown` fires.
    pub fn pulse(&mut self, hold: Duration, shutdown: &Shutdown) -> Result<PulseOutcome, GateError> {
        let guard = ActiveGuard::engage(&mut self.pin)?;
        self.state = OutputState::Active;

        let outcome = if shutdown.sleep(hold) {
            PulseOutcome::Completed
        } else {
            warn!("Pulse interrupted by shutdown after engage; releasing output");
            PulseOutcome::Interrupted
        };

        match guard.release() {
            Ok(()) => {
                self.state = OutputState::Idle;
                Ok(outcome)
            }
            Err(e) => {
                error!("Output release failed: {}", e);
                Err(e.into())
            }
        }
    }

    /// Drive the output low regardless of tracked state.  Used at shutdown.
    pub fn force_inactive(&mut self) -> Result<(), GateError> {
        self.pin
            .set_low()
            .map_err(|e| fault(PulseEdge::Deactivate, &e))?;
        if self.state == OutputState::Active {
            info!("Output forced inactive");
        }
        self.state = OutputState::Idle;
        Ok(())
    }

    pub fn state(&self) -> OutputState {
        self.state
    }
}

impl<P: OutputPin> Drop for ActuatorSequencer<P> {
    fn drop(&mut self) {
        if let Err(e) = self.pin.set_low() {
            error!("Output release on drop failed: {:?}", e.kind());
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Scoped activation
// ───────────────────────────────────────────────────────────────

/// Holds the output high; drives it low on release or drop.
struct ActiveGuard<'a, P: OutputPin> {
    pin: &'a mut P,
    armed: bool,
}

impl<'a, P: OutputPin> ActiveGuard<'a, P> {
    fn engage(pin: &'a mut P) -> Result<Self, ActuationFault> {
        if let Err(e) = pin.set_high() {
            let fault = fault(PulseEdge::Activate, &e);
            // The pin may have latched high before reporting failure.
            if let Err(e2) = pin.set_low() {
                error!("Best-effort release after failed activate also failed: {:?}", e2.kind());
            }
            return Err(fault);
        }
        Ok(Self { pin, armed: true })
    }

    fn release(mut self) -> Result<(), ActuationFault> {
        self.armed = false;
        if self.pin.set_low().is_ok() {
            return Ok(());
        }
        self.pin
            .set_low()
            .map_err(|e| fault(PulseEdge::Deactivate, &e))
    }
}

impl<P: OutputPin> Drop for ActiveGuard<'_, P> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Output guard dropped while active; forcing low");
            let _ = self.pin.set_low();
        }
    }
}

fn fault<E: embedded_hal::digital::Error>(edge: PulseEdge, e: &E) -> ActuationFault {
    ActuationFault {
        edge,
        kind: e.kind(),
    }
}
