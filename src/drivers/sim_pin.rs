//! Simulated unlock output.
//!
//! Stands in for the GPIO line on hosts without the `rpi` feature.
//! Transitions are logged and the level is tracked in-memory only.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use log::info;

pub struct SimulatedPin {
    gpio: u8,
    high: bool,
}

impl SimulatedPin {
    pub fn new(gpio: u8) -> Self {
        Self { gpio, high: false }
    }

    pub fn is_high(&self) -> bool {
        self.high
    }
}

impl ErrorType for SimulatedPin {
    type Error = Infallible;
}

impl OutputPin for SimulatedPin {
    fn set_high(&mut self) -> Result<(), Infallible> {
        if !self.high {
            info!("GPIO(sim) {} -> HIGH", self.gpio);
        }
        self.high = true;
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Infallible> {
        if self.high {
            info!("GPIO(sim) {} -> LOW", self.gpio);
        }
        self.high = false;
        Ok(())
    }
}
