//! RFID access gate library.
//!
//! Exposes the gate core, its adapters, and the output drivers for the
//! binary and for integration testing.  Hardware-specific GPIO access is
//! behind the `rpi` feature; everything else builds on any host.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod card;
pub mod config;
pub mod drivers;
pub mod error;
pub mod shutdown;
