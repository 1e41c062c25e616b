//! Application core — gate rules, no direct I/O.
//!
//! Debounce, quota, and the loop orchestration live here.  All
//! interaction with the reader, the store, and the clock happens through
//! the **port traits** in [`ports`]; the output goes through
//! `embedded-hal`.  This keeps the core testable without a reader, a
//! database file, or a GPIO header.

pub mod debounce;
pub mod events;
pub mod ports;
pub mod quota;
pub mod service;
