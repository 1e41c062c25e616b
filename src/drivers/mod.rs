//! Output drivers: the unlock pulse sequencer and a host simulation pin.

pub mod actuator;
pub mod sim_pin;
