#![no_std]

//! Driver for an SPI-attached high-side "extreme" switch.
//!
//! The host work queue calls [`Switch::run`] at a fixed period; each
//! tick advances the pulse sequence by at most one step, so the worker
//! context is never parked inside the driver.

#[cfg(test)]
extern crate std;

pub mod bus;
mod chip_select;
pub mod cli;
pub mod delay;
pub mod perf;
pub mod protocol;
pub mod pulse;
pub mod schedule;
pub mod signal;
pub mod switch;

#[cfg(test)]
pub(crate) mod testing;

pub use bus::BusError;
pub use protocol::{Opcode, StatusByte};
pub use pulse::{Cadence, Step};
pub use schedule::Schedule;
pub use signal::{StopFlag, StopHandle};
pub use switch::{InitError, RunError, Status, Switch, SwitchConfig};
