//! Sensor subsystem.
//!
//! The node only measures itself: its battery voltage, sampled once per
//! wake cycle by the status handler.

pub mod battery;

pub use battery::{AdcBatterySampler, BatteryReading, read_average};
