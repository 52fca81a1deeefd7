//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules of the node: event dispatch, uplink
//! routing, join bookkeeping, failure accounting and the BLE command relay.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod bridge;
pub mod events;
pub mod hex;
pub mod ports;
pub mod recovery;
pub mod service;
pub mod session;
pub mod transmit;
