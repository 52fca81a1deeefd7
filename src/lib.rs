//! LoRa battery-node firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod payload;

pub mod pins;

// The ESP-IDF-only parts of these modules are guarded by cfg attributes
// inside; the host build gets their simulation twins.
pub mod adapters;
pub mod drivers;
pub mod sensors;
