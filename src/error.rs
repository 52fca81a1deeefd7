//! Unified error types for the node firmware.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! start-up path and the controller's handling uniform. All variants are
//! `Copy` so they travel through handlers without allocation.

use core::fmt;

use crate::app::ports::{ConfigError, RadioError};
use crate::drivers::hw_init::HwInitError;
use crate::payload::EncodeError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The payload encoder ran out of capacity.
    Encode(EncodeError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// The radio stack refused a request.
    Radio(RadioError),
    /// Peripheral initialisation failed.
    Init(HwInitError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(e) => write!(f, "encode: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Radio(e) => write!(f, "radio: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Self::Encode(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<RadioError> for Error {
    fn from(e: RadioError) -> Self {
        Self::Radio(e)
    }
}

impl From<HwInitError> for Error {
    fn from(e: HwInitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
