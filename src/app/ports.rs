//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ NodeController (domain)
//! ```
//!
//! Driven adapters (radio stack, BLE UART, console, ADC, platform) implement
//! these traits. The [`NodeController`](super::service::NodeController)
//! consumes them via generics, so the domain core never touches hardware
//! directly. Producers never call into the controller; they only signal the
//! [`EventBus`](crate::events::EventBus).

use embedded_hal::delay::DelayNs;

use crate::config::NodeConfig;

// ───────────────────────────────────────────────────────────────
// LoRaWAN stack port (domain → radio MAC)
// ───────────────────────────────────────────────────────────────

/// Immediate result of handing an uplink to the MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueResult {
    /// Queued; the outcome arrives later as a tx-finished event.
    Accepted,
    /// The transceiver is occupied.
    Busy,
    /// Payload too large for the current data rate.
    Rejected,
}

/// Session keys handed out by the stack after a successful join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionKeys {
    pub nwk_skey: [u8; 16],
    pub app_skey: [u8; 16],
}

/// Wide-area network MAC.
pub trait LoRaWanPort {
    /// Whether the join procedure has completed.
    fn join_status(&self) -> bool;

    /// Hand an uplink to the MAC.
    fn enqueue(&mut self, payload: &[u8], fport: u8, confirmed: bool) -> EnqueueResult;

    /// Keys of the current session.
    fn session_keys(&self) -> SessionKeys;

    /// Network-assigned device address.
    fn device_address(&self) -> u32;

    /// Start a (re-)join. Completion arrives as a join-finished event.
    fn join(&mut self) -> Result<(), RadioError>;
}

// ───────────────────────────────────────────────────────────────
// LoRa P2P port (domain → radio PHY)
// ───────────────────────────────────────────────────────────────

/// Direct peer-to-peer transmit; fire-and-forget.
pub trait P2pPort {
    fn send(&mut self, payload: &[u8]);
}

// ───────────────────────────────────────────────────────────────
// Short-range link port (BLE UART ↔ domain)
// ───────────────────────────────────────────────────────────────

pub trait LinkPort {
    /// Bytes waiting in the receive buffer.
    fn available(&self) -> usize;

    /// Pop one received byte.
    fn read_byte(&mut self) -> Option<u8>;

    /// Whether a central is connected.
    fn is_connected(&self) -> bool;

    /// Send bytes to the connected central. Dropped if not connected.
    fn write(&mut self, data: &[u8]);

    /// Advertise `name` for `timeout_secs` (0 = until connected).
    fn start_advertising(&mut self, name: &str, timeout_secs: u16);
}

/// Input side of the external command interpreter.
pub trait CommandSink {
    fn submit(&mut self, byte: u8);
}

// ───────────────────────────────────────────────────────────────
// Platform ports
// ───────────────────────────────────────────────────────────────

/// Raw battery sampling.
pub trait BatteryPort {
    /// One raw battery sample in millivolts.
    fn sample_millivolts(&mut self) -> f32;
}

/// Device-level services.
pub trait PlatformPort {
    /// Reboot the device. Does not return on hardware.
    fn restart(&mut self);

    /// Monotonic milliseconds since boot.
    fn uptime_ms(&self) -> u64;

    /// Drive the sensor power rail.
    fn set_sensor_power(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Combined hardware bound
// ───────────────────────────────────────────────────────────────

/// Everything the dispatcher drives in one cycle.
///
/// Blanket-implemented, so a single adapter (or mock) that implements
/// each port satisfies it. `DelayNs` supplies the short fixed waits
/// (byte pacing, restart settle).
pub trait NodePorts:
    LoRaWanPort + P2pPort + LinkPort + CommandSink + BatteryPort + PlatformPort + DelayNs
{
}

impl<T> NodePorts for T where
    T: LoRaWanPort + P2pPort + LinkPort + CommandSink + BatteryPort + PlatformPort + DelayNs
{
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log,
/// BLE UART echo, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists node configuration.
///
/// Implementations MUST validate before persisting; invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    fn load(&self) -> Result<NodeConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&mut self, config: &NodeConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
pub trait StoragePort {
    /// Read a value. Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    NotFound,
    Full,
    IoError,
}

/// Errors from [`LoRaWanPort`] requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RadioError {
    /// Operation needs an active session.
    NotJoined,
    /// The MAC is mid-procedure.
    Busy,
    /// The stack failed to start the request.
    StackError(i32),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for RadioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotJoined => write!(f, "network not joined"),
            Self::Busy => write!(f, "radio busy"),
            Self::StackError(rc) => write!(f, "stack error (rc={})", rc),
        }
    }
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound => Self::NotFound,
            StorageError::Full => Self::StorageFull,
            StorageError::IoError => Self::IoError,
        }
    }
}
