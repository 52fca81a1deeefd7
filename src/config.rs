//! Node configuration parameters
//!
//! All tunable parameters for the node. Values can be overridden through
//! the persistent settings store ([`ConfigPort`](crate::app::ports::ConfigPort))
//! or the command console.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Firmware version reported at start-up (major, minor, patch).
pub const FIRMWARE_VERSION: (u8, u8, u8) = (1, 0, 0);

/// Longest advertised BLE name the radio accepts.
pub const BLE_NAME_MAX: usize = 10;

/// What an acknowledged confirmed uplink does to the failure counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckPolicy {
    /// An ack clears the counter; only consecutive failures count.
    ResetOnAck,
    /// Acks are ignored; every failure since boot counts.
    Accumulate,
}

/// What a failed join does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejoinPolicy {
    /// Log only; a re-join must be requested from outside.
    Manual,
    /// Re-issue the join up to `max_attempts` consecutive failures.
    Bounded { max_attempts: u8 },
}

/// Core node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Uplink ---
    /// Use the LoRaWAN network; `false` sends over LoRa P2P instead
    pub lorawan_enabled: bool,
    /// Request network acknowledgement for every uplink
    pub confirmed: bool,
    /// LoRaWAN application port for sensor uplinks
    pub fport: u8,
    /// Wake-up / send interval (seconds)
    pub send_interval_secs: u32,

    // --- BLE ---
    /// Forward BLE UART input to the command console
    pub ble_enabled: bool,
    /// Advertised device name
    pub ble_name: heapless::String<BLE_NAME_MAX>,
    /// Advertising window after start-up (seconds)
    pub ble_advertise_secs: u16,

    // --- Battery ---
    /// Raw ADC samples averaged per reading
    pub battery_samples: u8,

    // --- Recovery ---
    /// Consecutive unacknowledged uplinks before restarting
    pub max_send_failures: u8,
    /// Settle time before the restart (milliseconds)
    pub restart_delay_ms: u32,
    pub ack_policy: AckPolicy,
    pub rejoin_policy: RejoinPolicy,

    // --- Timing ---
    /// Gap between bytes forwarded to the console (milliseconds)
    pub link_byte_gap_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let mut ble_name = heapless::String::new();
        let _ = ble_name.push_str("RAK-LP");
        Self {
            // Uplink
            lorawan_enabled: true,
            confirmed: false,
            fport: 2,
            send_interval_secs: 60,

            // BLE
            ble_enabled: true,
            ble_name,
            ble_advertise_secs: 30,

            // Battery
            battery_samples: 10,

            // Recovery
            max_send_failures: 10,
            restart_delay_ms: 100,
            ack_policy: AckPolicy::ResetOnAck,
            rejoin_policy: RejoinPolicy::Manual,

            // Timing
            link_byte_gap_ms: 5,
        }
    }
}

impl NodeConfig {
    /// Range-check every field. Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Port 0 is MAC-only, 224 and above are reserved.
        if self.fport == 0 || self.fport >= 224 {
            return Err(ConfigError::ValidationFailed("fport must be 1..=223"));
        }
        if self.send_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("send interval must be non-zero"));
        }
        if self.battery_samples == 0 {
            return Err(ConfigError::ValidationFailed("battery samples must be non-zero"));
        }
        if self.max_send_failures == 0 {
            return Err(ConfigError::ValidationFailed("failure threshold must be non-zero"));
        }
        if self.ble_name.is_empty() {
            return Err(ConfigError::ValidationFailed("BLE name must not be empty"));
        }
        if let RejoinPolicy::Bounded { max_attempts: 0 } = self.rejoin_policy {
            return Err(ConfigError::ValidationFailed("rejoin attempts must be non-zero"));
        }
        Ok(())
    }

    /// Same settings with the BLE link switched off, for when the BLE
    /// stack failed to come up.
    pub fn without_ble(self) -> Self {
        Self {
            ble_enabled: false,
            ..self
        }
    }
}
