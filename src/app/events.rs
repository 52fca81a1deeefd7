//! Outbound application events.
//!
//! The [`NodeController`](super::service::NodeController) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on
//! the other side decide what to do with them: log to serial, echo over
//! the BLE UART, etc.

/// How the uplink attempt of one wake cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOutcome {
    /// Queued with the LoRaWAN MAC.
    Enqueued,
    /// Transceiver busy; dropped for this cycle.
    Busy,
    /// Too big for the current data rate; dropped.
    Rejected,
    /// LoRaWAN enabled but not joined; nothing sent.
    NotJoined,
    /// Sent over LoRa P2P.
    P2pSent,
    /// The payload could not be built; nothing sent.
    EncodeFailed,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller has started.
    Started { lorawan: bool, version: (u8, u8, u8) },

    /// Send-interval timer woke the node.
    Wakeup { battery_volts: f32 },

    /// Result of the uplink attempt for this cycle.
    Uplink { outcome: TxOutcome, len: usize },

    /// Joined the network.
    Joined { dev_addr: u32 },

    /// Join failed; `rejoin` is true when another attempt was issued.
    JoinFailed { rejoin: bool },

    /// Downlink received.
    DataReceived { len: usize, rssi: i16, snr: i8 },

    /// LoRaWAN uplink cycle finished.
    TxFinished { confirmed: bool, acked: bool, failures: u8 },

    /// LoRa P2P transmission finished.
    P2pTxFinished,

    /// Failure threshold reached; the node is restarting.
    Restarting { failures: u8 },

    /// A batch of BLE UART bytes went to the command console.
    LinkCommand { bytes: usize },
}
