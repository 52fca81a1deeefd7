//! Uplink transmission policy.
//!
//! Decides, once per wake cycle, which radio path carries the payload and
//! classifies what the radio said about it. Every outcome is terminal for
//! the cycle: nothing is queued for retry here, the next timer wake-up is
//! the only retry.
//!
//! | LoRaWAN enabled | Joined | Action                                 |
//! |-----------------|--------|----------------------------------------|
//! | no              | –      | P2P send, outcome `P2pSent`            |
//! | yes             | no     | nothing sent, outcome `NotJoined`      |
//! | yes             | yes    | enqueue; `Enqueued`/`Busy`/`Rejected`  |

use log::{error, info, warn};

use crate::config::NodeConfig;
use crate::payload::{CHANNEL_BATTERY, PayloadEncoder};

use super::events::TxOutcome;
use super::ports::{EnqueueResult, LoRaWanPort, P2pPort};

/// Radio path chosen for a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    P2p,
    LoRaWan,
    Skip,
}

/// Pick the path for this cycle.
pub fn route(config: &NodeConfig, joined: bool) -> Route {
    match (config.lorawan_enabled, joined) {
        (false, _) => Route::P2p,
        (true, false) => Route::Skip,
        (true, true) => Route::LoRaWan,
    }
}

/// Send `payload` along the chosen path and classify the result.
pub fn transmit(
    payload: &[u8],
    config: &NodeConfig,
    radio: &mut (impl LoRaWanPort + P2pPort),
) -> TxOutcome {
    match route(config, radio.join_status()) {
        Route::P2p => {
            radio.send(payload);
            info!("[APP] P2P packet sent ({} bytes)", payload.len());
            TxOutcome::P2pSent
        }
        Route::Skip => {
            info!("[APP] Network not joined, skip sending");
            TxOutcome::NotJoined
        }
        Route::LoRaWan => match radio.enqueue(payload, config.fport, config.confirmed) {
            EnqueueResult::Accepted => {
                info!("[APP] Packet enqueued ({} bytes, fport {})", payload.len(), config.fport);
                TxOutcome::Enqueued
            }
            EnqueueResult::Busy => {
                warn!("[APP] LoRa transceiver is busy");
                TxOutcome::Busy
            }
            EnqueueResult::Rejected => {
                warn!("[APP] Packet error, too big to send with current DR");
                TxOutcome::Rejected
            }
        },
    }
}

/// Append the battery reading to `payload` and send the result.
///
/// A reading that cannot be encoded is logged and nothing is sent.
pub fn send_battery(
    payload: &mut PayloadEncoder,
    volts: f32,
    config: &NodeConfig,
    radio: &mut (impl LoRaWanPort + P2pPort),
) -> TxOutcome {
    match payload.add_voltage(CHANNEL_BATTERY, volts) {
        Ok(()) => transmit(payload.serialize(), config, radio),
        Err(e) => {
            error!("[APP] Payload build failed: {}", e);
            TxOutcome::EncodeFailed
        }
    }
}
