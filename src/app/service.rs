//! Node controller: the hexagonal core.
//!
//! [`NodeController`] owns every piece of mutable controller state (payload
//! buffer, session record, failure counter, statistics) and turns pending
//! events into handler calls. All I/O flows through port traits injected
//! at call sites, making the whole controller testable with mock adapters.
//!
//! ```text
//!  EventBus ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!               │        NodeController        │
//!  NodePorts ◀──│ payload · policy · recovery  │
//!               └─────────────────────────────┘
//! ```
//!
//! Handlers run to completion one after another; the only waits are the
//! short fixed delays of byte pacing and the restart settle.

use log::{debug, error, info, warn};

use crate::config::{FIRMWARE_VERSION, NodeConfig};
use crate::events::{EventBus, EventKind, RxFrame};
use crate::payload::PayloadEncoder;
use crate::sensors::battery;

use super::bridge::{LinkHandler, NoLinkHandler};
use super::events::{AppEvent, TxOutcome};
use super::hex::HexDump;
use super::ports::{
    BatteryPort, ConfigError, EventSink, LinkPort, LoRaWanPort, NodePorts, P2pPort, PlatformPort,
};
use super::recovery::{FailureCounter, TxVerdict};
use super::session::{JoinVerdict, SessionInfo, SessionState};
use super::transmit;

// ───────────────────────────────────────────────────────────────
// Statistics
// ───────────────────────────────────────────────────────────────

/// Running counters since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub wakeups: u32,
    pub enqueued: u32,
    pub busy: u32,
    pub rejected: u32,
    pub not_joined: u32,
    pub p2p_sent: u32,
    pub encode_failed: u32,
    pub acks: u32,
    pub naks: u32,
    pub joins: u32,
    pub join_failures: u32,
    pub downlinks: u32,
    pub restarts: u32,
    pub link_batches: u32,
}

impl NodeStats {
    fn count_uplink(&mut self, outcome: TxOutcome) {
        let slot = match outcome {
            TxOutcome::Enqueued => &mut self.enqueued,
            TxOutcome::Busy => &mut self.busy,
            TxOutcome::Rejected => &mut self.rejected,
            TxOutcome::NotJoined => &mut self.not_joined,
            TxOutcome::P2pSent => &mut self.p2p_sent,
            TxOutcome::EncodeFailed => &mut self.encode_failed,
        };
        *slot = slot.saturating_add(1);
    }
}

// ───────────────────────────────────────────────────────────────
// NodeController
// ───────────────────────────────────────────────────────────────

/// The controller orchestrates all domain logic.
pub struct NodeController<L: LinkHandler = NoLinkHandler> {
    config: NodeConfig,
    payload: PayloadEncoder,
    session: SessionState,
    failures: FailureCounter,
    link: L,
    last_rx: Option<RxFrame>,
    stats: NodeStats,
}

impl NodeController<NoLinkHandler> {
    /// Controller that ignores link data.
    pub fn new(config: NodeConfig) -> Self {
        Self::with_link_handler(config, NoLinkHandler)
    }
}

impl<L: LinkHandler> NodeController<L> {
    /// Controller with an injected link-data handler.
    pub fn with_link_handler(config: NodeConfig, mut link: L) -> Self {
        link.configure(&config);
        let failures = FailureCounter::new(config.max_send_failures, config.ack_policy);
        Self {
            config,
            payload: PayloadEncoder::new(),
            session: SessionState::new(),
            failures,
            link,
            last_rx: None,
            stats: NodeStats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// One-time start-up after the radio and BLE stacks are up.
    pub fn start(&mut self, hw: &mut (impl LinkPort + PlatformPort), sink: &mut impl EventSink) {
        let (major, minor, patch) = FIRMWARE_VERSION;
        info!(
            "[APP] init_app v{}.{}.{} ({})",
            major,
            minor,
            patch,
            if self.config.lorawan_enabled { "LoRaWAN" } else { "LoRa P2P" }
        );

        // Sensor rail stays off; the battery divider is always powered.
        hw.set_sensor_power(false);

        if self.config.ble_enabled {
            hw.start_advertising(&self.config.ble_name, self.config.ble_advertise_secs);
            info!(
                "[APP] BLE advertising as '{}' for {}s",
                self.config.ble_name, self.config.ble_advertise_secs
            );
        }

        sink.emit(&AppEvent::Started {
            lorawan: self.config.lorawan_enabled,
            version: FIRMWARE_VERSION,
        });
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Run the handler of every pending event, in [`EventKind::ALL`] order.
    ///
    /// Each bit is cleared, together with the data it carries, before its
    /// handler runs, so a producer that signals the same kind while the
    /// handler executes is seen on the next call. Returns the number of handlers run.
    pub fn dispatch<H: NodePorts>(
        &mut self,
        bus: &EventBus,
        hw: &mut H,
        sink: &mut impl EventSink,
    ) -> usize {
        let mut handled = 0;
        for kind in EventKind::ALL {
            let ran = match kind {
                EventKind::Status => bus.take(kind).then(|| {
                    self.on_status(hw, sink);
                }),
                EventKind::JoinFinished => bus
                    .take_join_finished()
                    .map(|success| self.on_join_finished(success, hw, sink)),
                EventKind::DataReceived => bus.take_rx().map(|rx| self.on_data_received(rx, sink)),
                EventKind::TxFinished => bus
                    .take_tx_finished()
                    .map(|acked| self.on_tx_finished(acked, hw, sink)),
                EventKind::LinkData => bus.take(kind).then(|| self.on_link_data(hw, sink)),
            };
            if ran.is_some() {
                handled += 1;
            }
        }
        handled
    }

    // ── Handlers ──────────────────────────────────────────────

    /// Timer wake-up: sample the battery, build the payload, send it.
    pub fn on_status(
        &mut self,
        hw: &mut (impl LoRaWanPort + P2pPort + BatteryPort),
        sink: &mut impl EventSink,
    ) -> TxOutcome {
        self.stats.wakeups = self.stats.wakeups.saturating_add(1);
        self.payload.reset();
        info!("[APP] Timer wakeup");

        let reading = battery::read_average(hw, self.config.battery_samples);
        debug!("[APP] Battery {:.3} V", reading.volts);
        sink.emit(&AppEvent::Wakeup {
            battery_volts: reading.volts,
        });

        let outcome = transmit::send_battery(&mut self.payload, reading.volts, &self.config, hw);

        self.stats.count_uplink(outcome);
        sink.emit(&AppEvent::Uplink {
            outcome,
            len: self.payload.len(),
        });
        outcome
    }

    /// Join procedure finished.
    pub fn on_join_finished(
        &mut self,
        success: bool,
        hw: &mut impl LoRaWanPort,
        sink: &mut impl EventSink,
    ) {
        match self
            .session
            .on_join_finished(success, self.config.rejoin_policy, hw)
        {
            JoinVerdict::Joined(info) => {
                self.stats.joins = self.stats.joins.saturating_add(1);
                sink.emit(&AppEvent::Joined {
                    dev_addr: info.dev_addr,
                });
            }
            JoinVerdict::Failed { rejoin } => {
                self.stats.join_failures = self.stats.join_failures.saturating_add(1);
                sink.emit(&AppEvent::JoinFailed { rejoin });
            }
        }
    }

    /// Downlink arrived. The frame is only logged and kept for inspection.
    pub fn on_data_received(&mut self, rx: RxFrame, sink: &mut impl EventSink) {
        self.stats.downlinks = self.stats.downlinks.saturating_add(1);
        info!("[APP] Received package over LoRa");
        info!("[APP] Last RSSI {} SNR {}", rx.rssi, rx.snr);
        info!("[APP] {}", HexDump(&rx.data));

        sink.emit(&AppEvent::DataReceived {
            len: rx.data.len(),
            rssi: rx.rssi,
            snr: rx.snr,
        });
        self.last_rx = Some(rx);
    }

    /// Uplink cycle finished: account for the result, restart if needed.
    pub fn on_tx_finished(
        &mut self,
        acked: bool,
        hw: &mut (impl PlatformPort + embedded_hal::delay::DelayNs),
        sink: &mut impl EventSink,
    ) {
        if !self.config.lorawan_enabled {
            info!("[APP] P2P TX finished");
            sink.emit(&AppEvent::P2pTxFinished);
            return;
        }

        let confirmed = self.config.confirmed;
        if confirmed {
            info!(
                "[APP] LPWAN TX cycle {}",
                if acked { "finished ACK" } else { "failed NAK" }
            );
        } else {
            info!("[APP] LPWAN TX cycle finished");
        }

        let verdict = self.failures.record(confirmed, acked);
        match verdict {
            TxVerdict::Informational => {}
            TxVerdict::Acked { .. } => {
                self.stats.acks = self.stats.acks.saturating_add(1);
            }
            TxVerdict::Failed { failures } => {
                self.stats.naks = self.stats.naks.saturating_add(1);
                warn!(
                    "[APP] Send failed {}/{}",
                    failures,
                    self.failures.threshold()
                );
            }
            TxVerdict::Restart { .. } => {
                self.stats.naks = self.stats.naks.saturating_add(1);
                self.stats.restarts = self.stats.restarts.saturating_add(1);
            }
        }

        sink.emit(&AppEvent::TxFinished {
            confirmed,
            acked,
            failures: self.failures.failures(),
        });

        if let TxVerdict::Restart { failures } = verdict {
            error!(
                "[APP] {} failed sendings, resetting node to rejoin",
                failures
            );
            sink.emit(&AppEvent::Restarting { failures });
            hw.delay_ms(self.config.restart_delay_ms);
            hw.restart();
        }
    }

    /// BLE UART data arrived: hand it to the injected link handler.
    pub fn on_link_data<H: NodePorts>(&mut self, hw: &mut H, sink: &mut impl EventSink) {
        match self.link.on_link_data(hw) {
            Some(bytes) => {
                self.stats.link_batches = self.stats.link_batches.saturating_add(1);
                sink.emit(&AppEvent::LinkCommand { bytes });
            }
            None => debug!("[APP] link data ignored"),
        }
    }

    // ── Configuration ─────────────────────────────────────────

    /// Replace the configuration between cycles.
    ///
    /// The failure count survives; threshold and ack policy take effect
    /// on the next tx-finished event.
    pub fn apply_config(&mut self, config: NodeConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.failures
            .reconfigure(config.max_send_failures, config.ack_policy);
        self.link.configure(&config);
        self.config = config;
        info!("[APP] Configuration updated");
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Session captured by the most recent successful join.
    pub fn session(&self) -> Option<&SessionInfo> {
        self.session.session()
    }

    pub fn join_failures(&self) -> u8 {
        self.session.join_failures()
    }

    /// Current unacknowledged-uplink count.
    pub fn send_failures(&self) -> u8 {
        self.failures.failures()
    }

    /// Payload built by the last wake cycle.
    pub fn payload(&self) -> &PayloadEncoder {
        &self.payload
    }

    /// Last downlink, until the next one replaces it.
    pub fn last_rx(&self) -> Option<&RxFrame> {
        self.last_rx.as_ref()
    }

    pub fn stats(&self) -> NodeStats {
        self.stats
    }

    pub fn link_handler(&self) -> &L {
        &self.link
    }
}
