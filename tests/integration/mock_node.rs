//! Mock node hardware for integration tests.
//!
//! Records every port call so tests can assert on the full radio, link,
//! console and platform history without touching real peripherals.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use lpnode::app::events::AppEvent;
use lpnode::app::ports::{
    BatteryPort, CommandSink, EnqueueResult, EventSink, LinkPort, LoRaWanPort, P2pPort,
    PlatformPort, RadioError, SessionKeys,
};
use lpnode::events::{EventBus, EventKind};

// ── Port call record ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PortCall {
    Enqueue {
        payload: Vec<u8>,
        fport: u8,
        confirmed: bool,
    },
    P2pSend(Vec<u8>),
    Join,
    Submit(u8),
    DelayMs(u32),
    DelayNs(u32),
    Restart,
    SensorPower(bool),
    Advertise { name: String, secs: u16 },
    LinkWrite(Vec<u8>),
}

// ── MockNode ──────────────────────────────────────────────────

pub struct MockNode {
    pub calls: Vec<PortCall>,
    pub joined: bool,
    pub enqueue_result: EnqueueResult,
    pub join_result: Result<(), RadioError>,
    pub keys: SessionKeys,
    pub dev_addr: u32,
    pub battery_mv: VecDeque<f32>,
    pub default_mv: f32,
    pub link_rx: VecDeque<u8>,
    pub connected: bool,
    /// Signal this kind on `bus` whenever an uplink is enqueued.
    pub resignal: Option<(&'static EventBus, EventKind)>,
}

#[allow(dead_code)]
impl MockNode {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            joined: true,
            enqueue_result: EnqueueResult::Accepted,
            join_result: Ok(()),
            keys: SessionKeys {
                nwk_skey: [0xA5; 16],
                app_skey: [0x5A; 16],
            },
            dev_addr: 0x260B_1234,
            battery_mv: VecDeque::new(),
            default_mv: 3700.0,
            link_rx: VecDeque::new(),
            connected: true,
            resignal: None,
        }
    }

    pub fn unjoined() -> Self {
        Self {
            joined: false,
            ..Self::new()
        }
    }

    pub fn with_link_bytes(mut self, bytes: &[u8]) -> Self {
        self.link_rx.extend(bytes.iter().copied());
        self
    }

    pub fn enqueued(&self) -> Vec<&Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::Enqueue { payload, .. } => Some(payload),
                _ => None,
            })
            .collect()
    }

    pub fn p2p_sent(&self) -> Vec<&Vec<u8>> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::P2pSend(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    pub fn submitted(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PortCall::Submit(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, want: &PortCall) -> usize {
        self.calls.iter().filter(|c| *c == want).count()
    }

    pub fn restarts(&self) -> usize {
        self.count(&PortCall::Restart)
    }

    pub fn joins(&self) -> usize {
        self.count(&PortCall::Join)
    }
}

impl Default for MockNode {
    fn default() -> Self {
        Self::new()
    }
}

impl LoRaWanPort for MockNode {
    fn join_status(&self) -> bool {
        self.joined
    }

    fn enqueue(&mut self, payload: &[u8], fport: u8, confirmed: bool) -> EnqueueResult {
        self.calls.push(PortCall::Enqueue {
            payload: payload.to_vec(),
            fport,
            confirmed,
        });
        if let Some((bus, kind)) = self.resignal {
            bus.signal(kind);
        }
        self.enqueue_result
    }

    fn session_keys(&self) -> SessionKeys {
        self.keys
    }

    fn device_address(&self) -> u32 {
        self.dev_addr
    }

    fn join(&mut self) -> Result<(), RadioError> {
        self.calls.push(PortCall::Join);
        self.join_result
    }
}

impl P2pPort for MockNode {
    fn send(&mut self, payload: &[u8]) {
        self.calls.push(PortCall::P2pSend(payload.to_vec()));
    }
}

impl LinkPort for MockNode {
    fn available(&self) -> usize {
        self.link_rx.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.link_rx.pop_front()
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn write(&mut self, data: &[u8]) {
        self.calls.push(PortCall::LinkWrite(data.to_vec()));
    }

    fn start_advertising(&mut self, name: &str, timeout_secs: u16) {
        self.calls.push(PortCall::Advertise {
            name: name.to_string(),
            secs: timeout_secs,
        });
    }
}

impl CommandSink for MockNode {
    fn submit(&mut self, byte: u8) {
        self.calls.push(PortCall::Submit(byte));
    }
}

impl BatteryPort for MockNode {
    fn sample_millivolts(&mut self) -> f32 {
        self.battery_mv.pop_front().unwrap_or(self.default_mv)
    }
}

impl PlatformPort for MockNode {
    fn restart(&mut self) {
        self.calls.push(PortCall::Restart);
    }

    fn uptime_ms(&self) -> u64 {
        0
    }

    fn set_sensor_power(&mut self, on: bool) {
        self.calls.push(PortCall::SensorPower(on));
    }
}

impl DelayNs for MockNode {
    fn delay_ns(&mut self, ns: u32) {
        self.calls.push(PortCall::DelayNs(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(PortCall::DelayMs(ms));
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn last(&self) -> Option<&AppEvent> {
        self.events.last()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
