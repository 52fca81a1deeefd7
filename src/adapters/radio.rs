//! Loopback radio adapter.
//!
//! Implements [`LoRaWanPort`] and [`P2pPort`] without a transceiver. Every
//! request completes immediately by signalling the matching callback on
//! the [`EventBus`], the same way a real MAC reports join and uplink
//! completion from its own task. Join results and acknowledgements are
//! scripted, which makes the adapter the bench stand-in for the radio
//! stack on the host and on boards without a transceiver fitted.

use std::collections::VecDeque;
use std::vec::Vec;

use log::{debug, info};

use crate::app::ports::{EnqueueResult, LoRaWanPort, P2pPort, RadioError, SessionKeys};
use crate::events::EventBus;
use crate::payload::PAYLOAD_CAPACITY;

/// One uplink accepted by the MAC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uplink {
    pub payload: Vec<u8>,
    pub fport: u8,
    pub confirmed: bool,
}

pub struct LoopbackRadio<'a> {
    bus: &'a EventBus,
    joined: bool,
    busy: bool,
    max_payload: usize,
    keys: SessionKeys,
    dev_addr: u32,
    join_script: VecDeque<bool>,
    ack_script: VecDeque<bool>,
    join_requests: u32,
    uplinks: Vec<Uplink>,
    p2p: Vec<Vec<u8>>,
}

impl<'a> LoopbackRadio<'a> {
    pub fn new(bus: &'a EventBus) -> Self {
        Self {
            bus,
            joined: false,
            busy: false,
            max_payload: PAYLOAD_CAPACITY,
            keys: SessionKeys {
                nwk_skey: [0x11; 16],
                app_skey: [0x22; 16],
            },
            dev_addr: 0x260B_0001,
            join_script: VecDeque::new(),
            ack_script: VecDeque::new(),
            join_requests: 0,
            uplinks: Vec::new(),
            p2p: Vec::new(),
        }
    }

    /// Session handed out on the next successful join.
    pub fn with_session(mut self, keys: SessionKeys, dev_addr: u32) -> Self {
        self.keys = keys;
        self.dev_addr = dev_addr;
        self
    }

    /// Largest payload the current data rate carries.
    pub fn set_max_payload(&mut self, len: usize) {
        self.max_payload = len;
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Queue join results; an empty script joins successfully.
    pub fn script_joins(&mut self, results: &[bool]) {
        self.join_script.extend(results.iter().copied());
    }

    /// Queue acknowledgements; an empty script acknowledges.
    pub fn script_acks(&mut self, acks: &[bool]) {
        self.ack_script.extend(acks.iter().copied());
    }

    pub fn join_requests(&self) -> u32 {
        self.join_requests
    }

    pub fn uplinks(&self) -> &[Uplink] {
        &self.uplinks
    }

    pub fn p2p_frames(&self) -> &[Vec<u8>] {
        &self.p2p
    }

    /// Deliver a downlink as if the MAC had received it.
    pub fn inject_downlink(&self, data: &[u8], rssi: i16, snr: i8) {
        self.bus.data_received(data, rssi, snr);
    }
}

impl LoRaWanPort for LoopbackRadio<'_> {
    fn join_status(&self) -> bool {
        self.joined
    }

    fn enqueue(&mut self, payload: &[u8], fport: u8, confirmed: bool) -> EnqueueResult {
        if self.busy {
            return EnqueueResult::Busy;
        }
        if payload.len() > self.max_payload {
            return EnqueueResult::Rejected;
        }
        self.uplinks.push(Uplink {
            payload: payload.to_vec(),
            fport,
            confirmed,
        });
        let acked = self.ack_script.pop_front().unwrap_or(true);
        debug!("radio(loopback): uplink {} bytes on port {}", payload.len(), fport);
        self.bus.tx_finished(acked);
        EnqueueResult::Accepted
    }

    fn session_keys(&self) -> SessionKeys {
        self.keys
    }

    fn device_address(&self) -> u32 {
        self.dev_addr
    }

    fn join(&mut self) -> Result<(), RadioError> {
        if self.busy {
            return Err(RadioError::Busy);
        }
        self.join_requests += 1;
        let ok = self.join_script.pop_front().unwrap_or(true);
        self.joined = ok;
        info!("radio(loopback): join request #{} -> {}", self.join_requests, ok);
        self.bus.join_finished(ok);
        Ok(())
    }
}

impl P2pPort for LoopbackRadio<'_> {
    fn send(&mut self, payload: &[u8]) {
        self.p2p.push(payload.to_vec());
        self.bus.tx_finished(true);
    }
}
