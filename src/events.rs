//! Interrupt-safe event hand-off between producers and the dispatcher.
//!
//! Events are produced by:
//! - the send-interval timer (status / wake-up)
//! - radio stack callbacks (join finished, data received, tx finished)
//! - the BLE UART receive callback (link data arrived)
//!
//! Events are consumed by [`NodeController::dispatch`], which takes each
//! pending kind in a fixed order and runs its handler to completion.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Timer       │────▶│              │     │              │
//! │ Radio cb    │────▶│   EventBus   │────▶│  dispatch()  │
//! │ BLE UART cb │────▶│ (atomic set) │     │  (consumer)  │
//! └─────────────┘     └──────────────┘     └──────────────┘
//! ```
//!
//! Pending kinds are a set, not a queue: signalling a kind that is
//! already pending coalesces with the earlier signal. Data attached to a
//! callback (join result, ack flag, received frame) is written and its bit
//! set inside one critical section, and the consumer clears the bit and
//! reads the data inside one critical section, so each value is handled
//! at most once. The latest write wins.
//!
//! [`NodeController::dispatch`]: crate::app::service::NodeController::dispatch

use core::cell::RefCell;
use core::sync::atomic::{AtomicU8, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Vec;

/// Largest downlink frame kept for the data-received handler.
pub const RX_CAPACITY: usize = 256;

/// Event kinds, each owning one bit of the pending set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    /// Send-interval timer fired.
    Status = 0b0000_0001,
    /// Join procedure completed (success or failure).
    JoinFinished = 0b0000_0010,
    /// Downlink data arrived.
    DataReceived = 0b0000_0100,
    /// Uplink cycle completed (acked or not).
    TxFinished = 0b0000_1000,
    /// Bytes are waiting on the BLE UART.
    LinkData = 0b0001_0000,
}

impl EventKind {
    /// Dispatch order.
    pub const ALL: [EventKind; 5] = [
        Self::Status,
        Self::JoinFinished,
        Self::DataReceived,
        Self::TxFinished,
        Self::LinkData,
    ];

    /// Return the bitmask for this kind.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

/// Last downlink frame with its signal metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RxFrame {
    pub data: Vec<u8, RX_CAPACITY>,
    pub rssi: i16,
    pub snr: i8,
}

impl RxFrame {
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            rssi: 0,
            snr: 0,
        }
    }
}

struct Mailbox {
    join_success: bool,
    tx_acked: bool,
    rx: RxFrame,
}

/// Pending-event set plus the callback data that travels with it.
pub struct EventBus {
    pending: AtomicU8,
    mailbox: Mutex<CriticalSectionRawMutex, RefCell<Mailbox>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Bus shared with timer and radio/BLE callbacks on the device.
///
/// Host code and tests construct their own [`EventBus`] instead.
pub static EVENTS: EventBus = EventBus::new();

impl EventBus {
    pub const fn new() -> Self {
        Self {
            pending: AtomicU8::new(0),
            mailbox: Mutex::new(RefCell::new(Mailbox {
                join_success: false,
                tx_acked: false,
                rx: RxFrame::new(),
            })),
        }
    }

    // ── Producer side (any context) ───────────────────────────

    /// Mark `kind` pending. Safe to call from ISR context.
    pub fn signal(&self, kind: EventKind) {
        self.pending.fetch_or(kind.mask(), Ordering::Release);
    }

    /// Send-interval timer expiry.
    pub fn status_tick(&self) {
        self.signal(EventKind::Status);
    }

    /// Join procedure finished.
    pub fn join_finished(&self, success: bool) {
        self.mailbox.lock(|m| {
            m.borrow_mut().join_success = success;
            self.signal(EventKind::JoinFinished);
        });
    }

    /// Uplink finished; `acked` is false for a missing confirmation.
    pub fn tx_finished(&self, acked: bool) {
        self.mailbox.lock(|m| {
            m.borrow_mut().tx_acked = acked;
            self.signal(EventKind::TxFinished);
        });
    }

    /// Downlink received. Frames longer than [`RX_CAPACITY`] are truncated.
    pub fn data_received(&self, data: &[u8], rssi: i16, snr: i8) {
        let n = data.len().min(RX_CAPACITY);
        self.mailbox.lock(|m| {
            let rx = &mut m.borrow_mut().rx;
            rx.data.clear();
            let _ = rx.data.extend_from_slice(&data[..n]);
            rx.rssi = rssi;
            rx.snr = snr;
            self.signal(EventKind::DataReceived);
        });
    }

    /// BLE UART bytes available.
    pub fn link_data(&self) {
        self.signal(EventKind::LinkData);
    }

    // ── Consumer side (main loop) ─────────────────────────────

    /// Clear `kind` and report whether it was pending.
    pub fn take(&self, kind: EventKind) -> bool {
        let prev = self.pending.fetch_and(!kind.mask(), Ordering::AcqRel);
        prev & kind.mask() != 0
    }

    pub fn is_pending(&self, kind: EventKind) -> bool {
        self.pending.load(Ordering::Acquire) & kind.mask() != 0
    }

    /// Raw pending bitmask.
    pub fn pending_mask(&self) -> u8 {
        self.pending.load(Ordering::Acquire)
    }

    /// Nothing pending; the caller may sleep.
    pub fn is_idle(&self) -> bool {
        self.pending_mask() == 0
    }

    /// Take a pending join-finished event with its result.
    pub fn take_join_finished(&self) -> Option<bool> {
        self.mailbox.lock(|m| {
            self.take(EventKind::JoinFinished)
                .then(|| m.borrow().join_success)
        })
    }

    /// Take a pending tx-finished event with its ack flag.
    pub fn take_tx_finished(&self) -> Option<bool> {
        self.mailbox.lock(|m| {
            self.take(EventKind::TxFinished)
                .then(|| m.borrow().tx_acked)
        })
    }

    /// Take a pending data-received event with a copy of its frame.
    pub fn take_rx(&self) -> Option<RxFrame> {
        self.mailbox.lock(|m| {
            self.take(EventKind::DataReceived)
                .then(|| m.borrow().rx.clone())
        })
    }
}
