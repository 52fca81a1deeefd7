//! Log-based event sink adapters.
//!
//! [`LogEventSink`] writes every [`AppEvent`] as one tagged line to the
//! ESP-IDF logger (UART / USB-CDC in production). [`LinkEchoSink`] wraps
//! another sink and mirrors the same line to the BLE UART while a central
//! is connected.

use core::fmt::{self, Write as _};

use log::info;

use crate::app::events::{AppEvent, TxOutcome};
use crate::app::ports::{EventSink, LinkPort};

/// Longest line echoed to the link; longer lines are cut.
const ECHO_LINE_MAX: usize = 96;

/// One-line rendering shared by both sinks.
pub struct EventLine<'a>(pub &'a AppEvent);

impl fmt::Display for EventLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            AppEvent::Started { lorawan, version } => write!(
                f,
                "START | v{}.{}.{} | mode={}",
                version.0,
                version.1,
                version.2,
                if *lorawan { "LoRaWAN" } else { "P2P" }
            ),
            AppEvent::Wakeup { battery_volts } => {
                write!(f, "WAKE  | battery={:.2}V", battery_volts)
            }
            AppEvent::Uplink { outcome, len } => {
                let what = match outcome {
                    TxOutcome::Enqueued => "enqueued",
                    TxOutcome::Busy => "busy",
                    TxOutcome::Rejected => "too big for DR",
                    TxOutcome::NotJoined => "not joined",
                    TxOutcome::P2pSent => "p2p sent",
                    TxOutcome::EncodeFailed => "encode failed",
                };
                write!(f, "TX    | {} | {} bytes", what, len)
            }
            AppEvent::Joined { dev_addr } => write!(f, "JOIN  | ok | DevAddr={:08X}", dev_addr),
            AppEvent::JoinFailed { rejoin } => write!(
                f,
                "JOIN  | failed | {}",
                if *rejoin { "retrying" } else { "giving up" }
            ),
            AppEvent::DataReceived { len, rssi, snr } => {
                write!(f, "RX    | {} bytes | RSSI={} SNR={}", len, rssi, snr)
            }
            AppEvent::TxFinished {
                confirmed,
                acked,
                failures,
            } => {
                if *confirmed {
                    write!(
                        f,
                        "TXFIN | {} | failures={}",
                        if *acked { "ACK" } else { "NAK" },
                        failures
                    )
                } else {
                    write!(f, "TXFIN | unconfirmed")
                }
            }
            AppEvent::P2pTxFinished => write!(f, "TXFIN | p2p"),
            AppEvent::Restarting { failures } => {
                write!(f, "RESET | {} failed sendings", failures)
            }
            AppEvent::LinkCommand { bytes } => write!(f, "BLE   | {} bytes to console", bytes),
        }
    }
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        info!("{}", EventLine(event));
    }
}

/// Decorator that also writes each event line to a short-range link.
pub struct LinkEchoSink<S, L> {
    inner: S,
    link: L,
}

impl<S: EventSink, L: LinkPort> LinkEchoSink<S, L> {
    pub fn new(inner: S, link: L) -> Self {
        Self { inner, link }
    }

    pub fn into_inner(self) -> (S, L) {
        (self.inner, self.link)
    }
}

impl<S: EventSink, L: LinkPort> EventSink for LinkEchoSink<S, L> {
    fn emit(&mut self, event: &AppEvent) {
        self.inner.emit(event);

        if !self.link.is_connected() {
            return;
        }
        let mut line: heapless::String<ECHO_LINE_MAX> = heapless::String::new();
        // A full buffer only cuts the line short.
        let _ = write!(line, "{}", EventLine(event));
        let _ = line.push('\n');
        self.link.write(line.as_bytes());
    }
}
