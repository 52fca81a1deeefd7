//! BLE UART → command console relay.
//!
//! The link-data handler is an injected capability: the controller holds
//! any [`LinkHandler`] and defaults to [`NoLinkHandler`], which leaves the
//! bytes in the UART buffer. [`CommandBridge`] is the stock handler that
//! forwards every waiting byte to the console, paced so the console's
//! input path is never overrun, then terminates the batch with `\n`.
//!
//! The bridge does no parsing.

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::config::NodeConfig;

use super::ports::{CommandSink, LinkPort};

/// Byte that closes every forwarded batch.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Strategy invoked on a link-data event.
pub trait LinkHandler {
    /// Handle waiting link bytes. Returns how many bytes were consumed,
    /// or `None` when the handler is inactive.
    fn on_link_data<H>(&mut self, hw: &mut H) -> Option<usize>
    where
        H: LinkPort + CommandSink + DelayNs;

    /// Pick up new settings between cycles.
    fn configure(&mut self, _config: &NodeConfig) {}
}

/// Default handler: ignores link data.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLinkHandler;

impl LinkHandler for NoLinkHandler {
    fn on_link_data<H>(&mut self, _hw: &mut H) -> Option<usize>
    where
        H: LinkPort + CommandSink + DelayNs,
    {
        None
    }
}

/// Paced byte relay into the command console.
#[derive(Debug, Clone)]
pub struct CommandBridge {
    enabled: bool,
    byte_gap_ms: u32,
}

impl CommandBridge {
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            enabled: config.ble_enabled,
            byte_gap_ms: config.link_byte_gap_ms,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl LinkHandler for CommandBridge {
    fn on_link_data<H>(&mut self, hw: &mut H) -> Option<usize>
    where
        H: LinkPort + CommandSink + DelayNs,
    {
        if !self.enabled {
            return None;
        }
        info!("[AT] RECEIVED BLE");

        // Only what is buffered now; bytes arriving mid-drain re-signal
        // the event and go out with the next batch.
        let waiting = hw.available();
        let mut forwarded = 0;
        while forwarded < waiting {
            let Some(byte) = hw.read_byte() else { break };
            hw.submit(byte);
            forwarded += 1;
            hw.delay_ms(self.byte_gap_ms);
        }
        hw.submit(LINE_TERMINATOR);
        debug!("[AT] forwarded {} bytes to console", forwarded);
        Some(forwarded)
    }

    fn configure(&mut self, config: &NodeConfig) {
        self.enabled = config.ble_enabled;
        self.byte_gap_ms = config.link_byte_gap_ms;
    }
}
