//! Hardware adapter: bridges the concrete adapters to the domain ports.
//!
//! Owns the radio, the short-range link, the command console, the battery
//! sampler and the platform services, exposing them as the single
//! [`NodePorts`](crate::app::ports::NodePorts) value the controller
//! dispatches against. Each port method forwards to the adapter that
//! serves it.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{
    BatteryPort, CommandSink, EnqueueResult, LinkPort, LoRaWanPort, P2pPort, PlatformPort,
    RadioError, SessionKeys,
};

use super::platform::Platform;

pub struct NodeHardware<R, L, C, B> {
    pub radio: R,
    pub link: L,
    pub console: C,
    pub battery: B,
    pub platform: Platform,
}

impl<R, L, C, B> NodeHardware<R, L, C, B> {
    pub fn new(radio: R, link: L, console: C, battery: B, platform: Platform) -> Self {
        Self {
            radio,
            link,
            console,
            battery,
            platform,
        }
    }
}

// ── Radio ─────────────────────────────────────────────────────

impl<R: LoRaWanPort, L, C, B> LoRaWanPort for NodeHardware<R, L, C, B> {
    fn join_status(&self) -> bool {
        self.radio.join_status()
    }

    fn enqueue(&mut self, payload: &[u8], fport: u8, confirmed: bool) -> EnqueueResult {
        self.radio.enqueue(payload, fport, confirmed)
    }

    fn session_keys(&self) -> SessionKeys {
        self.radio.session_keys()
    }

    fn device_address(&self) -> u32 {
        self.radio.device_address()
    }

    fn join(&mut self) -> Result<(), RadioError> {
        self.radio.join()
    }
}

impl<R: P2pPort, L, C, B> P2pPort for NodeHardware<R, L, C, B> {
    fn send(&mut self, payload: &[u8]) {
        self.radio.send(payload);
    }
}

// ── Link + console ────────────────────────────────────────────

impl<R, L: LinkPort, C, B> LinkPort for NodeHardware<R, L, C, B> {
    fn available(&self) -> usize {
        self.link.available()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.link.read_byte()
    }

    fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    fn write(&mut self, data: &[u8]) {
        self.link.write(data);
    }

    fn start_advertising(&mut self, name: &str, timeout_secs: u16) {
        self.link.start_advertising(name, timeout_secs);
    }
}

impl<R, L, C: CommandSink, B> CommandSink for NodeHardware<R, L, C, B> {
    fn submit(&mut self, byte: u8) {
        self.console.submit(byte);
    }
}

// ── Battery + platform ────────────────────────────────────────

impl<R, L, C, B: BatteryPort> BatteryPort for NodeHardware<R, L, C, B> {
    fn sample_millivolts(&mut self) -> f32 {
        self.battery.sample_millivolts()
    }
}

impl<R, L, C, B> PlatformPort for NodeHardware<R, L, C, B> {
    fn restart(&mut self) {
        self.platform.restart();
    }

    fn uptime_ms(&self) -> u64 {
        self.platform.uptime_ms()
    }

    fn set_sensor_power(&mut self, on: bool) {
        self.platform.set_sensor_power(on);
    }
}

impl<R, L, C, B> DelayNs for NodeHardware<R, L, C, B> {
    fn delay_ns(&mut self, ns: u32) {
        self.platform.delay_ns(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.platform.delay_us(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.platform.delay_ms(ms);
    }
}
