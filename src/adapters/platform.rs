//! Platform adapter: restart, uptime, sensor rail, short delays.
//!
//! On ESP-IDF `restart()` calls `esp_restart()` and never returns; delays
//! block the calling task through FreeRTOS. On the host a restart is only
//! counted and delays sleep the thread.

use embedded_hal::delay::DelayNs;
use log::{info, warn};

use crate::app::ports::PlatformPort;
use crate::drivers::hw_init;
use crate::pins;

use super::time::MonotonicClock;

pub struct Platform {
    clock: MonotonicClock,
    sensor_power: bool,
    restarts: u32,
}

impl Default for Platform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform {
    pub fn new() -> Self {
        Self {
            clock: MonotonicClock::new(),
            sensor_power: false,
            restarts: 0,
        }
    }

    pub fn sensor_power(&self) -> bool {
        self.sensor_power
    }

    /// Restarts requested so far. Only ever non-zero on the host.
    pub fn restarts(&self) -> u32 {
        self.restarts
    }
}

impl PlatformPort for Platform {
    fn restart(&mut self) {
        self.restarts += 1;
        warn!("platform: restarting after {} ms uptime", self.clock.uptime_ms());
        #[cfg(target_os = "espidf")]
        // SAFETY: esp_restart has no preconditions and does not return.
        unsafe {
            esp_idf_svc::sys::esp_restart();
        }
    }

    fn uptime_ms(&self) -> u64 {
        self.clock.uptime_ms()
    }

    fn set_sensor_power(&mut self, on: bool) {
        hw_init::gpio_write(pins::SENSOR_POWER_GPIO, on);
        self.sensor_power = on;
        info!("platform: sensor rail {}", if on { "on" } else { "off" });
    }
}

impl DelayNs for Platform {
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_hal::delay::Ets::delay_us(ns.div_ceil(1_000));
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    #[cfg(target_os = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}
