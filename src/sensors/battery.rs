//! Battery voltage sensing.
//!
//! The battery is read through a resistive divider on an ADC channel.
//! One reading is the arithmetic mean of a burst of back-to-back raw
//! samples, which flattens transient ADC noise for the cost of a few
//! extra conversions per wake cycle.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the battery ADC channel via the oneshot API
//! (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.
//!
//! A failed conversion is logged and counted, and the sample reads 0 mV.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use log::warn;

use crate::app::ports::BatteryPort;
use crate::drivers::hw_init;
#[cfg(not(target_os = "espidf"))]
use crate::drivers::hw_init::HwInitError;

#[cfg(not(target_os = "espidf"))]
static SIM_BATT_ADC: AtomicU16 = AtomicU16::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_BATT_FAULT: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_adc(raw: u16) {
    SIM_BATT_ADC.store(raw, Ordering::Relaxed);
}

/// Make every simulated conversion fail until cleared.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_fault(fault: bool) {
    SIM_BATT_FAULT.store(fault, Ordering::Relaxed);
}

/// Full-scale ADC count (12-bit).
const ADC_MAX: f32 = 4095.0;
/// Input range at 12 dB attenuation (mV).
const ADC_RANGE_MV: f32 = 3100.0;
/// 100k / 100k divider between the cell and the pin.
const DIVIDER_RATIO: f32 = 2.0;

/// An averaged battery reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    pub millivolts: f32,
    pub volts: f32,
}

/// Average `samples` raw readings and convert to volts.
///
/// `samples == 0` is treated as a single sample.
pub fn read_average(port: &mut impl BatteryPort, samples: u8) -> BatteryReading {
    let n = samples.max(1);
    let mut sum = 0.0f32;
    for _ in 0..n {
        sum += port.sample_millivolts();
    }
    let millivolts = sum / f32::from(n);
    BatteryReading {
        millivolts,
        volts: millivolts / 1000.0,
    }
}

/// ADC-backed battery sampler.
pub struct AdcBatterySampler {
    adc_gpio: i32,
    read_errors: u32,
}

impl AdcBatterySampler {
    pub fn new(adc_gpio: i32) -> Self {
        Self {
            adc_gpio,
            read_errors: 0,
        }
    }

    /// Conversions that failed since construction.
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, hw_init::HwInitError> {
        hw_init::adc1_read(hw_init::ADC1_CH_VBAT)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, HwInitError> {
        if SIM_BATT_FAULT.load(Ordering::Relaxed) {
            return Err(HwInitError::AdcReadFailed(-1));
        }
        Ok(SIM_BATT_ADC.load(Ordering::Relaxed))
    }

    fn adc_to_millivolts(raw: u16) -> f32 {
        f32::from(raw) / ADC_MAX * ADC_RANGE_MV * DIVIDER_RATIO
    }
}

impl BatteryPort for AdcBatterySampler {
    fn sample_millivolts(&mut self) -> f32 {
        match self.read_adc() {
            Ok(raw) => Self::adc_to_millivolts(raw),
            Err(e) => {
                self.read_errors = self.read_errors.saturating_add(1);
                warn!(
                    "battery: GPIO{} CH{}: {}, sample reads 0 mV",
                    self.adc_gpio,
                    hw_init::ADC1_CH_VBAT,
                    e
                );
                0.0
            }
        }
    }
}
