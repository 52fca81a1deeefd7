//! GPIO / peripheral pin assignments for the WisBlock ESP32 base board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Power
// ---------------------------------------------------------------------------

/// Sensor-slot 3V3_S rail enable (WB_IO2). HIGH = sensors powered.
pub const SENSOR_POWER_GPIO: i32 = 27;

// ---------------------------------------------------------------------------
// Battery (ADC1)
// ---------------------------------------------------------------------------

/// Battery divider tap. ADC1 channel 0 (GPIO 36 / WB_A0).
pub const VBAT_ADC_GPIO: i32 = 36;

// ---------------------------------------------------------------------------
// Status LEDs
// ---------------------------------------------------------------------------

/// Green LED, lit while BLE is connected.
pub const LED_GREEN_GPIO: i32 = 12;
/// Blue LED, lit while advertising.
pub const LED_BLUE_GPIO: i32 = 2;
