//! Compact type-tagged sensor payload encoder.
//!
//! Each reading is a `channel | type | value` record, values big-endian
//! and scaled to a fixed resolution per type:
//!
//! ```text
//! ┌─────────┬─────────┬──────────────────────┐
//! │ Channel │  Type   │  Value (1–2 bytes)   │
//! │  (1B)   │  (1B)   │  big-endian, scaled  │
//! └─────────┴─────────┴──────────────────────┘
//! ```
//!
//! The buffer is a fixed-capacity `heapless::Vec`, reset at the start of
//! every wake cycle. A record that would not fit is rejected whole; the
//! buffer never holds a partial record.

use core::fmt;

use heapless::Vec;

/// Maximum payload size in bytes (smallest common uplink limit at the
/// slowest data rate).
pub const PAYLOAD_CAPACITY: usize = 51;

/// Channel used for the node's own battery voltage.
pub const CHANNEL_BATTERY: u8 = 1;

// ── Type tags ─────────────────────────────────────────────────

/// Sensor value types understood by the payload format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SensorType {
    DigitalInput = 0x00,
    DigitalOutput = 0x01,
    /// 0.01 signed.
    AnalogInput = 0x02,
    /// 0.01 signed.
    AnalogOutput = 0x03,
    /// 1 lux unsigned.
    Illuminance = 0x65,
    Presence = 0x66,
    /// 0.1 °C signed.
    Temperature = 0x67,
    /// 0.5 % unsigned.
    Humidity = 0x68,
    /// 0.1 hPa unsigned.
    Barometer = 0x73,
    /// 0.01 V unsigned.
    Voltage = 0x74,
}

impl SensorType {
    /// Wire tag byte.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Width of the encoded value in bytes.
    pub const fn value_len(self) -> usize {
        match self {
            Self::DigitalInput | Self::DigitalOutput | Self::Presence | Self::Humidity => 1,
            Self::AnalogInput
            | Self::AnalogOutput
            | Self::Illuminance
            | Self::Temperature
            | Self::Barometer
            | Self::Voltage => 2,
        }
    }

    /// Full record width (channel + tag + value).
    pub const fn record_len(self) -> usize {
        2 + self.value_len()
    }

    /// Multiplier from physical units to the integer on the wire.
    pub const fn scale(self) -> f32 {
        match self {
            Self::DigitalInput | Self::DigitalOutput | Self::Presence | Self::Illuminance => 1.0,
            Self::AnalogInput | Self::AnalogOutput | Self::Voltage => 100.0,
            Self::Temperature | Self::Barometer => 10.0,
            Self::Humidity => 2.0,
        }
    }

    pub const fn is_signed(self) -> bool {
        matches!(self, Self::AnalogInput | Self::AnalogOutput | Self::Temperature)
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(Self::DigitalInput),
            0x01 => Some(Self::DigitalOutput),
            0x02 => Some(Self::AnalogInput),
            0x03 => Some(Self::AnalogOutput),
            0x65 => Some(Self::Illuminance),
            0x66 => Some(Self::Presence),
            0x67 => Some(Self::Temperature),
            0x68 => Some(Self::Humidity),
            0x73 => Some(Self::Barometer),
            0x74 => Some(Self::Voltage),
            _ => None,
        }
    }

    /// Scale, round and saturate a physical value into the wire integer.
    fn quantise(self, value: f32) -> i32 {
        let scaled = (value * self.scale()).round();
        let (lo, hi) = match (self.value_len(), self.is_signed()) {
            (1, _) => (0.0, f32::from(u8::MAX)),
            (_, true) => (f32::from(i16::MIN), f32::from(i16::MAX)),
            (_, false) => (0.0, f32::from(u16::MAX)),
        };
        if scaled.is_nan() {
            return 0;
        }
        scaled.clamp(lo, hi) as i32
    }
}

// ── Errors ────────────────────────────────────────────────────

/// Errors from [`PayloadEncoder`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    /// The record does not fit in the remaining buffer space.
    CapacityExceeded { needed: usize, remaining: usize },
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded { needed, remaining } => write!(
                f,
                "payload capacity exceeded (need {} bytes, {} left)",
                needed, remaining
            ),
        }
    }
}

// ── Encoder ───────────────────────────────────────────────────

/// Reusable payload buffer.
#[derive(Debug, Default)]
pub struct PayloadEncoder {
    buf: Vec<u8, PAYLOAD_CAPACITY>,
}

impl PayloadEncoder {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Empty the buffer.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        PAYLOAD_CAPACITY - self.buf.len()
    }

    /// Whether a record of `ty` would fit.
    pub fn fits(&self, ty: SensorType) -> bool {
        ty.record_len() <= self.remaining()
    }

    /// Append one typed reading.
    pub fn add_reading(&mut self, channel: u8, ty: SensorType, value: f32) -> Result<(), EncodeError> {
        let needed = ty.record_len();
        let remaining = self.remaining();
        if needed > remaining {
            return Err(EncodeError::CapacityExceeded { needed, remaining });
        }

        let raw = ty.quantise(value);
        // Capacity was checked above; none of these pushes can fail.
        let _ = self.buf.push(channel);
        let _ = self.buf.push(ty.tag());
        match ty.value_len() {
            1 => {
                let _ = self.buf.push(raw as u8);
            }
            _ => {
                let _ = self.buf.extend_from_slice(&(raw as u16).to_be_bytes());
            }
        }
        Ok(())
    }

    /// Append a voltage reading in volts.
    pub fn add_voltage(&mut self, channel: u8, volts: f32) -> Result<(), EncodeError> {
        self.add_reading(channel, SensorType::Voltage, volts)
    }

    /// Current encoded bytes, ready to hand to the radio.
    pub fn serialize(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Walk the encoded records.
    pub fn records(&self) -> Records<'_> {
        Records::new(&self.buf)
    }
}

// ── Record reader ─────────────────────────────────────────────

/// One decoded record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record {
    pub channel: u8,
    pub ty: SensorType,
    /// Integer as carried on the wire.
    pub raw: i32,
}

impl Record {
    /// Value in physical units.
    pub fn value(&self) -> f32 {
        self.raw as f32 / self.ty.scale()
    }
}

/// Iterator over the records of an encoded payload.
///
/// Stops at the first unknown tag or truncated record.
pub struct Records<'a> {
    bytes: &'a [u8],
}

impl<'a> Records<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl Iterator for Records<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let bytes = self.bytes;
        let [channel, tag, rest @ ..] = bytes else {
            return None;
        };
        let ty = SensorType::from_tag(*tag)?;
        let width = ty.value_len();
        let value = rest.get(..width)?;
        let raw = match (width, ty.is_signed()) {
            (1, _) => i32::from(value[0]),
            (_, true) => i32::from(i16::from_be_bytes([value[0], value[1]])),
            (_, false) => i32::from(u16::from_be_bytes([value[0], value[1]])),
        };
        let record = Record { channel: *channel, ty, raw };
        self.bytes = &rest[width..];
        Some(record)
    }
}
