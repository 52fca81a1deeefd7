//! Fuzz target: `PayloadEncoder` and the record reader
//!
//! Interprets the input as a stream of `channel | tag | value` triples and
//! pushes each one into the encoder, verifying:
//! - No panics under arbitrary byte inputs
//! - The buffer never exceeds `PAYLOAD_CAPACITY`
//! - A rejected record leaves the buffer untouched
//! - The reader decodes exactly the accepted records
//!
//! cargo fuzz run fuzz_payload_encoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use lpnode::payload::{PAYLOAD_CAPACITY, PayloadEncoder, Records, SensorType};

fuzz_target!(|data: &[u8]| {
    let mut enc = PayloadEncoder::new();
    let mut accepted = 0usize;

    for chunk in data.chunks_exact(6) {
        let Some(ty) = SensorType::from_tag(chunk[1]) else {
            continue;
        };
        let value = f32::from_le_bytes([chunk[2], chunk[3], chunk[4], chunk[5]]);

        let before = enc.len();
        match enc.add_reading(chunk[0], ty, value) {
            Ok(()) => {
                assert_eq!(enc.len(), before + ty.record_len());
                accepted += 1;
            }
            Err(_) => assert_eq!(enc.len(), before),
        }
        assert!(enc.len() <= PAYLOAD_CAPACITY);
    }

    assert_eq!(Records::new(enc.serialize()).count(), accepted);

    // The reader must also survive arbitrary bytes.
    for rec in Records::new(data) {
        let _ = rec.value();
    }
});
