//! Hex formatting for log lines (keys, received frames).

use core::fmt;

/// Uppercase hex, one space after every byte (`"01 A0 FF "`).
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02X} ", b)?;
        }
        Ok(())
    }
}

/// Uppercase hex without separators (`"01A0FF"`).
pub struct HexKey<'a>(pub &'a [u8]);

impl fmt::Display for HexKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}
