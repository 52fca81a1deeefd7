//! Line-assembling command console.
//!
//! Implements [`CommandSink`]: bytes are collected into a line buffer
//! until `\n`, then the completed line is queued for the command
//! interpreter. `\r` is dropped so both `\r\n` and `\n` terminators work.
//! The console does not interpret lines.

use heapless::{Deque, String};
use log::{info, warn};

use crate::app::ports::CommandSink;

/// Longest command line accepted.
pub const LINE_MAX: usize = 128;
/// Completed lines held until the interpreter takes them.
pub const PENDING_LINES: usize = 4;

#[derive(Debug, Default)]
pub struct LineConsole {
    line: String<LINE_MAX>,
    overflowed: bool,
    pending: Deque<String<LINE_MAX>, PENDING_LINES>,
    dropped_lines: u32,
}

impl LineConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest completed line.
    pub fn take_line(&mut self) -> Option<String<LINE_MAX>> {
        self.pending.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Lines lost to overflow or a full queue.
    pub fn dropped_lines(&self) -> u32 {
        self.dropped_lines
    }

    fn finish_line(&mut self) {
        let line = core::mem::take(&mut self.line);
        if core::mem::take(&mut self.overflowed) {
            warn!("[AT] line longer than {} bytes dropped", LINE_MAX);
            self.dropped_lines += 1;
            return;
        }
        if line.is_empty() {
            return;
        }
        info!("[AT] {}", line);
        if self.pending.push_back(line).is_err() {
            warn!("[AT] console queue full, line dropped");
            self.dropped_lines += 1;
        }
    }
}

impl CommandSink for LineConsole {
    fn submit(&mut self, byte: u8) {
        match byte {
            b'\n' => self.finish_line(),
            b'\r' => {}
            _ if self.overflowed => {}
            _ => {
                // Non-ASCII bytes are kept as replacement characters.
                let c = if byte.is_ascii() { byte as char } else { '?' };
                if self.line.push(c).is_err() {
                    self.overflowed = true;
                }
            }
        }
    }
}
