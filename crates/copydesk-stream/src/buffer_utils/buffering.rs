use std::str::Utf8Error;

use bytes::{Buf, BytesMut};

const SEPARATOR: &[u8] = b"\n\n";

/// Reassembles event-stream frames from arbitrarily split network chunks.
///
/// Bytes are held until a blank-line separator arrives, so multi-byte UTF-8
/// sequences and JSON documents split across chunks come out whole.
/// Carriage returns are dropped on the way in (`\r\n` framing is accepted);
/// JSON payloads never contain a raw `\r`.
pub struct FrameBuffer {
    buffer: BytesMut,
    // Bytes already searched for a separator
    scanned: usize,
}

impl FrameBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            scanned: 0,
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes.iter().copied().filter(|&b| b != b'\r'));
    }

    /// Next complete frame (without its separator), or `None` until more
    /// bytes arrive.
    pub fn next_frame(&mut self) -> Option<Result<String, Utf8Error>> {
        let start = self.scanned.saturating_sub(SEPARATOR.len() - 1);

        let found = self.buffer[start..]
            .windows(SEPARATOR.len())
            .position(|w| w == SEPARATOR)
            .map(|pos| start + pos);

        let Some(frame_end) = found else {
            self.scanned = self.buffer.len();
            return None;
        };

        let frame = self.buffer.split_to(frame_end).freeze();
        self.buffer.advance(SEPARATOR.len());
        self.scanned = 0;

        Some(std::str::from_utf8(&frame).map(str::to_string))
    }

    /// Whatever is left once the byte stream has closed. A server that omits
    /// the final blank line still gets its last frame considered.
    pub fn finish(&mut self) -> Option<Result<String, Utf8Error>> {
        self.scanned = 0;
        if self.buffer.iter().all(|b| b.is_ascii_whitespace()) {
            self.buffer.clear();
            return None;
        }

        let rest = self.buffer.split().freeze();
        Some(std::str::from_utf8(&rest).map(str::to_string))
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
