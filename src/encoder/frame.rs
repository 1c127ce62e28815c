//! Frame buffer
//!
//! Accumulates raw transport bytes until an even number of them is present.
//! The encoder sends between one and three 2-byte payloads per report, so a
//! frame group is handed out as soon as the cursor lands on a payload
//! boundary.

use crate::encoder::constants::{FRAME_BUFFER_CAPACITY, PAYLOAD_LEN};

/// Bytes accumulated since the last reset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameGroup {
    data: [u8; FRAME_BUFFER_CAPACITY],
    len: usize,
}

impl FrameGroup {
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Bounded byte accumulator fed one byte at a time by the transport
#[derive(Debug, Default)]
pub struct FrameBuffer {
    data: [u8; FRAME_BUFFER_CAPACITY],
    cursor: usize,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one byte. Once the buffer is full further bytes are dropped.
    ///
    /// Returns the accumulated group whenever the cursor is non-zero and
    /// even. The caller is expected to [`clear`](Self::clear) the buffer
    /// after consuming it.
    pub fn push(&mut self, byte: u8) -> Option<FrameGroup> {
        if self.cursor < FRAME_BUFFER_CAPACITY {
            self.data[self.cursor] = byte;
            self.cursor += 1;
        }

        if self.cursor != 0 && self.cursor % PAYLOAD_LEN == 0 {
            Some(FrameGroup {
                data: self.data,
                len: self.cursor,
            })
        } else {
            None
        }
    }

    /// Reset the write cursor
    pub fn clear(&mut self) {
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }
}
