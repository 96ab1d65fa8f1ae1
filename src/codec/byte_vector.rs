//! Append-only byte buffer backing the encoder output.

use std::io;
use std::ops::Range;

/// Growable byte buffer that only ever appends.
///
/// Bytes written are never overwritten or removed; [`ByteVector::data`] hands out
/// a read-only view of everything written so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteVector {
    data: Vec<u8>,
}

impl ByteVector {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
        }
    }

    /// Append a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) {
        self.data.push(byte);
    }

    /// Append a contiguous slice.
    #[inline]
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Append `bytes[range]`.
    ///
    /// # Panics
    /// Panics if `range` is out of bounds for `bytes`.
    pub fn write_bytes_range(&mut self, bytes: &[u8], range: Range<usize>) {
        self.data.extend_from_slice(&bytes[range]);
    }

    /// Append a 16-bit value, least significant byte first.
    #[inline]
    pub fn write_le_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Append the low byte of each character in `text`.
    ///
    /// ASCII text is written verbatim. Characters outside Latin-1 are truncated
    /// to their low 8 bits.
    pub fn write_text(&mut self, text: &str) {
        self.data.extend(text.chars().map(|c| (u32::from(c) & 0xFF) as u8));
    }

    /// Everything written so far.
    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Number of bytes written.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if nothing has been written.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the buffer, returning the written bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl io::Write for ByteVector {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
