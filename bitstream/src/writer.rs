//! Bit-level writer for encoding packed binary data.

use crate::error::{BitError, BitResult};

/// A bit-level writer producing the same bit order [`BitReader`](crate::BitReader) consumes.
///
/// Writes are accumulated in an internal buffer. Call [`finish`](Self::finish)
/// to get the final byte buffer.
#[derive(Debug, Default)]
pub struct BitWriter {
    /// The accumulated bytes; the last one may be partially filled.
    bytes: Vec<u8>,
    /// Total number of bits written.
    bit_len: usize,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `BitWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            bit_len: 0,
        }
    }

    /// Returns the number of bits written so far.
    #[must_use]
    pub const fn bits_written(&self) -> usize {
        self.bit_len
    }

    /// Writes a single bit.
    pub fn write_bit(&mut self, value: bool) {
        let shift = self.bit_len % 8;
        if shift == 0 {
            self.bytes.push(0);
        }
        if value {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 1 << shift;
            }
        }
        self.bit_len += 1;
    }

    /// Writes up to 64 bits from an unsigned integer, least significant bit first.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    pub fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 64,
            });
        }
        if bits < 64 && value >= (1u64 << bits) {
            return Err(BitError::ValueOutOfRange {
                value,
                bits: bits as usize,
            });
        }

        for shift in 0..bits {
            self.write_bit((value >> shift) & 1 == 1);
        }
        Ok(())
    }

    /// Writes a byte.
    pub fn write_u8(&mut self, value: u8) {
        for shift in 0..8 {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    /// Writes an unsigned 32-bit integer.
    pub fn write_u32(&mut self, value: u32) {
        for shift in 0..32 {
            self.write_bit((value >> shift) & 1 == 1);
        }
    }

    /// Writes a signed 32-bit integer.
    pub fn write_i32(&mut self, value: i32) {
        self.write_u32(value as u32);
    }

    /// Writes an IEEE-754 single precision float.
    pub fn write_f32(&mut self, value: f32) {
        self.write_u32(value.to_bits());
    }

    /// Writes raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.write_u8(*byte);
        }
    }

    /// Finishes writing and returns the byte buffer.
    ///
    /// Unused high bits of the last byte are zero.
    #[must_use]
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }

    /// Finishes writing and returns the byte buffer with the exact bit length.
    #[must_use]
    pub fn finish_with_len(self) -> (Vec<u8>, usize) {
        (self.bytes, self.bit_len)
    }
}
