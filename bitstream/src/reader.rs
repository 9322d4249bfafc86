//! Bit-level reader with bounded operations.

use crate::error::{BitError, BitResult};

/// A bit-level reader over a bounded view of a byte slice.
///
/// Bits are consumed least-significant first within each byte, and multi-bit
/// values are assembled least-significant bit first. Byte-aligned 32-bit reads
/// are therefore little-endian.
///
/// All positions are relative to the start of the view. All read operations are
/// bounds-checked against the end of the view and return errors on failure.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    start: usize,
    end: usize,
    pos: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` over an entire byte slice.
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            start: 0,
            end: data.len() * 8,
            pos: 0,
        }
    }

    /// Creates a reader over the first `bits` bits of `data`.
    pub fn with_bit_len(data: &'a [u8], bits: usize) -> BitResult<Self> {
        let available = data.len().saturating_mul(8);
        if bits > available {
            return Err(BitError::UnexpectedEof {
                requested: bits,
                available,
            });
        }
        Ok(Self {
            data,
            start: 0,
            end: bits,
            pos: 0,
        })
    }

    /// Returns the length of the view in bits.
    #[must_use]
    pub const fn bit_len(&self) -> usize {
        self.end - self.start
    }

    /// Returns the number of bits remaining to read.
    #[must_use]
    pub const fn bits_remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Returns `true` if there are no more bits to read.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bits_remaining() == 0
    }

    /// Returns the current bit position.
    #[must_use]
    pub const fn bit_position(&self) -> usize {
        self.pos - self.start
    }

    /// Moves the cursor to `position` bits from the start of the view.
    ///
    /// Seeking to exactly the end of the view is allowed.
    pub fn set_position(&mut self, position: usize) -> BitResult<()> {
        if position > self.bit_len() {
            return Err(BitError::SeekOutOfRange {
                position,
                len: self.bit_len(),
            });
        }
        self.pos = self.start + position;
        Ok(())
    }

    /// Advances the cursor by `bits` without reading them.
    pub fn skip_bits(&mut self, bits: usize) -> BitResult<()> {
        self.ensure_bits(bits)?;
        self.pos += bits;
        Ok(())
    }

    /// Splits off a view of the next `bits` bits and advances past them.
    ///
    /// The returned reader starts at position zero and cannot read beyond
    /// the split point.
    pub fn sub_reader(&mut self, bits: usize) -> BitResult<BitReader<'a>> {
        self.ensure_bits(bits)?;
        let view = BitReader {
            data: self.data,
            start: self.pos,
            end: self.pos + bits,
            pos: self.pos,
        };
        self.pos += bits;
        Ok(view)
    }

    /// Reads a single bit as a boolean.
    pub fn read_bit(&mut self) -> BitResult<bool> {
        self.ensure_bits(1)?;
        let byte = self.data[self.pos / 8];
        let bit = (byte >> (self.pos % 8)) & 1;
        self.pos += 1;
        Ok(bit == 1)
    }

    /// Reads up to 64 bits as an unsigned integer.
    pub fn read_bits(&mut self, bits: u8) -> BitResult<u64> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount {
                bits: bits as usize,
                max_bits: 64,
            });
        }
        if bits == 0 {
            return Ok(0);
        }
        self.ensure_bits(bits as usize)?;

        let mut value = 0u64;
        for shift in 0..bits {
            value |= u64::from(self.read_bit()?) << shift;
        }
        Ok(value)
    }

    /// Reads a byte.
    pub fn read_u8(&mut self) -> BitResult<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    /// Reads an unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> BitResult<u32> {
        Ok(self.read_bits(32)? as u32)
    }

    /// Reads a signed 32-bit integer.
    pub fn read_i32(&mut self) -> BitResult<i32> {
        Ok(self.read_u32()? as i32)
    }

    /// Reads an IEEE-754 single precision float.
    pub fn read_f32(&mut self) -> BitResult<f32> {
        Ok(f32::from_bits(self.read_u32()?))
    }

    /// Reads `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> BitResult<Vec<u8>> {
        self.ensure_bits(len.saturating_mul(8))?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.read_u8()?);
        }
        Ok(out)
    }

    /// Reads a fixed-width, NUL-padded string of `len` bytes.
    ///
    /// All `len` bytes are consumed; the string ends at the first NUL.
    pub fn read_fixed_string(&mut self, len: usize) -> BitResult<String> {
        let bytes = self.read_bytes(len)?;
        let text = bytes.split(|b| *b == 0).next().unwrap_or_default();
        Ok(String::from_utf8_lossy(text).into_owned())
    }

    fn ensure_bits(&self, bits: usize) -> BitResult<()> {
        let available = self.bits_remaining();
        if bits > available {
            return Err(BitError::UnexpectedEof {
                requested: bits,
                available,
            });
        }
        Ok(())
    }
}
