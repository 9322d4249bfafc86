//! Selector-prefixed variable-width integers.
//!
//! A 2-bit selector picks the width of the value that follows:
//!
//! | selector | value bits |
//! |----------|------------|
//! | `00`     | 4          |
//! | `01`     | 8          |
//! | `10`     | 12         |
//! | `11`     | 32         |

use bitstream::{BitReader, BitResult, BitWriter};

const WIDTHS: [u8; 4] = [4, 8, 12, 32];

/// Reads a selector-prefixed unsigned integer.
pub fn read_ubit_var(reader: &mut BitReader<'_>) -> BitResult<u32> {
    let selector = reader.read_bits(2)? as usize;
    Ok(reader.read_bits(WIDTHS[selector])? as u32)
}

/// Writes `value` using the narrowest width that holds it.
pub fn write_ubit_var(writer: &mut BitWriter, value: u32) -> BitResult<()> {
    let selector = WIDTHS
        .iter()
        .position(|bits| *bits == 32 || value < (1u32 << bits))
        .unwrap_or(3);
    writer.write_bits(selector as u64, 2)?;
    writer.write_bits(u64::from(value), WIDTHS[selector])
}

/// Total bits used to encode `value`.
#[must_use]
pub fn ubit_var_len(value: u32) -> usize {
    match value {
        0..=0xF => 6,
        0x10..=0xFF => 10,
        0x100..=0xFFF => 14,
        _ => 34,
    }
}
