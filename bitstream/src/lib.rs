//! Low-level bit cursor primitives for demo decoding.
//!
//! This crate provides [`BitReader`] and [`BitWriter`] for bit-level decoding and encoding
//! in the replay format's native bit order (least significant bit first).
//! It is designed for bounded, panic-free operation with explicit error handling.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded operations** - All reads are checked against the end of the current view.
//! - **Seekable views** - Positions can be saved and restored, and sub-ranges split off.
//! - **No domain knowledge** - This crate knows nothing about entities or messages.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitReader, BitWriter};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bit(true);
//! writer.write_bits(42, 7).unwrap();
//!
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bit().unwrap(), true);
//! assert_eq!(reader.read_bits(7).unwrap(), 42);
//! ```

mod error;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use reader::BitReader;
pub use writer::BitWriter;
