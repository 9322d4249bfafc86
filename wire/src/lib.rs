//! Demo file framing for demodec.
//!
//! This crate handles the outer structure of a replay file: the fixed demo
//! header and the flat sequence of typed, length-prefixed messages that
//! follows it. It does not look inside message payloads.
//!
//! # Design Principles
//!
//! - **Bounded decoding** - All length fields are validated against limits before use.
//! - **Zero copy** - Payloads are handed out as bounded views over the input.
//! - **No domain knowledge** - This crate handles framing, not entity state.

mod error;
mod header;
mod limits;
mod message;

pub use error::{DecodeError, EncodeError, LimitKind, WireResult};
pub use header::{decode_header, encode_header, DemoHeader, HEADER_SIZE, MAGIC, PATH_LEN};
pub use limits::Limits;
pub use message::{
    decode_demo, CommandInfo, DemoMessage, MessageKind, MessageReader, ViewSplit,
};
