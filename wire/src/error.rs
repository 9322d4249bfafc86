//! Error types for demo framing operations.

use std::fmt;

use bitstream::BitError;

/// Result type for demo framing operations.
pub type WireResult<T> = Result<T, DecodeError>;

/// Decode errors for the demo header and message framing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The stream ended in the middle of a header or message.
    Truncated(BitError),

    /// Invalid magic in the demo header.
    InvalidMagic { found: [u8; 8] },

    /// Unknown message type byte.
    UnknownMessageType {
        /// The raw type byte.
        kind: u8,
        /// Byte offset of the message in the stream.
        offset: usize,
    },

    /// Message length prefix is negative.
    NegativeLength { length: i32 },

    /// Limits exceeded.
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },
}

/// Specific framing limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    MessageBytes,
    MessageCount,
}

/// Errors that can occur while encoding a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A fixed-width string field does not fit.
    StringTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated(e) => write!(f, "demo stream truncated: {e}"),
            Self::InvalidMagic { found } => {
                write!(f, "invalid demo magic: {}", String::from_utf8_lossy(found))
            }
            Self::UnknownMessageType { kind, offset } => {
                write!(f, "unknown message type {kind} at byte {offset}")
            }
            Self::NegativeLength { length } => {
                write!(f, "negative message length {length}")
            }
            Self::LimitsExceeded {
                kind,
                limit,
                actual,
            } => {
                write!(f, "{kind} limit exceeded: {actual} > {limit}")
            }
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MessageBytes => "message bytes",
            Self::MessageCount => "message count",
        };
        write!(f, "{name}")
    }
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StringTooLong { field, len, max } => {
                write!(f, "{field} is {len} bytes, maximum is {max}")
            }
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Truncated(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for EncodeError {}

impl From<BitError> for DecodeError {
    fn from(err: BitError) -> Self {
        Self::Truncated(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_magic() {
        let err = DecodeError::InvalidMagic {
            found: *b"NOTADEMO",
        };
        assert!(err.to_string().contains("NOTADEMO"));
    }

    #[test]
    fn error_display_unknown_message_type() {
        let err = DecodeError::UnknownMessageType {
            kind: 42,
            offset: 1072,
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("1072"));
    }

    #[test]
    fn error_display_limits() {
        let err = DecodeError::LimitsExceeded {
            kind: LimitKind::MessageBytes,
            limit: 10,
            actual: 20,
        };
        let msg = err.to_string();
        assert!(msg.contains("message bytes"));
        assert!(msg.contains("20 > 10"));
    }

    #[test]
    fn error_from_bit_error_has_source() {
        let err: DecodeError = BitError::UnexpectedEof {
            requested: 8,
            available: 0,
        }
        .into();
        assert!(matches!(err, DecodeError::Truncated(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn encode_error_display() {
        let err = EncodeError::StringTooLong {
            field: "map",
            len: 300,
            max: 259,
        };
        assert!(err.to_string().contains("map is 300 bytes"));
    }
}
