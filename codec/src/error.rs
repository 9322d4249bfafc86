//! Error types for codec operations.

use std::fmt;

use bitstream::BitError;
use schema::ClassId;

use crate::pvs::PvsTransition;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while decoding or encoding entity state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The cursor ran out of bits.
    Truncated(BitError),

    /// Demo framing error.
    Wire(wire::DecodeError),

    /// A server class has no flattened send table.
    ///
    /// `ClassRegistry` rejects such classes when the schema is built, so a
    /// decode against a registry from `RegistryBuilder::build` never hits this.
    UnknownSchema { class: ClassId, table: String },

    /// An enter record names a class id that is not registered.
    UnknownServerClass { class_id: u64 },

    /// A record refers to an entity that is not in the registry.
    UnknownEntity {
        index: u16,
        transition: PvsTransition,
    },

    /// A field index is not below the field index limit.
    FieldIndexOutOfBounds { index: usize, max: usize },

    /// A field index is past the end of the entity's flattened table.
    UnknownProperty { index: usize, prop_count: usize },

    /// An entity index is not below the entity limit.
    InvalidEntityIndex { index: usize, max: usize },

    /// A string property is longer than allowed.
    StringTooLong { len: usize, max: usize },

    /// Indices passed to an encoder are not strictly increasing.
    IndexOrder { previous: usize, current: usize },

    /// A value does not match its property kind.
    ValueMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated(e) => write!(f, "bitstream error: {e}"),
            Self::Wire(e) => write!(f, "wire error: {e}"),
            Self::UnknownSchema { class, table } => {
                write!(f, "class {class} has no send table {table}")
            }
            Self::UnknownServerClass { class_id } => {
                write!(f, "unknown server class {class_id}")
            }
            Self::UnknownEntity { index, transition } => {
                write!(f, "{transition} for unknown entity {index}")
            }
            Self::FieldIndexOutOfBounds { index, max } => {
                write!(f, "field index {index} out of bounds (max {max})")
            }
            Self::UnknownProperty { index, prop_count } => {
                write!(f, "field index {index} past end of table with {prop_count} properties")
            }
            Self::InvalidEntityIndex { index, max } => {
                write!(f, "entity index {index} out of bounds (max {max})")
            }
            Self::StringTooLong { len, max } => {
                write!(f, "string of {len} bytes exceeds {max}")
            }
            Self::IndexOrder { previous, current } => {
                write!(f, "index order invalid: {previous} then {current}")
            }
            Self::ValueMismatch { expected, found } => {
                write!(f, "expected {expected} value, found {found}")
            }
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Truncated(e) => Some(e),
            Self::Wire(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BitError> for CodecError {
    fn from(err: BitError) -> Self {
        Self::Truncated(err)
    }
}

impl From<wire::DecodeError> for CodecError {
    fn from(err: wire::DecodeError) -> Self {
        Self::Wire(err)
    }
}
