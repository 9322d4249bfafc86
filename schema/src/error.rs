//! Schema validation errors.

use std::fmt;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur when building or validating a class registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Two server classes share a name.
    DuplicateClass { name: String },

    /// Two send tables share a name.
    DuplicateTable { name: String },

    /// A server class refers to a send table that was never defined.
    UnknownTable { class: String, table: String },

    /// The same property appears twice in one flattened table.
    DuplicateProp {
        table: String,
        owner: String,
        name: String,
    },

    /// The same property key was declared with two different kinds.
    ConflictingProp { owner: String, name: String },

    /// A flattened table has more properties than a field index can address.
    TooManyProps {
        table: String,
        count: usize,
        max: usize,
    },

    /// Invalid bit width for an integer or quantized float property.
    InvalidBitWidth {
        owner: String,
        name: String,
        bits: u8,
    },

    /// Too many classes to fit a 16-bit class id.
    TooManyClasses { count: usize },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateClass { name } => write!(f, "duplicate server class {name}"),
            Self::DuplicateTable { name } => write!(f, "duplicate send table {name}"),
            Self::UnknownTable { class, table } => {
                write!(f, "class {class} refers to unknown table {table}")
            }
            Self::DuplicateProp { table, owner, name } => {
                write!(f, "table {table} lists {owner}.{name} twice")
            }
            Self::ConflictingProp { owner, name } => {
                write!(f, "property {owner}.{name} declared with conflicting kinds")
            }
            Self::TooManyProps { table, count, max } => {
                write!(f, "table {table} has {count} properties, maximum is {max}")
            }
            Self::InvalidBitWidth { owner, name, bits } => {
                write!(f, "property {owner}.{name} has invalid bit width {bits}")
            }
            Self::TooManyClasses { count } => write!(f, "{count} server classes do not fit a class id"),
        }
    }
}

impl std::error::Error for SchemaError {}
