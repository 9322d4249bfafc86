//! Server class and send table definitions for demodec.
//!
//! This crate describes how entity state is laid out on the wire:
//! - Server classes, each tagged with a closed `ClassKind`
//! - Flattened send tables whose order defines field indices
//! - Property definitions and their packing (`PropKind`)
//! - Deterministic schema hashing
//!
//! # Design Principles
//!
//! - **Pre-flattened input** - Tables arrive flattened; data table parsing is out of scope.
//! - **Interned keys** - Properties are identified by `PropId`, not by joined name strings.
//! - **Deterministic hashing** - Schema hash is stable given the same definition.

mod class;
#[cfg(feature = "serde")]
mod doc;
mod error;
mod hash;
mod prop;
mod registry;

pub use class::{ClassId, ClassKind, SendTable, ServerClass, MAX_PROPS_PER_TABLE};
#[cfg(feature = "serde")]
pub use doc::{ClassDoc, SchemaDoc};
pub use error::{SchemaError, SchemaResult};
pub use hash::schema_hash;
pub use prop::{FloatEncoding, FloatSpec, PropDef, PropId, PropKind, PropSpec};
pub use registry::{ClassRegistry, RegistryBuilder, TableSpec};
