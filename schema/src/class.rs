//! Server classes and flattened send tables.

use std::fmt;
use std::sync::Arc;

use crate::prop::{PropDef, PropId};

/// Maximum number of properties a flattened table can hold.
///
/// Field indices on the wire are bounded by this value.
pub const MAX_PROPS_PER_TABLE: usize = 4096;

/// Index of a server class, as written in entity-enter records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(u16);

impl ClassId {
    #[must_use]
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Class categories that downstream consumers dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    World,
    Player,
    Other,
}

impl ClassKind {
    /// Resolves the kind from a server class name.
    #[must_use]
    pub fn from_class_name(name: &str) -> Self {
        match name {
            "CWorld" => Self::World,
            "CTFPlayer" => Self::Player,
            _ => Self::Other,
        }
    }
}

/// A server class known to the replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerClass {
    pub id: ClassId,
    pub name: String,
    /// Name of the class's flattened send table.
    pub table_name: String,
    pub kind: ClassKind,
}

/// Ordered, flattened property list for one class.
///
/// The position of a property is its field index on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct SendTable {
    pub name: String,
    props: Vec<Arc<PropDef>>,
}

impl SendTable {
    pub(crate) fn new(name: String, props: Vec<Arc<PropDef>>) -> Self {
        Self { name, props }
    }

    /// Returns the property at a field index.
    #[must_use]
    pub fn prop(&self, index: usize) -> Option<&Arc<PropDef>> {
        self.props.get(index)
    }

    /// Returns the field index of a property.
    #[must_use]
    pub fn position(&self, id: PropId) -> Option<usize> {
        self.props.iter().position(|prop| prop.id == id)
    }

    /// Finds a property by declaring table and name.
    #[must_use]
    pub fn find(&self, owner_table: &str, name: &str) -> Option<&Arc<PropDef>> {
        self.props.iter().find(|prop| prop.is(owner_table, name))
    }

    #[must_use]
    pub fn props(&self) -> &[Arc<PropDef>] {
        &self.props
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }
}
