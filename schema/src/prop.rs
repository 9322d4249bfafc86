//! Send property definitions.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Interned property key, unique per (owner table, name) within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropId(u32);

impl PropId {
    /// Creates a property id from its raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PropId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a float property is packed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FloatEncoding {
    /// Raw IEEE-754 single precision.
    NoScale,
    /// Variable-width world coordinate.
    Coord,
    /// `bits`-wide fraction of the `[low, high]` range.
    Quantized,
}

/// Float packing parameters, shared by scalar and vector properties.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FloatSpec {
    pub bits: u8,
    pub low: f32,
    pub high: f32,
    pub encoding: FloatEncoding,
}

impl FloatSpec {
    /// Raw 32-bit float.
    #[must_use]
    pub const fn no_scale() -> Self {
        Self {
            bits: 32,
            low: 0.0,
            high: 0.0,
            encoding: FloatEncoding::NoScale,
        }
    }

    /// Bit-coord float.
    #[must_use]
    pub const fn coord() -> Self {
        Self {
            bits: 0,
            low: 0.0,
            high: 0.0,
            encoding: FloatEncoding::Coord,
        }
    }

    /// Quantized float over `[low, high]`.
    #[must_use]
    pub const fn quantized(bits: u8, low: f32, high: f32) -> Self {
        Self {
            bits,
            low,
            high,
            encoding: FloatEncoding::Quantized,
        }
    }
}

/// Value type and packing of a property.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum PropKind {
    /// Fixed-width integer, sign-extended unless `unsigned`.
    Int { bits: u8, unsigned: bool },
    Float(FloatSpec),
    /// Three floats packed with the same parameters.
    Vector(FloatSpec),
    /// Two floats packed with the same parameters.
    VectorXY(FloatSpec),
    /// Length-prefixed byte string.
    String,
}

impl PropKind {
    /// Creates an integer property kind.
    #[must_use]
    pub const fn int(bits: u8, unsigned: bool) -> Self {
        Self::Int { bits, unsigned }
    }

    /// Returns the bit width that must be validated, if any.
    pub(crate) const fn checked_bits(&self) -> Option<(u8, u8)> {
        match self {
            Self::Int { bits, .. } => Some((*bits, 64)),
            Self::Float(spec) | Self::Vector(spec) | Self::VectorXY(spec) => match spec.encoding {
                FloatEncoding::Quantized => Some((spec.bits, 32)),
                FloatEncoding::NoScale | FloatEncoding::Coord => None,
            },
            Self::String => None,
        }
    }
}

/// A property definition within a flattened send table.
#[derive(Debug, Clone, PartialEq)]
pub struct PropDef {
    pub id: PropId,
    /// Table that declared the property (may be a base table of the class).
    pub owner_table: String,
    pub name: String,
    pub kind: PropKind,
    /// Raw engine flags, kept for inspection.
    pub flags: u32,
}

impl PropDef {
    /// Returns `true` if this definition is `owner_table.name`.
    #[must_use]
    pub fn is(&self, owner_table: &str, name: &str) -> bool {
        self.name == name && self.owner_table == owner_table
    }
}

impl fmt::Display for PropDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner_table, self.name)
    }
}

/// Property declaration used to build a registry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropSpec {
    /// Declaring table; defaults to the table being built.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub owner: Option<String>,
    pub name: String,
    pub kind: PropKind,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: u32,
}

impl PropSpec {
    /// Declares a property owned by the table it is added to.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PropKind) -> Self {
        Self {
            owner: None,
            name: name.into(),
            kind,
            flags: 0,
        }
    }

    /// Declares a property inherited from `owner`.
    #[must_use]
    pub fn inherited(owner: impl Into<String>, name: impl Into<String>, kind: PropKind) -> Self {
        Self {
            owner: Some(owner.into()),
            name: name.into(),
            kind,
            flags: 0,
        }
    }

    /// Sets the raw flags.
    #[must_use]
    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }
}
