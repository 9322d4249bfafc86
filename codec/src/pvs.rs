//! Visibility transitions of entity records.

use std::fmt;

use bitstream::{BitReader, BitResult, BitWriter};

/// How an entity record changes the entity's visibility.
///
/// Encoded as two bits, `hi` then `low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PvsTransition {
    /// `00`: the entity stays visible and receives a diff.
    Preserve,
    /// `01`: the entity becomes visible, created if needed.
    Enter,
    /// `10`: the entity leaves but stays registered.
    Leave,
    /// `11`: the entity leaves and is removed.
    LeaveAndDelete,
}

impl PvsTransition {
    #[must_use]
    pub const fn from_bits(hi: bool, low: bool) -> Self {
        match (hi, low) {
            (false, false) => Self::Preserve,
            (false, true) => Self::Enter,
            (true, false) => Self::Leave,
            (true, true) => Self::LeaveAndDelete,
        }
    }

    /// Returns `(hi, low)`.
    #[must_use]
    pub const fn to_bits(self) -> (bool, bool) {
        match self {
            Self::Preserve => (false, false),
            Self::Enter => (false, true),
            Self::Leave => (true, false),
            Self::LeaveAndDelete => (true, true),
        }
    }

    #[must_use]
    pub const fn is_leave(self) -> bool {
        matches!(self, Self::Leave | Self::LeaveAndDelete)
    }
}

impl fmt::Display for PvsTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Preserve => "preserve",
            Self::Enter => "enter",
            Self::Leave => "leave",
            Self::LeaveAndDelete => "leave and delete",
        };
        write!(f, "{name}")
    }
}

/// Reads a transition, consuming exactly two bits.
pub fn read_pvs(reader: &mut BitReader<'_>) -> BitResult<PvsTransition> {
    let hi = reader.read_bit()?;
    let low = reader.read_bit()?;
    Ok(PvsTransition::from_bits(hi, low))
}

pub fn write_pvs(writer: &mut BitWriter, transition: PvsTransition) {
    let (hi, low) = transition.to_bits();
    writer.write_bit(hi);
    writer.write_bit(low);
}
