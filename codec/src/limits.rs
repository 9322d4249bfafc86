//! Limits and protocol widths for entity decoding.

/// Codec-specific limits enforced while decoding packet entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecLimits {
    /// Number of entity slots; record indices must be below this.
    pub max_entities: usize,
    /// Field indices must be below this.
    pub max_field_index: usize,
    /// Width of an entity index in the removal list.
    pub entity_index_bits: u8,
    /// Width of an entity serial number in enter records.
    pub serial_bits: u8,
    /// Maximum byte length of a decoded string property.
    pub max_string_bytes: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_entities: 2048,
            max_field_index: 4096,
            entity_index_bits: 11,
            serial_bits: 10,
            max_string_bytes: 512,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_entities: 64,
            max_field_index: 4096,
            entity_index_bits: 11,
            serial_bits: 10,
            max_string_bytes: 64,
        }
    }

    /// Creates limits without size caps (use with caution).
    ///
    /// Protocol widths keep their default values, so entity indices are
    /// still bounded by what `entity_index_bits` can address (2048).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_entities: usize::MAX,
            max_field_index: usize::MAX,
            entity_index_bits: 11,
            serial_bits: 10,
            max_string_bytes: usize::MAX,
        }
    }

    /// Exclusive upper bound for entity indices, combining the slot limit with
    /// what an index of `entity_index_bits` can address.
    #[must_use]
    pub fn entity_index_bound(&self) -> usize {
        let addressable = 1usize << self.entity_index_bits.min(16);
        self.max_entities.min(addressable)
    }
}
