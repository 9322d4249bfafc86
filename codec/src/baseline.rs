//! Instance and static baselines.
//!
//! Instance baselines are kept in two slots. A packet names the slot it was
//! encoded against; when it also refreshes the baseline, entering entities
//! are recorded into the other slot, which first inherits the active one.

use std::collections::HashMap;
use std::sync::Arc;

use bitstream::{BitReader, BitResult};
use schema::ClassId;

use crate::entity::Property;

/// One of the two instance baseline slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BaselineSlot {
    #[default]
    Zero,
    One,
}

impl BaselineSlot {
    #[must_use]
    pub const fn from_bit(bit: bool) -> Self {
        if bit {
            Self::One
        } else {
            Self::Zero
        }
    }

    #[must_use]
    pub const fn to_bit(self) -> bool {
        matches!(self, Self::One)
    }

    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Zero => Self::One,
            Self::One => Self::Zero,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }
}

#[derive(Debug, Clone)]
struct StaticBaseline {
    bytes: Vec<u8>,
    bits: usize,
}

/// Per-replay baseline storage.
#[derive(Debug, Clone, Default)]
pub struct BaselineStore {
    instance: [HashMap<u16, Arc<[Property]>>; 2],
    statics: HashMap<ClassId, StaticBaseline>,
}

impl BaselineStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance baseline of an entity in a slot.
    #[must_use]
    pub fn instance_baseline(&self, slot: BaselineSlot, index: u16) -> Option<&[Property]> {
        self.instance[slot.index()].get(&index).map(|props| &**props)
    }

    pub fn set_instance_baseline(
        &mut self,
        slot: BaselineSlot,
        index: u16,
        props: impl Into<Arc<[Property]>>,
    ) {
        self.instance[slot.index()].insert(index, props.into());
    }

    /// Number of entities with an instance baseline in a slot.
    #[must_use]
    pub fn instance_len(&self, slot: BaselineSlot) -> usize {
        self.instance[slot.index()].len()
    }

    /// Exchanges the contents of the two slots.
    pub fn swap_baselines(&mut self) {
        self.instance.swap(0, 1);
    }

    /// Replaces the other slot with the contents of `from`.
    ///
    /// Snapshots are shared, not copied.
    pub fn carry_forward(&mut self, from: BaselineSlot) {
        let source = self.instance[from.index()].clone();
        self.instance[from.other().index()] = source;
    }

    /// Stores the raw static baseline of a class.
    ///
    /// Fails if `bits` exceeds the supplied bytes.
    pub fn set_static_baseline(
        &mut self,
        class: ClassId,
        bytes: Vec<u8>,
        bits: usize,
    ) -> BitResult<()> {
        BitReader::with_bit_len(&bytes, bits)?;
        self.statics.insert(class, StaticBaseline { bytes, bits });
        Ok(())
    }

    /// Returns a fresh cursor over a class's static baseline.
    ///
    /// The stored bits are never consumed; every call starts at position zero.
    #[must_use]
    pub fn static_baseline(&self, class: ClassId) -> Option<BitReader<'_>> {
        let baseline = self.statics.get(&class)?;
        BitReader::with_bit_len(&baseline.bytes, baseline.bits).ok()
    }

    #[must_use]
    pub fn has_static_baseline(&self, class: ClassId) -> bool {
        self.statics.contains_key(&class)
    }

    /// Drops all instance and static baselines.
    pub fn clear(&mut self) {
        for slot in &mut self.instance {
            slot.clear();
        }
        self.statics.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Value;
    use schema::{ClassRegistry, PropKind, PropSpec, TableSpec};

    fn props(values: &[i64]) -> Vec<Property> {
        let registry = ClassRegistry::builder()
            .table(TableSpec::new("DT_A").prop(PropSpec::new("a", PropKind::int(8, true))))
            .build()
            .unwrap();
        let def = Arc::clone(registry.table("DT_A").unwrap().prop(0).unwrap());
        values
            .iter()
            .map(|v| Property::new(Arc::clone(&def), Value::Int(*v)))
            .collect()
    }

    #[test]
    fn slot_helpers() {
        assert_eq!(BaselineSlot::from_bit(false), BaselineSlot::Zero);
        assert_eq!(BaselineSlot::from_bit(true), BaselineSlot::One);
        assert_eq!(BaselineSlot::Zero.other(), BaselineSlot::One);
        assert!(BaselineSlot::One.to_bit());
    }

    #[test]
    fn swap_is_pure_exchange() {
        let mut store = BaselineStore::new();
        store.set_instance_baseline(BaselineSlot::Zero, 1, props(&[10]));
        store.set_instance_baseline(BaselineSlot::Zero, 2, props(&[20]));
        store.set_instance_baseline(BaselineSlot::One, 3, props(&[30]));

        store.swap_baselines();

        assert_eq!(store.instance_len(BaselineSlot::Zero), 1);
        assert_eq!(store.instance_len(BaselineSlot::One), 2);
        assert_eq!(
            store.instance_baseline(BaselineSlot::Zero, 3).unwrap()[0].value,
            Value::Int(30)
        );
        assert_eq!(
            store.instance_baseline(BaselineSlot::One, 2).unwrap()[0].value,
            Value::Int(20)
        );
        assert!(store.instance_baseline(BaselineSlot::Zero, 1).is_none());

        store.swap_baselines();
        assert_eq!(store.instance_len(BaselineSlot::Zero), 2);
    }

    #[test]
    fn carry_forward_shares_snapshots() {
        let mut store = BaselineStore::new();
        store.set_instance_baseline(BaselineSlot::One, 5, props(&[1, 2]));
        store.set_instance_baseline(BaselineSlot::Zero, 9, props(&[3]));

        store.carry_forward(BaselineSlot::One);

        assert_eq!(store.instance_len(BaselineSlot::Zero), 1);
        assert!(store.instance_baseline(BaselineSlot::Zero, 9).is_none());
        let a = store.instance_baseline(BaselineSlot::Zero, 5).unwrap();
        let b = store.instance_baseline(BaselineSlot::One, 5).unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn static_baseline_reads_from_start_each_time() {
        let mut store = BaselineStore::new();
        store
            .set_static_baseline(ClassId::new(2), vec![0b1011], 4)
            .unwrap();

        for _ in 0..2 {
            let mut reader = store.static_baseline(ClassId::new(2)).unwrap();
            assert_eq!(reader.read_bits(4).unwrap(), 0b1011);
            assert!(reader.is_empty());
        }
        assert!(store.static_baseline(ClassId::new(3)).is_none());
    }

    #[test]
    fn static_baseline_rejects_overlong_bits() {
        let mut store = BaselineStore::new();
        assert!(store.set_static_baseline(ClassId::new(0), vec![0], 9).is_err());
        assert!(!store.has_static_baseline(ClassId::new(0)));
    }

    #[test]
    fn clear_drops_everything() {
        let mut store = BaselineStore::new();
        store.set_instance_baseline(BaselineSlot::One, 1, props(&[1]));
        store.set_static_baseline(ClassId::new(0), vec![0], 8).unwrap();
        store.clear();
        assert_eq!(store.instance_len(BaselineSlot::One), 0);
        assert!(!store.has_static_baseline(ClassId::new(0)));
    }
}
