//! Class registry construction and validation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::class::{ClassId, ClassKind, SendTable, ServerClass, MAX_PROPS_PER_TABLE};
use crate::error::{SchemaError, SchemaResult};
use crate::prop::{PropDef, PropId, PropKind, PropSpec};

/// Input definition of one flattened send table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableSpec {
    pub name: String,
    pub props: Vec<PropSpec>,
}

impl TableSpec {
    /// Creates an empty table definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: Vec::new(),
        }
    }

    /// Appends a property; order defines field indices.
    #[must_use]
    pub fn prop(mut self, prop: PropSpec) -> Self {
        self.props.push(prop);
        self
    }
}

/// Server classes and their flattened send tables.
///
/// Class ids are dense and assigned in declaration order. Properties are
/// interned by (owner table, name), so an inherited property is the same
/// `Arc<PropDef>` in every table that flattens it.
#[derive(Debug, Clone)]
pub struct ClassRegistry {
    classes: Vec<Arc<ServerClass>>,
    class_index: HashMap<String, ClassId>,
    tables: Vec<Arc<SendTable>>,
    table_index: HashMap<String, usize>,
    class_bits: u8,
    prop_count: usize,
}

impl ClassRegistry {
    /// Creates a registry builder.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    #[must_use]
    pub fn class(&self, id: ClassId) -> Option<&Arc<ServerClass>> {
        self.classes.get(usize::from(id.get()))
    }

    #[must_use]
    pub fn class_by_name(&self, name: &str) -> Option<&Arc<ServerClass>> {
        self.class_index.get(name).and_then(|id| self.class(*id))
    }

    #[must_use]
    pub fn table(&self, name: &str) -> Option<&Arc<SendTable>> {
        self.table_index.get(name).map(|index| &self.tables[*index])
    }

    /// Returns the flattened table of a class.
    #[must_use]
    pub fn table_for(&self, class: &ServerClass) -> Option<&Arc<SendTable>> {
        self.table(&class.table_name)
    }

    /// Finds an interned property by declaring table and name in any table.
    #[must_use]
    pub fn find_prop(&self, owner_table: &str, name: &str) -> Option<&Arc<PropDef>> {
        self.tables
            .iter()
            .find_map(|table| table.find(owner_table, name))
    }

    /// Bit width of a class id on the wire: `ceil(log2(class_count))`.
    #[must_use]
    pub const fn class_bits(&self) -> u8 {
        self.class_bits
    }

    pub fn classes(&self) -> impl Iterator<Item = &Arc<ServerClass>> {
        self.classes.iter()
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<SendTable>> {
        self.tables.iter()
    }

    /// Number of distinct interned properties.
    #[must_use]
    pub const fn prop_count(&self) -> usize {
        self.prop_count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Builder for `ClassRegistry`.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    classes: Vec<(String, String)>,
    tables: Vec<TableSpec>,
}

impl RegistryBuilder {
    /// Declares a server class using `table` as its flattened table.
    #[must_use]
    pub fn class(mut self, name: impl Into<String>, table: impl Into<String>) -> Self {
        self.classes.push((name.into(), table.into()));
        self
    }

    /// Adds a flattened table.
    #[must_use]
    pub fn table(mut self, table: TableSpec) -> Self {
        self.tables.push(table);
        self
    }

    /// Validates and builds the registry.
    pub fn build(self) -> SchemaResult<ClassRegistry> {
        let mut interner = HashMap::<(String, String), Arc<PropDef>>::new();
        let mut tables = Vec::with_capacity(self.tables.len());
        let mut table_index = HashMap::with_capacity(self.tables.len());

        for spec in self.tables {
            if table_index.contains_key(&spec.name) {
                return Err(SchemaError::DuplicateTable { name: spec.name });
            }
            if spec.props.len() > MAX_PROPS_PER_TABLE {
                return Err(SchemaError::TooManyProps {
                    table: spec.name,
                    count: spec.props.len(),
                    max: MAX_PROPS_PER_TABLE,
                });
            }

            let mut props = Vec::with_capacity(spec.props.len());
            for prop in spec.props {
                let owner = prop.owner.clone().unwrap_or_else(|| spec.name.clone());
                validate_bits(&owner, &prop.name, &prop.kind)?;
                let def = intern(&mut interner, owner, prop)?;
                if props.iter().any(|existing: &Arc<PropDef>| existing.id == def.id) {
                    return Err(SchemaError::DuplicateProp {
                        table: spec.name,
                        owner: def.owner_table.clone(),
                        name: def.name.clone(),
                    });
                }
                props.push(def);
            }

            table_index.insert(spec.name.clone(), tables.len());
            tables.push(Arc::new(SendTable::new(spec.name, props)));
        }

        if self.classes.len() > usize::from(u16::MAX) + 1 {
            return Err(SchemaError::TooManyClasses {
                count: self.classes.len(),
            });
        }

        let mut classes = Vec::with_capacity(self.classes.len());
        let mut class_index = HashMap::with_capacity(self.classes.len());
        for (position, (name, table_name)) in self.classes.into_iter().enumerate() {
            if !table_index.contains_key(&table_name) {
                return Err(SchemaError::UnknownTable {
                    class: name,
                    table: table_name,
                });
            }
            if class_index.contains_key(&name) {
                return Err(SchemaError::DuplicateClass { name });
            }
            // Bounded by the TooManyClasses check above.
            let id = ClassId::new(position as u16);
            class_index.insert(name.clone(), id);
            classes.push(Arc::new(ServerClass {
                id,
                kind: ClassKind::from_class_name(&name),
                name,
                table_name,
            }));
        }

        Ok(ClassRegistry {
            class_bits: class_bits_for(classes.len()),
            classes,
            class_index,
            tables,
            table_index,
            prop_count: interner.len(),
        })
    }
}

fn intern(
    interner: &mut HashMap<(String, String), Arc<PropDef>>,
    owner: String,
    prop: PropSpec,
) -> SchemaResult<Arc<PropDef>> {
    let next_id = PropId::new(interner.len() as u32);
    let key = (owner, prop.name);
    if let Some(existing) = interner.get(&key) {
        if existing.kind != prop.kind {
            return Err(SchemaError::ConflictingProp {
                owner: key.0,
                name: key.1,
            });
        }
        return Ok(Arc::clone(existing));
    }

    let def = Arc::new(PropDef {
        id: next_id,
        owner_table: key.0.clone(),
        name: key.1.clone(),
        kind: prop.kind,
        flags: prop.flags,
    });
    interner.insert(key, Arc::clone(&def));
    Ok(def)
}

fn validate_bits(owner: &str, name: &str, kind: &PropKind) -> SchemaResult<()> {
    if let Some((bits, max)) = kind.checked_bits() {
        if bits == 0 || bits > max {
            return Err(SchemaError::InvalidBitWidth {
                owner: owner.to_string(),
                name: name.to_string(),
                bits,
            });
        }
    }
    Ok(())
}

/// Bits needed to index `count` classes.
pub(crate) const fn class_bits_for(count: usize) -> u8 {
    if count <= 1 {
        0
    } else {
        (usize::BITS - (count - 1).leading_zeros()) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prop::{FloatSpec, PropKind};

    fn sample() -> ClassRegistry {
        ClassRegistry::builder()
            .class("CWorld", "DT_WORLD")
            .class("CTFPlayer", "DT_TFPlayer")
            .class("CTFPlayerResource", "DT_TFPlayerResource")
            .table(
                TableSpec::new("DT_WORLD")
                    .prop(PropSpec::new("m_WorldMins", PropKind::Vector(FloatSpec::no_scale())))
                    .prop(PropSpec::new("m_WorldMaxs", PropKind::Vector(FloatSpec::no_scale()))),
            )
            .table(
                TableSpec::new("DT_TFPlayer")
                    .prop(PropSpec::inherited("DT_BasePlayer", "m_iHealth", PropKind::int(10, true)))
                    .prop(PropSpec::new("m_nPlayerCond", PropKind::int(20, true))),
            )
            .table(
                TableSpec::new("DT_TFPlayerResource")
                    .prop(PropSpec::inherited("DT_BasePlayer", "m_iHealth", PropKind::int(10, true))),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn class_bits_matches_ceil_log2() {
        assert_eq!(class_bits_for(0), 0);
        assert_eq!(class_bits_for(1), 0);
        assert_eq!(class_bits_for(2), 1);
        assert_eq!(class_bits_for(3), 2);
        assert_eq!(class_bits_for(4), 2);
        assert_eq!(class_bits_for(5), 3);
        assert_eq!(class_bits_for(348), 9);
    }

    #[test]
    fn registry_assigns_dense_ids_and_kinds() {
        let registry = sample();
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.class_bits(), 2);

        let world = registry.class(ClassId::new(0)).unwrap();
        assert_eq!(world.name, "CWorld");
        assert_eq!(world.kind, ClassKind::World);

        let player = registry.class_by_name("CTFPlayer").unwrap();
        assert_eq!(player.id, ClassId::new(1));
        assert_eq!(player.kind, ClassKind::Player);
        assert_eq!(registry.table_for(player).unwrap().len(), 2);

        assert_eq!(
            registry.class(ClassId::new(2)).unwrap().kind,
            ClassKind::Other
        );
        assert!(registry.class(ClassId::new(3)).is_none());
    }

    #[test]
    fn inherited_props_are_interned_once() {
        let registry = sample();
        let player = registry.table("DT_TFPlayer").unwrap();
        let resource = registry.table("DT_TFPlayerResource").unwrap();
        let a = player.find("DT_BasePlayer", "m_iHealth").unwrap();
        let b = resource.find("DT_BasePlayer", "m_iHealth").unwrap();
        assert!(Arc::ptr_eq(a, b));
        assert!(Arc::ptr_eq(a, registry.find_prop("DT_BasePlayer", "m_iHealth").unwrap()));
        assert!(registry.find_prop("DT_TFPlayer", "m_iHealth").is_none());
        assert_eq!(registry.prop_count(), 4);
    }

    #[test]
    fn rejects_unknown_table() {
        let err = ClassRegistry::builder()
            .class("CWorld", "DT_Missing")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTable { .. }));
    }

    #[test]
    fn rejects_duplicate_class_and_table() {
        let err = ClassRegistry::builder()
            .class("CWorld", "DT_WORLD")
            .class("CWorld", "DT_WORLD")
            .table(TableSpec::new("DT_WORLD"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateClass { .. }));

        let err = ClassRegistry::builder()
            .table(TableSpec::new("DT_WORLD"))
            .table(TableSpec::new("DT_WORLD"))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTable { .. }));
    }

    #[test]
    fn rejects_duplicate_prop_in_table() {
        let err = ClassRegistry::builder()
            .table(
                TableSpec::new("DT_A")
                    .prop(PropSpec::new("x", PropKind::int(4, true)))
                    .prop(PropSpec::new("x", PropKind::int(4, true))),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateProp { .. }));
    }

    #[test]
    fn rejects_conflicting_kinds() {
        let err = ClassRegistry::builder()
            .table(TableSpec::new("DT_A").prop(PropSpec::inherited("DT_Base", "x", PropKind::int(4, true))))
            .table(TableSpec::new("DT_B").prop(PropSpec::inherited("DT_Base", "x", PropKind::int(5, true))))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::ConflictingProp { .. }));
    }

    #[test]
    fn rejects_bad_bit_widths() {
        for kind in [
            PropKind::int(0, false),
            PropKind::int(65, false),
            PropKind::Float(FloatSpec::quantized(33, 0.0, 1.0)),
        ] {
            let err = ClassRegistry::builder()
                .table(TableSpec::new("DT_A").prop(PropSpec::new("x", kind)))
                .build()
                .unwrap_err();
            assert!(matches!(err, SchemaError::InvalidBitWidth { .. }));
        }
    }

    #[test]
    fn bad_bit_width_names_declaring_table() {
        let err = ClassRegistry::builder()
            .table(
                TableSpec::new("DT_TFPlayer")
                    .prop(PropSpec::inherited("DT_BasePlayer", "m_iHealth", PropKind::int(0, true))),
            )
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidBitWidth {
                owner: "DT_BasePlayer".to_string(),
                name: "m_iHealth".to_string(),
                bits: 0,
            }
        );

        let registry = ClassRegistry::builder()
            .table(TableSpec::new("DT_WORLD").prop(PropSpec::new("m_nLevel", PropKind::int(8, true))))
            .build()
            .unwrap();
        assert_eq!(registry.find_prop("DT_WORLD", "m_nLevel").unwrap().owner_table, "DT_WORLD");
    }

    #[test]
    fn rejects_oversized_table() {
        let mut table = TableSpec::new("DT_Huge");
        for i in 0..=MAX_PROPS_PER_TABLE {
            table = table.prop(PropSpec::new(format!("p{i}"), PropKind::int(1, true)));
        }
        let err = ClassRegistry::builder().table(table).build().unwrap_err();
        assert!(matches!(err, SchemaError::TooManyProps { count: 4097, .. }));
    }
}
