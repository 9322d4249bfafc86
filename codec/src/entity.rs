//! Entities and their decoded property values.

use std::sync::Arc;

use schema::{PropDef, PropId, SendTable, ServerClass};

/// A three-component float vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// A decoded property value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f32),
    Vector(Vec3),
    VectorXY { x: f32, y: f32 },
    String(String),
}

impl Value {
    /// Short name of the value's type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Vector(_) => "vector",
            Self::VectorXY { .. } => "vector_xy",
            Self::String(_) => "string",
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as a float, converting integers.
    #[must_use]
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            _ => None,
        }
    }

    /// Returns the value as a vector; XY vectors get `z = 0`.
    #[must_use]
    pub const fn as_vector(&self) -> Option<Vec3> {
        match self {
            Self::Vector(v) => Some(*v),
            Self::VectorXY { x, y } => Some(Vec3::new(*x, *y, 0.0)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// A property value bound to its definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub def: Arc<PropDef>,
    pub value: Value,
}

impl Property {
    #[must_use]
    pub fn new(def: Arc<PropDef>, value: Value) -> Self {
        Self { def, value }
    }
}

/// A networked entity.
///
/// Holds at most one property per definition; properties keep the order in
/// which they were first set.
#[derive(Debug, Clone)]
pub struct Entity {
    pub index: u16,
    pub serial: u32,
    pub class: Arc<ServerClass>,
    pub table: Arc<SendTable>,
    pub in_pvs: bool,
    properties: Vec<Property>,
}

impl Entity {
    /// Creates an entity with no properties, outside the PVS.
    #[must_use]
    pub fn new(index: u16, serial: u32, class: Arc<ServerClass>, table: Arc<SendTable>) -> Self {
        Self {
            index,
            serial,
            class,
            table,
            in_pvs: false,
            properties: Vec::new(),
        }
    }

    #[must_use]
    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    #[must_use]
    pub fn property(&self, def: &PropDef) -> Option<&Property> {
        self.property_by_id(def.id)
    }

    #[must_use]
    pub fn property_by_id(&self, id: PropId) -> Option<&Property> {
        self.properties.iter().find(|prop| prop.def.id == id)
    }

    /// Looks up a property by declaring table and name.
    #[must_use]
    pub fn property_named(&self, owner_table: &str, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|prop| prop.def.is(owner_table, name))
    }

    /// Sets a property value, replacing the existing value for the same
    /// definition or appending a new property.
    pub fn upsert_property(&mut self, def: &Arc<PropDef>, value: Value) {
        match self.properties.iter_mut().find(|prop| prop.def.id == def.id) {
            Some(existing) => existing.value = value,
            None => self.properties.push(Property::new(Arc::clone(def), value)),
        }
    }

    /// Copies baseline properties that the entity does not have yet.
    ///
    /// Returns the number of properties added.
    pub fn seed_from(&mut self, baseline: &[Property]) -> usize {
        let mut added = 0;
        for prop in baseline {
            if self.property_by_id(prop.def.id).is_none() {
                self.properties.push(prop.clone());
                added += 1;
            }
        }
        added
    }

    /// Takes a shareable snapshot of the current properties.
    #[must_use]
    pub fn snapshot(&self) -> Arc<[Property]> {
        Arc::from(self.properties.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::{ClassId, ClassRegistry, PropKind, PropSpec, TableSpec};

    fn player() -> (ClassRegistry, Entity) {
        let registry = ClassRegistry::builder()
            .class("CTFPlayer", "DT_TFPlayer")
            .table(
                TableSpec::new("DT_TFPlayer")
                    .prop(PropSpec::inherited("DT_BasePlayer", "m_iHealth", PropKind::int(10, true)))
                    .prop(PropSpec::new("m_iClass", PropKind::int(4, true))),
            )
            .build()
            .unwrap();
        let class = Arc::clone(registry.class(ClassId::new(0)).unwrap());
        let table = Arc::clone(registry.table_for(&class).unwrap());
        (registry, Entity::new(3, 77, class, table))
    }

    #[test]
    fn upsert_replaces_in_place() {
        let (_registry, mut entity) = player();
        let health = Arc::clone(entity.table.prop(0).unwrap());
        let class = Arc::clone(entity.table.prop(1).unwrap());

        entity.upsert_property(&class, Value::Int(2));
        entity.upsert_property(&health, Value::Int(125));
        entity.upsert_property(&class, Value::Int(9));

        assert_eq!(entity.properties().len(), 2);
        assert_eq!(entity.properties()[0].def.name, "m_iClass");
        assert_eq!(entity.property(&class).unwrap().value, Value::Int(9));
        assert_eq!(
            entity.property_named("DT_BasePlayer", "m_iHealth").unwrap().value,
            Value::Int(125)
        );
    }

    #[test]
    fn seed_skips_existing_properties() {
        let (_registry, mut entity) = player();
        let health = Arc::clone(entity.table.prop(0).unwrap());
        let class = Arc::clone(entity.table.prop(1).unwrap());
        entity.upsert_property(&health, Value::Int(50));

        let baseline = vec![
            Property::new(Arc::clone(&health), Value::Int(100)),
            Property::new(Arc::clone(&class), Value::Int(1)),
        ];
        assert_eq!(entity.seed_from(&baseline), 1);
        assert_eq!(entity.property(&health).unwrap().value, Value::Int(50));
        assert_eq!(entity.property(&class).unwrap().value, Value::Int(1));
    }

    #[test]
    fn snapshot_is_independent_copy() {
        let (_registry, mut entity) = player();
        let health = Arc::clone(entity.table.prop(0).unwrap());
        entity.upsert_property(&health, Value::Int(10));
        let snapshot = entity.snapshot();
        entity.upsert_property(&health, Value::Int(20));
        assert_eq!(snapshot[0].value, Value::Int(10));
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::Int(4).as_float(), Some(4.0));
        assert_eq!(
            Value::VectorXY { x: 1.0, y: 2.0 }.as_vector(),
            Some(Vec3::new(1.0, 2.0, 0.0))
        );
        assert_eq!(Value::String("x".into()).as_str(), Some("x"));
        assert_eq!(Value::Float(1.0).as_int(), None);
    }
}
