//! Deterministic schema hashing.

use blake3::Hasher;

use crate::prop::{FloatEncoding, FloatSpec, PropKind};
use crate::ClassRegistry;

/// Computes a deterministic fingerprint of a class registry.
///
/// Two registries hash equal when they declare the same classes and tables in
/// the same order with the same property layouts. Interned ids are not part of
/// the hash.
#[must_use]
pub fn schema_hash(registry: &ClassRegistry) -> u64 {
    let mut hasher = Hasher::new();

    write_len(&mut hasher, registry.len());
    for class in registry.classes() {
        write_str(&mut hasher, &class.name);
        write_str(&mut hasher, &class.table_name);
    }

    let tables: Vec<_> = registry.tables().collect();
    write_len(&mut hasher, tables.len());
    for table in tables {
        write_str(&mut hasher, &table.name);
        write_len(&mut hasher, table.len());
        for prop in table.props() {
            write_str(&mut hasher, &prop.owner_table);
            write_str(&mut hasher, &prop.name);
            write_kind(&mut hasher, prop.kind);
            hasher.update(&prop.flags.to_le_bytes());
        }
    }

    let hash = hasher.finalize();
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(head)
}

fn write_kind(hasher: &mut Hasher, kind: PropKind) {
    match kind {
        PropKind::Int { bits, unsigned } => {
            hasher.update(&[0, bits, u8::from(unsigned)]);
        }
        PropKind::Float(spec) => {
            hasher.update(&[1]);
            write_float_spec(hasher, spec);
        }
        PropKind::Vector(spec) => {
            hasher.update(&[2]);
            write_float_spec(hasher, spec);
        }
        PropKind::VectorXY(spec) => {
            hasher.update(&[3]);
            write_float_spec(hasher, spec);
        }
        PropKind::String => {
            hasher.update(&[4]);
        }
    }
}

fn write_float_spec(hasher: &mut Hasher, spec: FloatSpec) {
    let encoding = match spec.encoding {
        FloatEncoding::NoScale => 0,
        FloatEncoding::Coord => 1,
        FloatEncoding::Quantized => 2,
    };
    hasher.update(&[encoding, spec.bits]);
    hasher.update(&spec.low.to_le_bytes());
    hasher.update(&spec.high.to_le_bytes());
}

fn write_len(hasher: &mut Hasher, len: usize) {
    hasher.update(&(len as u64).to_le_bytes());
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_len(hasher, value.len());
    hasher.update(value.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PropSpec, TableSpec};

    fn registry(first: &str, second: &str) -> ClassRegistry {
        ClassRegistry::builder()
            .class("CWorld", "DT_WORLD")
            .table(
                TableSpec::new("DT_WORLD")
                    .prop(PropSpec::new(first, PropKind::int(8, true)))
                    .prop(PropSpec::new(second, PropKind::int(8, true))),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn schema_hash_is_stable() {
        assert_eq!(schema_hash(&registry("a", "b")), schema_hash(&registry("a", "b")));
    }

    #[test]
    fn schema_hash_changes_with_prop_order() {
        assert_ne!(schema_hash(&registry("a", "b")), schema_hash(&registry("b", "a")));
    }

    #[test]
    fn schema_hash_changes_with_kind() {
        let a = registry("a", "b");
        let b = ClassRegistry::builder()
            .class("CWorld", "DT_WORLD")
            .table(
                TableSpec::new("DT_WORLD")
                    .prop(PropSpec::new("a", PropKind::int(8, false)))
                    .prop(PropSpec::new("b", PropKind::int(8, true))),
            )
            .build()
            .unwrap();
        assert_ne!(schema_hash(&a), schema_hash(&b));
    }

    #[test]
    fn string_boundaries_are_unambiguous() {
        assert_ne!(schema_hash(&registry("ab", "c")), schema_hash(&registry("a", "bc")));
    }
}
