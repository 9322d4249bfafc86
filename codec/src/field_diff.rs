//! Field-diff decoding.
//!
//! A diff is a list of changed field indices followed by their values:
//!
//! ```text
//! { 1 gap:ubitvar }* 0 value*
//! ```
//!
//! Each index is `previous + gap + 1`, starting from -1. Values follow in
//! the same order once the list is terminated.

use std::sync::Arc;

use bitstream::{BitReader, BitWriter};
use schema::{PropDef, PropId, SendTable};
use tracing::trace;

use crate::entity::{Entity, Value};
use crate::error::{CodecError, CodecResult};
use crate::limits::CodecLimits;
use crate::value::{write_value, PropDecoder};
use crate::varint::{read_ubit_var, write_ubit_var};

/// Lazy iterator over the changed field indices of one diff.
///
/// Stops after the terminating bit or the first error.
#[derive(Debug)]
pub struct FieldIndices<'r, 'a> {
    reader: &'r mut BitReader<'a>,
    last: i64,
    max: usize,
    done: bool,
}

impl<'r, 'a> FieldIndices<'r, 'a> {
    /// Creates an iterator that rejects indices at or above `max`.
    pub fn new(reader: &'r mut BitReader<'a>, max: usize) -> Self {
        Self {
            reader,
            last: -1,
            max,
            done: false,
        }
    }

    fn read_next(&mut self) -> CodecResult<Option<usize>> {
        if !self.reader.read_bit()? {
            return Ok(None);
        }
        let gap = read_ubit_var(self.reader)?;
        let index = self.last + i64::from(gap) + 1;
        let index = usize::try_from(index).unwrap_or(usize::MAX);
        if index >= self.max {
            return Err(CodecError::FieldIndexOutOfBounds {
                index,
                max: self.max,
            });
        }
        self.last = index as i64;
        Ok(Some(index))
    }
}

impl Iterator for FieldIndices<'_, '_> {
    type Item = CodecResult<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.read_next();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result.transpose()
    }
}

/// Applies one diff to an entity.
///
/// All indices are resolved against the entity's table before any value is
/// decoded, so an invalid index leaves the entity untouched. Returns the
/// changed properties in wire order.
pub fn apply_entity_update(
    entity: &mut Entity,
    reader: &mut BitReader<'_>,
    decoder: &dyn PropDecoder,
    limits: &CodecLimits,
) -> CodecResult<Vec<PropId>> {
    let mut changed: Vec<Arc<PropDef>> = Vec::new();
    for index in FieldIndices::new(reader, limits.max_field_index) {
        let index = index?;
        let def = entity
            .table
            .prop(index)
            .ok_or(CodecError::UnknownProperty {
                index,
                prop_count: entity.table.len(),
            })?;
        changed.push(Arc::clone(def));
    }

    let mut ids = Vec::with_capacity(changed.len());
    for def in changed {
        let value = decoder.decode(&def, reader)?;
        trace!(entity = entity.index, prop = %def, value = ?value, "property updated");
        entity.upsert_property(&def, value);
        ids.push(def.id);
    }
    Ok(ids)
}

/// Writes a diff for `fields`, given as (field index, value) pairs in
/// strictly increasing index order.
pub fn write_entity_update(
    writer: &mut BitWriter,
    table: &SendTable,
    fields: &[(usize, Value)],
) -> CodecResult<()> {
    let mut last: Option<usize> = None;
    for (index, _) in fields {
        let gap = match last {
            None => *index,
            Some(previous) if *index > previous => index - previous - 1,
            Some(previous) => {
                return Err(CodecError::IndexOrder {
                    previous,
                    current: *index,
                })
            }
        };
        writer.write_bit(true);
        write_ubit_var(writer, gap as u32)?;
        last = Some(*index);
    }
    writer.write_bit(false);

    for (index, value) in fields {
        let def = table.prop(*index).ok_or(CodecError::UnknownProperty {
            index: *index,
            prop_count: table.len(),
        })?;
        write_value(writer, def, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SendPropDecoder;
    use schema::{ClassId, ClassRegistry, PropKind, PropSpec, TableSpec};

    fn entity() -> Entity {
        let registry = ClassRegistry::builder()
            .class("CTFAmmoPack", "DT_AmmoPack")
            .table(
                TableSpec::new("DT_AmmoPack")
                    .prop(PropSpec::new("a", PropKind::int(8, true)))
                    .prop(PropSpec::new("b", PropKind::int(8, true)))
                    .prop(PropSpec::new("c", PropKind::String))
                    .prop(PropSpec::new("d", PropKind::int(4, false))),
            )
            .build()
            .unwrap();
        let class = Arc::clone(registry.class(ClassId::new(0)).unwrap());
        let table = Arc::clone(registry.table_for(&class).unwrap());
        Entity::new(0, 0, class, table)
    }

    #[test]
    fn indices_from_gaps() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        write_ubit_var(&mut writer, 0).unwrap();
        writer.write_bit(true);
        write_ubit_var(&mut writer, 3).unwrap();
        writer.write_bit(false);
        writer.write_bit(true);
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        let indices: Vec<usize> = FieldIndices::new(&mut reader, 4096)
            .collect::<CodecResult<_>>()
            .unwrap();
        assert_eq!(indices, vec![0, 4]);
        assert_eq!(reader.bit_position(), 1 + 6 + 1 + 6 + 1);
    }

    #[test]
    fn index_at_limit_rejected() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        write_ubit_var(&mut writer, 4096).unwrap();
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        let mut indices = FieldIndices::new(&mut reader, 4096);
        assert_eq!(
            indices.next(),
            Some(Err(CodecError::FieldIndexOutOfBounds {
                index: 4096,
                max: 4096
            }))
        );
        assert_eq!(indices.next(), None);
    }

    #[test]
    fn apply_decodes_in_wire_order() {
        let mut target = entity();
        let mut writer = BitWriter::new();
        let fields = vec![
            (1, Value::Int(7)),
            (2, Value::String("hi".to_string())),
            (3, Value::Int(-3)),
        ];
        write_entity_update(&mut writer, &target.table, &fields).unwrap();
        let (bytes, bits) = writer.finish_with_len();

        let mut reader = BitReader::with_bit_len(&bytes, bits).unwrap();
        let changed = apply_entity_update(
            &mut target,
            &mut reader,
            &SendPropDecoder::default(),
            &CodecLimits::default(),
        )
        .unwrap();

        assert!(reader.is_empty());
        let ids: Vec<_> = [1, 2, 3]
            .iter()
            .map(|i| target.table.prop(*i).unwrap().id)
            .collect();
        assert_eq!(changed, ids);
        assert_eq!(target.property_named("DT_AmmoPack", "b").unwrap().value, Value::Int(7));
        assert_eq!(target.property_named("DT_AmmoPack", "d").unwrap().value, Value::Int(-3));
        assert!(target.property_named("DT_AmmoPack", "a").is_none());
    }

    #[test]
    fn index_past_table_leaves_entity_untouched() {
        let mut target = entity();
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        write_ubit_var(&mut writer, 0).unwrap();
        writer.write_bit(true);
        write_ubit_var(&mut writer, 8).unwrap();
        writer.write_bit(false);
        writer.write_bits(5, 8).unwrap();
        let bytes = writer.finish();

        let err = apply_entity_update(
            &mut target,
            &mut BitReader::new(&bytes),
            &SendPropDecoder::default(),
            &CodecLimits::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            CodecError::UnknownProperty {
                index: 9,
                prop_count: 4
            }
        );
        assert!(target.properties().is_empty());
    }

    #[test]
    fn writer_rejects_unordered_indices() {
        let target = entity();
        let err = write_entity_update(
            &mut BitWriter::new(),
            &target.table,
            &[(2, Value::Int(0)), (1, Value::Int(0))],
        )
        .unwrap_err();
        assert_eq!(
            err,
            CodecError::IndexOrder {
                previous: 2,
                current: 1
            }
        );
    }
}
