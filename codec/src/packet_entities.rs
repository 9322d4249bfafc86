//! Packet-entities decoding.
//!
//! # Layout
//!
//! ```text
//! max_entries:11 is_delta:1 [delta_from:32] baseline:1 updated_entries:11
//! length:20 updated_baseline:1 body:length
//! ```
//!
//! The body holds `updated_entries` entity records followed, for delta
//! packets, by the explicit removal list:
//!
//! ```text
//! record  = gap:ubitvar pvs:2 [enter] [diff]
//! enter   = class:class_bits serial:10
//! removal = { 1 index:11 }* 0
//! ```

use std::sync::Arc;

use bitstream::{BitReader, BitWriter};
use schema::{ClassId, ClassRegistry, SendTable, ServerClass};
use tracing::{debug, trace, warn};

use crate::baseline::{BaselineSlot, BaselineStore};
use crate::entity::Value;
use crate::error::{CodecError, CodecResult};
use crate::field_diff::{apply_entity_update, write_entity_update};
use crate::limits::CodecLimits;
use crate::pvs::{read_pvs, write_pvs, PvsTransition};
use crate::registry::EntityRegistry;
use crate::value::PropDecoder;
use crate::varint::{read_ubit_var, write_ubit_var};

const MAX_ENTRIES_BITS: u8 = 11;
const UPDATED_ENTRIES_BITS: u8 = 11;
const LENGTH_BITS: u8 = 20;

/// Entity state owned by one replay.
#[derive(Debug, Clone, Default)]
pub struct EntityState {
    pub entities: EntityRegistry,
    pub baselines: BaselineStore,
}

impl EntityState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates state with entity slots preallocated for `limits`.
    #[must_use]
    pub fn with_limits(limits: &CodecLimits) -> Self {
        Self {
            entities: EntityRegistry::with_capacity(limits.entity_index_bound()),
            baselines: BaselineStore::new(),
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.baselines.clear();
    }
}

/// Fixed header of a packet-entities message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketEntitiesHeader {
    pub max_entries: u16,
    /// Tick the delta was encoded against, for delta packets.
    pub delta_from: Option<i32>,
    /// Instance baseline slot the packet was encoded against.
    pub baseline: BaselineSlot,
    pub updated_entries: u16,
    /// Body length in bits.
    pub length: u32,
    pub updated_baseline: bool,
}

impl PacketEntitiesHeader {
    #[must_use]
    pub const fn is_delta(&self) -> bool {
        self.delta_from.is_some()
    }

    const fn packet_type(&self) -> &'static str {
        if self.is_delta() {
            "delta"
        } else {
            "full"
        }
    }
}

/// One processed entity record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityChange {
    pub index: u16,
    pub transition: PvsTransition,
    /// Properties set by the record's own diff, in wire order.
    pub changed: Vec<schema::PropId>,
}

/// A record-level failure that aborted the rest of a packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketFailure {
    /// Entity index of the failing record, if it was known.
    ///
    /// Wider than a slot index so an out-of-range index can be reported.
    pub index: Option<u32>,
    pub error: CodecError,
}

/// Result of decoding one packet-entities message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacketEntities {
    pub header: PacketEntitiesHeader,
    /// Records processed before any failure, in wire order.
    pub changes: Vec<EntityChange>,
    /// Entities removed by the explicit removal list.
    pub removed: Vec<u16>,
    pub failure: Option<PacketFailure>,
}

impl DecodedPacketEntities {
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Reads the packet-entities header.
pub fn read_header(reader: &mut BitReader<'_>) -> CodecResult<PacketEntitiesHeader> {
    let max_entries = reader.read_bits(MAX_ENTRIES_BITS)? as u16;
    let is_delta = reader.read_bit()?;
    let delta_from = if is_delta {
        Some(reader.read_i32()?)
    } else {
        None
    };
    Ok(PacketEntitiesHeader {
        max_entries,
        delta_from,
        baseline: BaselineSlot::from_bit(reader.read_bit()?),
        updated_entries: reader.read_bits(UPDATED_ENTRIES_BITS)? as u16,
        length: reader.read_bits(LENGTH_BITS)? as u32,
        updated_baseline: reader.read_bit()?,
    })
}

/// Decodes one packet-entities message and applies it to `state`.
///
/// On return the cursor is at the end of the packet body. Errors inside the
/// body stop processing of the remaining records and are reported through
/// [`DecodedPacketEntities::failure`]; only a truncated header or a body
/// length past the end of `reader` is returned as `Err`.
pub fn decode_packet_entities(
    reader: &mut BitReader<'_>,
    classes: &ClassRegistry,
    state: &mut EntityState,
    decoder: &dyn PropDecoder,
    limits: &CodecLimits,
) -> CodecResult<DecodedPacketEntities> {
    let header = read_header(reader)?;
    let mut body = reader.sub_reader(header.length as usize)?;

    let mut decoded = DecodedPacketEntities {
        header,
        changes: Vec::with_capacity(usize::from(header.updated_entries)),
        removed: Vec::new(),
        failure: None,
    };

    let mut packet = PacketDecoder {
        header: &header,
        classes,
        state,
        decoder,
        limits,
        current: None,
    };
    if let Err(error) = packet.run(&mut body, &mut decoded) {
        warn!(
            packet_type = header.packet_type(),
            entity = ?packet.current,
            error = %error,
            "packet entities decode failed"
        );
        decoded.failure = Some(PacketFailure {
            index: packet.current,
            error,
        });
    }

    debug!(
        packet_type = header.packet_type(),
        updated = header.updated_entries,
        processed = decoded.changes.len(),
        removed = decoded.removed.len(),
        entities = packet.state.entities.len(),
        "packet entities decoded"
    );
    Ok(decoded)
}

struct PacketDecoder<'p> {
    header: &'p PacketEntitiesHeader,
    classes: &'p ClassRegistry,
    state: &'p mut EntityState,
    decoder: &'p dyn PropDecoder,
    limits: &'p CodecLimits,
    current: Option<u32>,
}

impl PacketDecoder<'_> {
    fn run(
        &mut self,
        body: &mut BitReader<'_>,
        decoded: &mut DecodedPacketEntities,
    ) -> CodecResult<()> {
        if self.header.updated_baseline {
            self.state.baselines.carry_forward(self.header.baseline);
        }

        let bound = self.limits.entity_index_bound();
        let mut index: i64 = -1;
        for _ in 0..self.header.updated_entries {
            self.current = None;
            index += 1 + i64::from(read_ubit_var(body)?);
            self.current = u32::try_from(index).ok();
            let entity_index = usize::try_from(index)
                .ok()
                .filter(|i| *i < bound)
                .ok_or(CodecError::InvalidEntityIndex {
                    index: usize::try_from(index).unwrap_or(usize::MAX),
                    max: bound,
                })?;
            // Bounded by entity_index_bound, which never exceeds u16.
            let entity_index = entity_index as u16;

            let transition = read_pvs(body)?;
            trace!(entity = entity_index, %transition, "entity record");
            let changed = match transition {
                PvsTransition::Enter => self.enter(entity_index, body)?,
                PvsTransition::Preserve => {
                    let entity = self.state.entities.get_mut(entity_index).ok_or(
                        CodecError::UnknownEntity {
                            index: entity_index,
                            transition,
                        },
                    )?;
                    apply_entity_update(entity, body, self.decoder, self.limits)?
                }
                PvsTransition::Leave | PvsTransition::LeaveAndDelete => {
                    let entity = self.state.entities.get_mut(entity_index).ok_or(
                        CodecError::UnknownEntity {
                            index: entity_index,
                            transition,
                        },
                    )?;
                    entity.in_pvs = false;
                    if transition == PvsTransition::LeaveAndDelete {
                        self.state.entities.remove(entity_index);
                    }
                    Vec::new()
                }
            };
            decoded.changes.push(EntityChange {
                index: entity_index,
                transition,
                changed,
            });
        }
        self.current = None;

        if self.header.is_delta() {
            while body.read_bit()? {
                let removed = body.read_bits(self.limits.entity_index_bits)?;
                let removed = u16::try_from(removed).map_err(|_| CodecError::InvalidEntityIndex {
                    index: usize::MAX,
                    max: bound,
                })?;
                if self.state.entities.remove(removed).is_some() {
                    trace!(entity = removed, "entity removed");
                    decoded.removed.push(removed);
                }
            }
        }
        Ok(())
    }

    fn enter(
        &mut self,
        index: u16,
        body: &mut BitReader<'_>,
    ) -> CodecResult<Vec<schema::PropId>> {
        let raw_class = body.read_bits(self.classes.class_bits())?;
        let class = u16::try_from(raw_class)
            .ok()
            .and_then(|id| self.classes.class(ClassId::new(id)))
            .ok_or(CodecError::UnknownServerClass { class_id: raw_class })?;
        // Every registered class has a table; checked when the schema is built.
        let table = self
            .classes
            .table_for(class)
            .ok_or_else(|| CodecError::UnknownSchema {
                class: class.id,
                table: class.table_name.clone(),
            })?;
        let serial = body.read_bits(self.limits.serial_bits)? as u32;

        let EntityState {
            entities,
            baselines,
        } = &mut *self.state;
        let entity =
            entities.create_if_absent(index, Arc::clone(class), Arc::clone(table), serial);

        let active = self.header.baseline;
        if let Some(baseline) = baselines.instance_baseline(active, index) {
            entity.seed_from(baseline);
        } else if let Some(mut baseline) = baselines.static_baseline(class.id) {
            apply_entity_update(entity, &mut baseline, self.decoder, self.limits)?;
        }

        let changed = apply_entity_update(entity, body, self.decoder, self.limits)?;
        entity.in_pvs = true;

        if self.header.updated_baseline {
            baselines.set_instance_baseline(active.other(), index, entity.snapshot());
        }
        Ok(changed)
    }
}

/// Options for the header of an encoded packet.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PacketOptions {
    pub max_entries: u16,
    pub delta_from: Option<i32>,
    pub baseline: BaselineSlot,
    pub updated_baseline: bool,
    /// Explicit removal list; only written for delta packets.
    pub removals: Vec<u16>,
}

/// Builds packet-entities payloads.
///
/// Used to produce fixtures for tests, benchmarks and fuzzing.
#[derive(Debug)]
pub struct PacketEntitiesEncoder<'c> {
    classes: &'c ClassRegistry,
    limits: CodecLimits,
    body: BitWriter,
    last_index: Option<u16>,
    records: u16,
}

impl<'c> PacketEntitiesEncoder<'c> {
    #[must_use]
    pub fn new(classes: &'c ClassRegistry, limits: &CodecLimits) -> Self {
        Self {
            classes,
            limits: limits.clone(),
            body: BitWriter::new(),
            last_index: None,
            records: 0,
        }
    }

    /// Appends an enter record for `class` with the given diff.
    pub fn enter(
        &mut self,
        index: u16,
        class: &ServerClass,
        serial: u32,
        fields: &[(usize, Value)],
    ) -> CodecResult<&mut Self> {
        let table = self
            .classes
            .table_for(class)
            .ok_or_else(|| CodecError::UnknownSchema {
                class: class.id,
                table: class.table_name.clone(),
            })?;
        self.record_prefix(index, PvsTransition::Enter)?;
        self.body
            .write_bits(u64::from(class.id.get()), self.classes.class_bits())?;
        self.body
            .write_bits(u64::from(serial), self.limits.serial_bits)?;
        write_entity_update(&mut self.body, table, fields)?;
        Ok(self)
    }

    /// Appends a preserve record with a diff against `table`.
    pub fn preserve(
        &mut self,
        index: u16,
        table: &SendTable,
        fields: &[(usize, Value)],
    ) -> CodecResult<&mut Self> {
        self.record_prefix(index, PvsTransition::Preserve)?;
        write_entity_update(&mut self.body, table, fields)?;
        Ok(self)
    }

    /// Appends a leave record.
    pub fn leave(&mut self, index: u16, delete: bool) -> CodecResult<&mut Self> {
        let transition = if delete {
            PvsTransition::LeaveAndDelete
        } else {
            PvsTransition::Leave
        };
        self.record_prefix(index, transition)?;
        Ok(self)
    }

    fn record_prefix(&mut self, index: u16, transition: PvsTransition) -> CodecResult<()> {
        let gap = match self.last_index {
            None => index,
            Some(previous) if index > previous => index - previous - 1,
            Some(previous) => {
                return Err(CodecError::IndexOrder {
                    previous: usize::from(previous),
                    current: usize::from(index),
                })
            }
        };
        write_ubit_var(&mut self.body, u32::from(gap))?;
        write_pvs(&mut self.body, transition);
        self.last_index = Some(index);
        self.records += 1;
        Ok(())
    }

    /// Writes the header, body and removal list, returning bytes and bit length.
    pub fn finish(mut self, options: &PacketOptions) -> CodecResult<(Vec<u8>, usize)> {
        if options.delta_from.is_some() {
            for index in &options.removals {
                self.body.write_bit(true);
                self.body
                    .write_bits(u64::from(*index), self.limits.entity_index_bits)?;
            }
            self.body.write_bit(false);
        }
        let (body, body_bits) = self.body.finish_with_len();

        let mut writer = BitWriter::with_capacity(body.len() + 12);
        writer.write_bits(u64::from(options.max_entries), MAX_ENTRIES_BITS)?;
        writer.write_bit(options.delta_from.is_some());
        if let Some(tick) = options.delta_from {
            writer.write_i32(tick);
        }
        writer.write_bit(options.baseline.to_bit());
        writer.write_bits(u64::from(self.records), UPDATED_ENTRIES_BITS)?;
        writer.write_bits(body_bits as u64, LENGTH_BITS)?;
        writer.write_bit(options.updated_baseline);

        let mut reader = BitReader::with_bit_len(&body, body_bits)?;
        while !reader.is_empty() {
            let chunk = reader.bits_remaining().min(32) as u8;
            writer.write_bits(reader.read_bits(chunk)?, chunk)?;
        }
        Ok(writer.finish_with_len())
    }
}
