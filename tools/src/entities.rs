//! Packet-entities payload decoding into JSON reports.

use anyhow::{Context, Result};
use bitstream::BitReader;
use codec::{
    decode_packet_entities, CodecLimits, DecodedPacketEntities, Entity, EntityRegistry,
    EntityState, SendPropDecoder, Value,
};
use schema::{schema_hash, ClassRegistry, SchemaDoc};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

/// Size of a full (non-delta) packet-entities header.
const MIN_HEADER_BITS: usize = 45;

/// Parses a JSON schema document into a class registry.
pub fn load_registry(json: &str) -> Result<ClassRegistry> {
    let doc: SchemaDoc = serde_json::from_str(json).context("parse schema json")?;
    let registry = ClassRegistry::from_doc(&doc).context("build class registry")?;
    debug!(
        classes = registry.len(),
        props = registry.prop_count(),
        class_bits = registry.class_bits(),
        hash = schema_hash(&registry),
        "schema loaded"
    );
    Ok(registry)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyReport {
    /// `owner_table.name`
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityReport {
    pub index: u16,
    pub serial: u32,
    pub class: String,
    pub in_pvs: bool,
    pub properties: Vec<PropertyReport>,
}

impl From<&Entity> for EntityReport {
    fn from(entity: &Entity) -> Self {
        Self {
            index: entity.index,
            serial: entity.serial,
            class: entity.class.name.clone(),
            in_pvs: entity.in_pvs,
            properties: entity
                .properties()
                .iter()
                .map(|prop| PropertyReport {
                    name: prop.def.to_string(),
                    value: value_json(&prop.value),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketReport {
    pub delta_from: Option<i32>,
    pub baseline: u8,
    pub updated_entries: u16,
    pub length_bits: u32,
    pub updated_baseline: bool,
    pub processed: usize,
    pub removed: Vec<u16>,
    pub failure: Option<String>,
}

impl From<&DecodedPacketEntities> for PacketReport {
    fn from(decoded: &DecodedPacketEntities) -> Self {
        let header = &decoded.header;
        Self {
            delta_from: header.delta_from,
            baseline: u8::from(header.baseline.to_bit()),
            updated_entries: header.updated_entries,
            length_bits: header.length,
            updated_baseline: header.updated_baseline,
            processed: decoded.changes.len(),
            removed: decoded.removed.clone(),
            failure: decoded.failure.as_ref().map(|failure| match failure.index {
                Some(index) => format!("entity {index}: {}", failure.error),
                None => failure.error.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitiesReport {
    pub packets: Vec<PacketReport>,
    pub entities: Vec<EntityReport>,
    /// Error that ended decoding before the end of the payload, if any.
    pub error: Option<String>,
}

/// Converts a decoded value into JSON. Non-finite floats become `null`.
pub fn value_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Int(v) => json!(v),
        Value::Float(v) => json!(v),
        Value::Vector(v) => json!([v.x, v.y, v.z]),
        Value::VectorXY { x, y } => json!([x, y]),
        Value::String(v) => json!(v),
    }
}

/// Snapshot of every live entity, in index order.
pub fn registry_report(entities: &EntityRegistry) -> Vec<EntityReport> {
    entities.iter().map(EntityReport::from).collect()
}

/// Decodes bit-packed, back-to-back packet-entities messages from one
/// payload against a single entity state.
///
/// Decoding stops at the end of the payload or at the first packet whose
/// header or body bounds cannot be read. Packets decoded before that point
/// are kept and the error is recorded in [`EntitiesReport::error`].
pub fn decode_entities(
    payload: &[u8],
    classes: &ClassRegistry,
    limits: &CodecLimits,
) -> EntitiesReport {
    let decoder = SendPropDecoder::new(limits);
    let mut state = EntityState::with_limits(limits);
    let mut reader = BitReader::new(payload);
    let mut packets = Vec::new();
    let mut error = None;

    // Anything shorter than a header is trailing padding.
    while reader.bits_remaining() >= MIN_HEADER_BITS {
        match decode_packet_entities(&mut reader, classes, &mut state, &decoder, limits) {
            Ok(decoded) => packets.push(PacketReport::from(&decoded)),
            Err(err) => {
                warn!(packet = packets.len(), error = %err, "packet entities stream ended early");
                error = Some(format!("packet {}: {err}", packets.len()));
                break;
            }
        }
    }

    EntitiesReport {
        packets,
        entities: registry_report(&state.entities),
        error,
    }
}
