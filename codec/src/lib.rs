//! Entity delta decoding for demodec.
//!
//! This is the main codec crate that ties together bitstream, wire and schema
//! to reconstruct per-tick entity state from packet-entities messages.
//!
//! # Features
//!
//! - Selector-prefixed variable-width integers
//! - PVS transitions (preserve, enter, leave, leave and delete)
//! - Dual-slot instance baselines plus per-class static baselines
//! - Field-diff decoding through a pluggable [`PropDecoder`]
//! - World decals and a match-level projection of decoded entities
//!
//! # Design Principles
//!
//! - **Explicit state** - Each replay owns one [`EntityState`]; there are no globals.
//! - **Cursor discipline** - A decoded packet always leaves the cursor at its end.
//! - **Contained failures** - A bad record aborts its packet, not the replay.
//!
//! # Example
//!
//! ```
//! use bitstream::BitReader;
//! use codec::{
//!     decode_packet_entities, CodecLimits, EntityState, PacketEntitiesEncoder, PacketOptions,
//!     SendPropDecoder, Value,
//! };
//! use schema::{ClassRegistry, PropKind, PropSpec, TableSpec};
//!
//! let classes = ClassRegistry::builder()
//!     .class("CWorld", "DT_WORLD")
//!     .table(TableSpec::new("DT_WORLD").prop(PropSpec::new("m_nLevel", PropKind::int(8, true))))
//!     .build()
//!     .unwrap();
//! let world = classes.class_by_name("CWorld").unwrap();
//! let limits = CodecLimits::default();
//!
//! let mut encoder = PacketEntitiesEncoder::new(&classes, &limits);
//! encoder.enter(0, world, 1, &[(0, Value::Int(3))]).unwrap();
//! let (bytes, bits) = encoder.finish(&PacketOptions::default()).unwrap();
//!
//! let mut state = EntityState::new();
//! let mut reader = BitReader::with_bit_len(&bytes, bits).unwrap();
//! let decoded = decode_packet_entities(
//!     &mut reader,
//!     &classes,
//!     &mut state,
//!     &SendPropDecoder::new(&limits),
//!     &limits,
//! )
//! .unwrap();
//!
//! assert!(decoded.is_complete());
//! assert!(state.entities.get(0).unwrap().in_pvs);
//! ```

mod baseline;
mod decal;
mod entity;
mod error;
mod field_diff;
mod limits;
mod packet_entities;
mod projection;
mod pvs;
mod registry;
mod value;
mod varint;

pub use baseline::{BaselineSlot, BaselineStore};
pub use decal::{
    read_vec_coord, read_world_decal, write_vec_coord, write_world_decal, DecalTarget,
    WorldDecal,
};
pub use entity::{Entity, Property, Value, Vec3};
pub use error::{CodecError, CodecResult};
pub use field_diff::{apply_entity_update, write_entity_update, FieldIndices};
pub use limits::CodecLimits;
pub use packet_entities::{
    decode_packet_entities, read_header, DecodedPacketEntities, EntityChange, EntityState,
    PacketEntitiesEncoder, PacketEntitiesHeader, PacketFailure, PacketOptions,
};
pub use projection::{MatchView, PlayerView, WorldBounds};
pub use pvs::{read_pvs, write_pvs, PvsTransition};
pub use registry::EntityRegistry;
pub use value::{read_bit_coord, write_bit_coord, write_value, PropDecoder, SendPropDecoder};
pub use varint::{read_ubit_var, ubit_var_len, write_ubit_var};
pub use wire::Limits as WireLimits;
