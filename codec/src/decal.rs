//! World decal messages.

use bitstream::{BitReader, BitWriter};

use crate::entity::Vec3;
use crate::error::CodecResult;
use crate::value::{read_bit_coord, write_bit_coord};

const TEXTURE_BITS: u8 = 9;
const ENTITY_BITS: u8 = 11;
const MODEL_BITS: u8 = 12;

/// Entity and model a decal is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecalTarget {
    pub entity_index: u16,
    pub model_index: u16,
}

/// A decal placed on world geometry or an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldDecal {
    pub position: Vec3,
    pub texture_index: u16,
    pub target: Option<DecalTarget>,
    pub low_priority: bool,
}

/// Reads a coordinate vector: three presence bits, then a bit-coord for each
/// present component. Absent components are zero.
pub fn read_vec_coord(reader: &mut BitReader<'_>) -> CodecResult<Vec3> {
    let has_x = reader.read_bit()?;
    let has_y = reader.read_bit()?;
    let has_z = reader.read_bit()?;
    let mut component = |present: bool| -> CodecResult<f32> {
        Ok(if present { read_bit_coord(reader)? } else { 0.0 })
    };
    Ok(Vec3::new(component(has_x)?, component(has_y)?, component(has_z)?))
}

pub fn write_vec_coord(writer: &mut BitWriter, v: Vec3) -> CodecResult<()> {
    let components = [v.x, v.y, v.z];
    for c in components {
        writer.write_bit(c != 0.0);
    }
    for c in components {
        if c != 0.0 {
            write_bit_coord(writer, c)?;
        }
    }
    Ok(())
}

pub fn read_world_decal(reader: &mut BitReader<'_>) -> CodecResult<WorldDecal> {
    let position = read_vec_coord(reader)?;
    let texture_index = reader.read_bits(TEXTURE_BITS)? as u16;
    let target = if reader.read_bit()? {
        Some(DecalTarget {
            entity_index: reader.read_bits(ENTITY_BITS)? as u16,
            model_index: reader.read_bits(MODEL_BITS)? as u16,
        })
    } else {
        None
    };
    Ok(WorldDecal {
        position,
        texture_index,
        target,
        low_priority: reader.read_bit()?,
    })
}

pub fn write_world_decal(writer: &mut BitWriter, decal: &WorldDecal) -> CodecResult<()> {
    write_vec_coord(writer, decal.position)?;
    writer.write_bits(u64::from(decal.texture_index), TEXTURE_BITS)?;
    writer.write_bit(decal.target.is_some());
    if let Some(target) = decal.target {
        writer.write_bits(u64::from(target.entity_index), ENTITY_BITS)?;
        writer.write_bits(u64::from(target.model_index), MODEL_BITS)?;
    }
    writer.write_bit(decal.low_priority);
    Ok(())
}
