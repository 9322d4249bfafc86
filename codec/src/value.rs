//! Property value decoding.
//!
//! The field-diff decoder hands each changed property to a [`PropDecoder`].
//! [`SendPropDecoder`] implements the standard send-property encodings; hosts
//! with custom packing can supply their own implementation.

use bitstream::{BitReader, BitResult, BitWriter};
use schema::{FloatEncoding, FloatSpec, PropDef, PropKind};

use crate::entity::{Value, Vec3};
use crate::error::{CodecError, CodecResult};
use crate::limits::CodecLimits;

const COORD_INT_BITS: u8 = 14;
const COORD_FRACT_BITS: u8 = 5;
const COORD_RESOLUTION: f32 = 1.0 / (1 << COORD_FRACT_BITS) as f32;
const STRING_LEN_BITS: u8 = 9;

/// Decodes one property value from the cursor.
pub trait PropDecoder {
    fn decode(&self, def: &PropDef, reader: &mut BitReader<'_>) -> CodecResult<Value>;
}

/// Decoder for the standard send-property encodings.
#[derive(Debug, Clone)]
pub struct SendPropDecoder {
    max_string_bytes: usize,
}

impl SendPropDecoder {
    #[must_use]
    pub fn new(limits: &CodecLimits) -> Self {
        Self {
            max_string_bytes: limits.max_string_bytes,
        }
    }
}

impl Default for SendPropDecoder {
    fn default() -> Self {
        Self::new(&CodecLimits::default())
    }
}

impl PropDecoder for SendPropDecoder {
    fn decode(&self, def: &PropDef, reader: &mut BitReader<'_>) -> CodecResult<Value> {
        let value = match def.kind {
            PropKind::Int { bits, unsigned } => {
                let raw = reader.read_bits(bits)?;
                Value::Int(if unsigned {
                    raw as i64
                } else {
                    sign_extend(raw, bits)
                })
            }
            PropKind::Float(spec) => Value::Float(read_float(reader, spec)?),
            PropKind::Vector(spec) => Value::Vector(Vec3::new(
                read_float(reader, spec)?,
                read_float(reader, spec)?,
                read_float(reader, spec)?,
            )),
            PropKind::VectorXY(spec) => Value::VectorXY {
                x: read_float(reader, spec)?,
                y: read_float(reader, spec)?,
            },
            PropKind::String => {
                let len = reader.read_bits(STRING_LEN_BITS)? as usize;
                if len > self.max_string_bytes {
                    return Err(CodecError::StringTooLong {
                        len,
                        max: self.max_string_bytes,
                    });
                }
                let bytes = reader.read_bytes(len)?;
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            }
        };
        Ok(value)
    }
}

fn sign_extend(raw: u64, bits: u8) -> i64 {
    if bits == 0 || bits >= 64 {
        return raw as i64;
    }
    let shift = 64 - u32::from(bits);
    ((raw << shift) as i64) >> shift
}

fn read_float(reader: &mut BitReader<'_>, spec: FloatSpec) -> BitResult<f32> {
    match spec.encoding {
        FloatEncoding::NoScale => reader.read_f32(),
        FloatEncoding::Coord => read_bit_coord(reader),
        FloatEncoding::Quantized => {
            let raw = reader.read_bits(spec.bits)?;
            let steps = ((1u64 << spec.bits) - 1) as f32;
            Ok(spec.low + (spec.high - spec.low) * (raw as f32 / steps))
        }
    }
}

/// Reads a variable-width world coordinate.
///
/// Layout: has-int bit, has-fraction bit, then if either is set a sign bit,
/// a 14-bit integer part stored minus one and a 5-bit fraction in 1/32 units.
pub fn read_bit_coord(reader: &mut BitReader<'_>) -> BitResult<f32> {
    let has_int = reader.read_bit()?;
    let has_fract = reader.read_bit()?;
    if !has_int && !has_fract {
        return Ok(0.0);
    }

    let negative = reader.read_bit()?;
    let mut value = 0.0;
    if has_int {
        value += (reader.read_bits(COORD_INT_BITS)? + 1) as f32;
    }
    if has_fract {
        value += reader.read_bits(COORD_FRACT_BITS)? as f32 * COORD_RESOLUTION;
    }
    Ok(if negative { -value } else { value })
}

/// Writes a world coordinate, rounding to 1/32 units.
///
/// Magnitudes are clamped to the largest encodable coordinate.
pub fn write_bit_coord(writer: &mut BitWriter, value: f32) -> BitResult<()> {
    let max_int = 1u64 << COORD_INT_BITS;
    let scaled = (value.abs() / COORD_RESOLUTION).round() as u64;
    let scaled = scaled.min((max_int << COORD_FRACT_BITS) | 31);
    let int_part = scaled >> COORD_FRACT_BITS;
    let fract_part = scaled & 31;

    writer.write_bit(int_part > 0);
    writer.write_bit(fract_part > 0);
    if int_part == 0 && fract_part == 0 {
        return Ok(());
    }
    writer.write_bit(value.is_sign_negative());
    if int_part > 0 {
        writer.write_bits(int_part - 1, COORD_INT_BITS)?;
    }
    if fract_part > 0 {
        writer.write_bits(fract_part, COORD_FRACT_BITS)?;
    }
    Ok(())
}

/// Encodes a value for `def`, mirroring [`SendPropDecoder`].
pub fn write_value(writer: &mut BitWriter, def: &PropDef, value: &Value) -> CodecResult<()> {
    match (def.kind, value) {
        (PropKind::Int { bits, .. }, Value::Int(v)) => {
            let mask = if bits >= 64 {
                u64::MAX
            } else {
                (1u64 << bits) - 1
            };
            writer.write_bits((*v as u64) & mask, bits)?;
        }
        (PropKind::Float(spec), Value::Float(v)) => write_float(writer, spec, *v)?,
        (PropKind::Vector(spec), Value::Vector(v)) => {
            write_float(writer, spec, v.x)?;
            write_float(writer, spec, v.y)?;
            write_float(writer, spec, v.z)?;
        }
        (PropKind::VectorXY(spec), Value::VectorXY { x, y }) => {
            write_float(writer, spec, *x)?;
            write_float(writer, spec, *y)?;
        }
        (PropKind::String, Value::String(s)) => {
            let max = (1usize << STRING_LEN_BITS) - 1;
            if s.len() > max {
                return Err(CodecError::StringTooLong { len: s.len(), max });
            }
            writer.write_bits(s.len() as u64, STRING_LEN_BITS)?;
            writer.write_bytes(s.as_bytes());
        }
        (kind, value) => {
            return Err(CodecError::ValueMismatch {
                expected: kind_name(kind),
                found: value.type_name(),
            });
        }
    }
    Ok(())
}

fn write_float(writer: &mut BitWriter, spec: FloatSpec, value: f32) -> BitResult<()> {
    match spec.encoding {
        FloatEncoding::NoScale => {
            writer.write_f32(value);
            Ok(())
        }
        FloatEncoding::Coord => write_bit_coord(writer, value),
        FloatEncoding::Quantized => {
            let steps = ((1u64 << spec.bits) - 1) as f32;
            let range = spec.high - spec.low;
            let fraction = if range == 0.0 {
                0.0
            } else {
                ((value - spec.low) / range).clamp(0.0, 1.0)
            };
            writer.write_bits((fraction * steps).round() as u64, spec.bits)
        }
    }
}

const fn kind_name(kind: PropKind) -> &'static str {
    match kind {
        PropKind::Int { .. } => "int",
        PropKind::Float(_) => "float",
        PropKind::Vector(_) => "vector",
        PropKind::VectorXY(_) => "vector_xy",
        PropKind::String => "string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema::PropId;

    fn def(kind: PropKind) -> PropDef {
        PropDef {
            id: PropId::new(0),
            owner_table: "DT_Test".to_string(),
            name: "m_value".to_string(),
            kind,
            flags: 0,
        }
    }

    fn roundtrip(kind: PropKind, value: &Value) -> Value {
        let def = def(kind);
        let mut writer = BitWriter::new();
        write_value(&mut writer, &def, value).unwrap();
        let (bytes, bits) = writer.finish_with_len();
        let mut reader = BitReader::with_bit_len(&bytes, bits).unwrap();
        let decoded = SendPropDecoder::default().decode(&def, &mut reader).unwrap();
        assert!(reader.is_empty());
        decoded
    }

    #[test]
    fn signed_int_sign_extends() {
        let def = def(PropKind::int(4, false));
        let bytes = [0b1110u8];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(
            SendPropDecoder::default().decode(&def, &mut reader).unwrap(),
            Value::Int(-2)
        );
        assert_eq!(roundtrip(PropKind::int(12, false), &Value::Int(-1000)), Value::Int(-1000));
    }

    #[test]
    fn unsigned_int_is_raw() {
        assert_eq!(roundtrip(PropKind::int(10, true), &Value::Int(1000)), Value::Int(1000));
        let def = def(PropKind::int(4, true));
        let bytes = [0b1110u8];
        assert_eq!(
            SendPropDecoder::default()
                .decode(&def, &mut BitReader::new(&bytes))
                .unwrap(),
            Value::Int(14)
        );
    }

    #[test]
    fn quantized_float_endpoints() {
        let kind = PropKind::Float(FloatSpec::quantized(8, -10.0, 10.0));
        assert_eq!(roundtrip(kind, &Value::Float(-10.0)), Value::Float(-10.0));
        assert_eq!(roundtrip(kind, &Value::Float(10.0)), Value::Float(10.0));
    }

    #[test]
    fn bit_coord_values() {
        for value in [0.0f32, 1.0, -1.0, 0.5, -1234.25, 16384.0] {
            let mut writer = BitWriter::new();
            write_bit_coord(&mut writer, value).unwrap();
            let bytes = writer.finish();
            let decoded = read_bit_coord(&mut BitReader::new(&bytes)).unwrap();
            assert!((decoded - value).abs() < f32::EPSILON, "{value} -> {decoded}");
        }
    }

    #[test]
    fn zero_coord_uses_two_bits() {
        let mut writer = BitWriter::new();
        write_bit_coord(&mut writer, 0.0).unwrap();
        assert_eq!(writer.bits_written(), 2);
    }

    #[test]
    fn vectors_roundtrip() {
        let v = Value::Vector(Vec3::new(1.5, -2.0, 300.0));
        assert_eq!(roundtrip(PropKind::Vector(FloatSpec::coord()), &v), v);
        let xy = Value::VectorXY { x: 0.25, y: 8.0 };
        assert_eq!(roundtrip(PropKind::VectorXY(FloatSpec::no_scale()), &xy), xy);
    }

    #[test]
    fn string_roundtrip_and_limit() {
        let s = Value::String("koth_viaduct".to_string());
        assert_eq!(roundtrip(PropKind::String, &s), s);

        let def = def(PropKind::String);
        let mut writer = BitWriter::new();
        write_value(&mut writer, &def, &Value::String("x".repeat(100))).unwrap();
        let bytes = writer.finish();
        let decoder = SendPropDecoder::new(&CodecLimits::for_testing());
        let err = decoder.decode(&def, &mut BitReader::new(&bytes)).unwrap_err();
        assert_eq!(err, CodecError::StringTooLong { len: 100, max: 64 });
    }

    #[test]
    fn mismatched_value_rejected() {
        let def = def(PropKind::String);
        let err = write_value(&mut BitWriter::new(), &def, &Value::Int(1)).unwrap_err();
        assert_eq!(
            err,
            CodecError::ValueMismatch {
                expected: "string",
                found: "int"
            }
        );
    }
}
