//! Demo file header.

use bitstream::{BitReader, BitWriter};

use crate::error::{DecodeError, EncodeError, WireResult};

/// Magic bytes at the start of every demo file.
pub const MAGIC: [u8; 8] = *b"HL2DEMO\0";

/// Width of the fixed string fields in the header.
pub const PATH_LEN: usize = 260;

/// Header size in bytes (1072 total).
pub const HEADER_SIZE: usize = 8 + 4 + 4 + PATH_LEN * 4 + 4 + 4 + 4 + 4;

/// Demo file header.
///
/// The magic is validated during decoding and is not stored in this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoHeader {
    /// Demo file format version.
    pub demo_protocol: i32,
    /// Network protocol version of the recording server.
    pub network_protocol: i32,
    /// Server name or address.
    pub server: String,
    /// Recording client name.
    pub nick: String,
    pub map: String,
    /// Game directory.
    pub game: String,
    /// Playback duration in seconds.
    pub duration: f32,
    pub ticks: i32,
    pub frames: i32,
    /// Length of the signon data in bytes.
    pub signon_length: i32,
}

/// Decodes the demo header from the start of the stream.
pub fn decode_header(reader: &mut BitReader<'_>) -> WireResult<DemoHeader> {
    let magic = reader.read_bytes(MAGIC.len())?;
    if magic != MAGIC {
        let mut found = [0u8; 8];
        found.copy_from_slice(&magic);
        return Err(DecodeError::InvalidMagic { found });
    }

    Ok(DemoHeader {
        demo_protocol: reader.read_i32()?,
        network_protocol: reader.read_i32()?,
        server: reader.read_fixed_string(PATH_LEN)?,
        nick: reader.read_fixed_string(PATH_LEN)?,
        map: reader.read_fixed_string(PATH_LEN)?,
        game: reader.read_fixed_string(PATH_LEN)?,
        duration: reader.read_f32()?,
        ticks: reader.read_i32()?,
        frames: reader.read_i32()?,
        signon_length: reader.read_i32()?,
    })
}

/// Encodes a demo header, including the magic.
pub fn encode_header(header: &DemoHeader, writer: &mut BitWriter) -> Result<(), EncodeError> {
    writer.write_bytes(&MAGIC);
    writer.write_i32(header.demo_protocol);
    writer.write_i32(header.network_protocol);
    write_fixed_string(writer, "server", &header.server)?;
    write_fixed_string(writer, "nick", &header.nick)?;
    write_fixed_string(writer, "map", &header.map)?;
    write_fixed_string(writer, "game", &header.game)?;
    writer.write_f32(header.duration);
    writer.write_i32(header.ticks);
    writer.write_i32(header.frames);
    writer.write_i32(header.signon_length);
    Ok(())
}

fn write_fixed_string(
    writer: &mut BitWriter,
    field: &'static str,
    value: &str,
) -> Result<(), EncodeError> {
    let bytes = value.as_bytes();
    if bytes.len() >= PATH_LEN {
        return Err(EncodeError::StringTooLong {
            field,
            len: bytes.len(),
            max: PATH_LEN - 1,
        });
    }
    writer.write_bytes(bytes);
    writer.write_bytes(&[0u8; PATH_LEN][..PATH_LEN - bytes.len()]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> DemoHeader {
        DemoHeader {
            demo_protocol: 3,
            network_protocol: 24,
            server: "127.0.0.1:27015".to_string(),
            nick: "SourceTV".to_string(),
            map: "cp_badlands".to_string(),
            game: "tf".to_string(),
            duration: 1800.5,
            ticks: 119_000,
            frames: 118_500,
            signon_length: 351_234,
        }
    }

    #[test]
    fn header_size_constant_correct() {
        assert_eq!(HEADER_SIZE, 1072);
    }

    #[test]
    fn header_roundtrip() {
        let header = sample_header();
        let mut writer = BitWriter::new();
        encode_header(&header, &mut writer).unwrap();
        let bytes = writer.finish();
        assert_eq!(bytes.len(), HEADER_SIZE);

        let mut reader = BitReader::new(&bytes);
        assert_eq!(decode_header(&mut reader).unwrap(), header);
        assert!(reader.is_empty());
    }

    #[test]
    fn header_rejects_bad_magic() {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[..8].copy_from_slice(b"HL2DEMX\0");
        let err = decode_header(&mut BitReader::new(&bytes)).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidMagic { .. }));
    }

    #[test]
    fn header_rejects_truncated_input() {
        let header = sample_header();
        let mut writer = BitWriter::new();
        encode_header(&header, &mut writer).unwrap();
        let bytes = writer.finish();

        let err = decode_header(&mut BitReader::new(&bytes[..HEADER_SIZE - 1])).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated(_)));
    }

    #[test]
    fn encode_rejects_oversized_string() {
        let mut header = sample_header();
        header.map = "x".repeat(PATH_LEN);
        let err = encode_header(&header, &mut BitWriter::new()).unwrap_err();
        assert!(matches!(err, EncodeError::StringTooLong { field: "map", .. }));
    }
}
