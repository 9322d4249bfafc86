#![no_main]

use bitstream::BitReader;
use codec::{decode_packet_entities, CodecLimits, EntityState, SendPropDecoder};
use libfuzzer_sys::fuzz_target;
use schema::{ClassRegistry, FloatSpec, PropKind, PropSpec, TableSpec};

fn classes() -> ClassRegistry {
    ClassRegistry::builder()
        .class("CWorld", "DT_WORLD")
        .class("CTFPlayer", "DT_TFPlayer")
        .class("CTFAmmoPack", "DT_WORLD")
        .table(
            TableSpec::new("DT_WORLD")
                .prop(PropSpec::new("m_WorldMins", PropKind::Vector(FloatSpec::coord())))
                .prop(PropSpec::new("m_szName", PropKind::String)),
        )
        .table(
            TableSpec::new("DT_TFPlayer")
                .prop(PropSpec::inherited("DT_BasePlayer", "m_iHealth", PropKind::int(10, true)))
                .prop(PropSpec::new(
                    "m_angEyeAngles",
                    PropKind::VectorXY(FloatSpec::quantized(13, 0.0, 360.0)),
                ))
                .prop(PropSpec::new("m_flSpeed", PropKind::Float(FloatSpec::no_scale()))),
        )
        .build()
        .expect("fuzz schema")
}

fuzz_target!(|data: &[u8]| {
    let classes = classes();
    let limits = CodecLimits::for_testing();
    let decoder = SendPropDecoder::new(&limits);
    let mut state = EntityState::with_limits(&limits);
    let mut reader = BitReader::new(data);

    // Feed the input as a stream of packets against one state.
    while !reader.is_empty() {
        let start = reader.bit_position();
        match decode_packet_entities(&mut reader, &classes, &mut state, &decoder, &limits) {
            Ok(decoded) => {
                let end = start + decoded.header.length as usize;
                assert!(reader.bit_position() >= end);
                assert!(state.entities.len() <= limits.max_entities);
            }
            Err(_) => break,
        }
    }
});
