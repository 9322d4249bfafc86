use bitstream::BitReader;
use codec::{
    decode_packet_entities, CodecLimits, EntityState, PacketEntitiesEncoder, PacketOptions,
    SendPropDecoder, Value, Vec3,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use schema::{ClassRegistry, FloatSpec, PropKind, PropSpec, TableSpec};

fn classes() -> ClassRegistry {
    let mut table = TableSpec::new("DT_TFPlayer")
        .prop(PropSpec::inherited("DT_BasePlayer", "m_iHealth", PropKind::int(10, true)))
        .prop(PropSpec::new("m_vecOrigin", PropKind::Vector(FloatSpec::coord())))
        .prop(PropSpec::new(
            "m_angEyeAngles",
            PropKind::VectorXY(FloatSpec::quantized(13, 0.0, 360.0)),
        ));
    for i in 0..32 {
        table = table.prop(PropSpec::new(format!("m_iAmmo{i:03}"), PropKind::int(10, true)));
    }
    ClassRegistry::builder()
        .class("CTFPlayer", "DT_TFPlayer")
        .table(table)
        .build()
        .unwrap()
}

fn player_fields(i: u16) -> Vec<(usize, Value)> {
    let f = f32::from(i);
    vec![
        (0, Value::Int(i64::from(i % 300))),
        (1, Value::Vector(Vec3::new(f * 3.5, -f, 128.0))),
        (2, Value::VectorXY { x: 90.0, y: f }),
        (7, Value::Int(24)),
        (20, Value::Int(200)),
    ]
}

fn bench_packet_entities(c: &mut Criterion) {
    let classes = classes();
    let limits = CodecLimits::default();
    let decoder = SendPropDecoder::new(&limits);
    let player = classes.class_by_name("CTFPlayer").unwrap();
    let table = classes.table_for(player).unwrap();

    let mut encoder = PacketEntitiesEncoder::new(&classes, &limits);
    for i in 1..=32u16 {
        encoder.enter(i, player, u32::from(i), &player_fields(i)).unwrap();
    }
    let (full, full_bits) = encoder.finish(&PacketOptions::default()).unwrap();

    let mut encoder = PacketEntitiesEncoder::new(&classes, &limits);
    for i in 1..=32u16 {
        encoder.preserve(i, table, &player_fields(i + 1)).unwrap();
    }
    let (delta, delta_bits) = encoder
        .finish(&PacketOptions {
            delta_from: Some(1),
            ..PacketOptions::default()
        })
        .unwrap();

    let mut group = c.benchmark_group("packet_entities");

    group.bench_function("full_32_players", |b| {
        b.iter(|| {
            let mut state = EntityState::with_limits(&limits);
            let mut reader = BitReader::with_bit_len(&full, full_bits).unwrap();
            let decoded =
                decode_packet_entities(&mut reader, &classes, &mut state, &decoder, &limits)
                    .unwrap();
            black_box(decoded);
        });
    });

    let mut base = EntityState::with_limits(&limits);
    let mut reader = BitReader::with_bit_len(&full, full_bits).unwrap();
    decode_packet_entities(&mut reader, &classes, &mut base, &decoder, &limits).unwrap();

    group.bench_function("delta_32_players", |b| {
        b.iter(|| {
            let mut state = base.clone();
            let mut reader = BitReader::with_bit_len(&delta, delta_bits).unwrap();
            let decoded =
                decode_packet_entities(&mut reader, &classes, &mut state, &decoder, &limits)
                    .unwrap();
            black_box(decoded);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_packet_entities);
criterion_main!(benches);
