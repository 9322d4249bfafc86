#![no_main]

use bitstream::BitReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = BitReader::new(data);
    let mut idx = 0usize;

    // Use input bytes to drive a bounded sequence of operations.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 7;
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_bit();
            }
            1 => {
                let bits = data[idx.saturating_sub(1)] % 66;
                let _ = reader.read_bits(bits);
            }
            2 => {
                let _ = reader.read_i32();
            }
            3 => {
                let _ = reader.read_f32();
            }
            4 => {
                let bits = usize::from(data[idx.saturating_sub(1)]);
                if let Ok(mut sub) = reader.sub_reader(bits) {
                    let _ = codec::read_ubit_var(&mut sub);
                    assert!(sub.bit_position() <= bits);
                }
            }
            5 => {
                let _ = codec::read_pvs(&mut reader);
            }
            _ => {
                let _ = codec::read_bit_coord(&mut reader);
            }
        }
        assert!(reader.bit_position() <= reader.bit_len());
    }
});
