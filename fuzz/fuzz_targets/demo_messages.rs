#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let limits = wire::Limits::for_testing();
    let mut messages = wire::MessageReader::new(bitstream::BitReader::new(data), &limits);
    while let Ok(Some(message)) = messages.next_message() {
        assert!(message.payload.bit_len() <= limits.max_message_bytes * 8);
    }
    assert!(messages.messages_read() <= limits.max_messages);
});
