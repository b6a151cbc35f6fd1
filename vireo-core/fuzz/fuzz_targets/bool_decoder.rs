#![no_main]

use libfuzzer_sys::fuzz_target;

use vireo_core::io::{BoolDecoder, ReadPrimitives, SymbolDecoder};

fuzz_target!(|data: &[u8]| {
    let Ok(mut reader) = BoolDecoder::new(data) else {
        return;
    };

    // Read well past the end of the buffer. Reads past the end must never panic.
    let reads = data.len() * 8 + 256;

    for i in 0..reads {
        match i % 4 {
            0 => {
                reader.read_bool(((i * 37) % 255 + 1) as u8);
            }
            1 => {
                reader.read_literal((i % 17) as u32);
            }
            2 => {
                reader.read_primitive_quniform((i % 300) as u16);
            }
            _ => {
                reader.read_primitive_symmetric((i % 9) as u32);
            }
        }
    }

    assert!(reader.find_end() <= data.len());
});
