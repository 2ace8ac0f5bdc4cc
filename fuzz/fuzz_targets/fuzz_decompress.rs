#![no_main]
use libfuzzer_sys::fuzz_target;
use waypoint::envelope::{decompress_with, Chunks, DecodeOptions, SaveFormat};

fuzz_target!(|data: &[u8]| {
    let compressed = SaveFormat::detect(data) == Some(SaveFormat::Compressed);
    let walked = Chunks::new(data).all(|x| x.is_ok());

    // Keep allocations small so the fuzzer doesn't chase huge headers
    let options = DecodeOptions::new().with_max_chunk_len(1 << 20);
    if let Err(e) = decompress_with(data, &options) {
        let _ = e.category();
        let _ = e.to_string();

        // A container that can't be walked fails on a specific chunk
        if compressed && !walked {
            assert!(e.chunk().is_some());
        }
    }
});
