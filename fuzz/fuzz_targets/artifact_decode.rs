#![no_main]
use huff::{decompress, Artifact};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must be rejected or decoded, never panic.
    if let Ok(artifact) = Artifact::from_bytes(data) {
        let _ = decompress(&artifact);
        let _ = artifact.to_bytes();
    }
});
