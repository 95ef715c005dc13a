//! Fuzz target for YOLO head decoding.
//!
//! The first byte picks the class count; the rest is read as little-endian
//! f32 values, including NaN and infinities.

#![no_main]

use libfuzzer_sys::fuzz_target;
use stonescan::detector::yolo::fuzz_decode_head;

fuzz_target!(|data: &[u8]| {
    let Some((&classes, rest)) = data.split_first() else {
        return;
    };
    let features = 4 + (classes as usize % 8) + 1;
    let values: Vec<f32> = rest
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let anchors = values.len() / features;

    let _ = fuzz_decode_head(&values[..anchors * features], features, anchors);
});
