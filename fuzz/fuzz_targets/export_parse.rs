//! Fuzz target for detection export parsing.
//!
//! Arbitrary text must either parse into rows or fail cleanly.

#![no_main]

use libfuzzer_sys::fuzz_target;
use stonescan::export::parse_export;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = parse_export(text);
});
