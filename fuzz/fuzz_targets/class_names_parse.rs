//! Fuzz target for data.yaml and classes.txt name tables.

#![no_main]

use libfuzzer_sys::fuzz_target;
use stonescan::ir::io_names::{names_from_flow_mapping, names_from_lines, names_from_yaml};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let _ = names_from_yaml(text);
    let _ = names_from_flow_mapping(text);
    let _ = names_from_lines(text);
});
