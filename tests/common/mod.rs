#![allow(dead_code)]

use std::fs;
use std::path::Path;

/// Uncompressed 24-bit BMP, all black.
pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Two stones above the default threshold and one faint candidate below it.
pub const STONE_PREDICTIONS: &str = r#"{
  "names": {"0": "stone"},
  "detections": [
    {"class_id": 0, "confidence": 0.91,
     "bbox": {"xmin": 10.0, "ymin": 10.0, "xmax": 50.0, "ymax": 50.0}},
    {"class_id": 0, "confidence": 0.42,
     "bbox": {"xmin": 60.0, "ymin": 60.0, "xmax": 120.0, "ymax": 130.0}},
    {"class_id": 0, "confidence": 0.12,
     "bbox": {"xmin": 5.0, "ymin": 5.0, "xmax": 8.0, "ymax": 8.0}}
  ]
}"#;

pub fn write_predictions(path: &Path, json: &str) {
    fs::write(path, json).expect("write predictions file");
}
