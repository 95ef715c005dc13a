//! Plain-text export of detection results.
//!
//! One file per result, holding a single bracketed list of rows:
//!
//! ```text
//! [[10.0, 10.0, 50.0, 50.0, 0.91, 0.0], [60.0, 60.0, 120.0, 130.0, 0.42, 0.0]]
//! ```
//!
//! Each row is `[xmin, ymin, xmax, ymax, confidence, class_id]`, in the
//! result's detection order. The class id is written as a float. An empty
//! result exports as `[]`. The notation is also valid JSON, which is how
//! [`parse_export`] reads it back.

use std::fs;
use std::path::Path;

use crate::error::StoneScanError;
use crate::ir::Detection;
use crate::pipeline::DetectionResult;

/// Suggested file name for an export.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "detection_results.txt";

/// Content type of an export.
pub const EXPORT_MIME_TYPE: &str = "text/plain";

/// `[xmin, ymin, xmax, ymax, confidence, class_id]`
pub type ExportRow = [f64; 6];

/// Serializes `result` into the export notation.
pub fn export(result: &DetectionResult) -> String {
    export_detections(result.detections())
}

/// Serializes detections into the export notation.
pub fn export_detections(detections: &[Detection]) -> String {
    let rows: Vec<String> = export_rows(detections)
        .iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(|v| format!("{:?}", v)).collect();
            format!("[{}]", cells.join(", "))
        })
        .collect();
    format!("[{}]", rows.join(", "))
}

/// Numeric rows for `detections`, in order.
pub fn export_rows(detections: &[Detection]) -> Vec<ExportRow> {
    detections.iter().map(export_row).collect()
}

fn export_row(detection: &Detection) -> ExportRow {
    let [xmin, ymin, xmax, ymax] = detection.bbox().to_array();
    [
        xmin,
        ymin,
        xmax,
        ymax,
        detection.confidence(),
        detection.class_id().as_u64() as f64,
    ]
}

/// Parses export text back into rows.
pub fn parse_export(text: &str) -> Result<Vec<ExportRow>, StoneScanError> {
    serde_json::from_str(text.trim()).map_err(|e| StoneScanError::ExportParse {
        message: e.to_string(),
    })
}

/// Writes the export of `result` to `path`.
pub fn write_export(path: &Path, result: &DetectionResult) -> Result<(), StoneScanError> {
    fs::write(path, export(result)).map_err(StoneScanError::Io)
}

/// Reads and parses an export file.
pub fn read_export(path: &Path) -> Result<Vec<ExportRow>, StoneScanError> {
    let text = fs::read_to_string(path).map_err(StoneScanError::Io)?;
    parse_export(&text)
}
