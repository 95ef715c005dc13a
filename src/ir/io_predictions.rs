//! JSON format for precomputed detector output.
//!
//! A predictions file holds the candidate detections a model produced for one
//! image, before any confidence gating, together with the model's class-name
//! table:
//!
//! ```json
//! {
//!   "names": {"0": "stone"},
//!   "detections": [
//!     {"class_id": 0, "confidence": 0.91,
//!      "bbox": {"xmin": 10.0, "ymin": 10.0, "xmax": 50.0, "ymax": 50.0}}
//!   ]
//! }
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::model::{ClassNames, RawDetection};
use crate::error::StoneScanError;

/// Contents of a predictions file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    /// Class-name table of the model that produced the candidates.
    #[serde(default, skip_serializing_if = "ClassNames::is_empty")]
    pub names: ClassNames,

    /// Candidates in model emission order.
    pub detections: Vec<RawDetection>,
}

/// Reads a predictions file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_predictions_json(path: &Path) -> Result<Predictions, StoneScanError> {
    let file = File::open(path).map_err(StoneScanError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|source| StoneScanError::PredictionsParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses predictions from a byte slice.
pub fn from_json_slice(bytes: &[u8]) -> Result<Predictions, serde_json::Error> {
    serde_json::from_slice(bytes)
}

/// Parses predictions from a string.
pub fn from_json_str(json: &str) -> Result<Predictions, serde_json::Error> {
    serde_json::from_str(json)
}
