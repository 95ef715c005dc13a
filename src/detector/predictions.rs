//! Detector that replays precomputed predictions.

use std::path::{Path, PathBuf};

use tracing::debug;

use super::Detector;
use crate::error::{InferenceError, LoadError};
use crate::ir::io_predictions::{read_predictions_json, Predictions};
use crate::ir::{ClassNames, ConfidenceThreshold, InputImage, RawDetection};

/// Serves candidates recorded from an earlier model run.
///
/// Candidates are stored ungated; `detect` applies the confidence threshold
/// the same way a live model would, so raising the threshold only ever
/// removes detections.
#[derive(Clone, Debug)]
pub struct PredictionsDetector {
    source: PathBuf,
    predictions: Predictions,
}

impl PredictionsDetector {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let predictions = read_predictions_json(path).map_err(|err| LoadError::Backend {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        Ok(Self::from_predictions(path, predictions))
    }

    pub fn from_predictions(source: impl Into<PathBuf>, predictions: Predictions) -> Self {
        Self {
            source: source.into(),
            predictions,
        }
    }
}

impl Detector for PredictionsDetector {
    fn detect(
        &self,
        image: &InputImage,
        threshold: ConfidenceThreshold,
    ) -> Result<Vec<RawDetection>, InferenceError> {
        let detections: Vec<RawDetection> = self
            .predictions
            .detections
            .iter()
            .filter(|raw| threshold.admits(raw.confidence))
            .copied()
            .collect();

        debug!(
            predictions = %self.source.display(),
            image = %image.source().display(),
            candidates = self.predictions.detections.len(),
            kept = detections.len(),
            "Replayed predictions"
        );

        Ok(detections)
    }

    fn class_names(&self) -> &ClassNames {
        &self.predictions.names
    }

    fn name(&self) -> &str {
        "predictions"
    }
}
