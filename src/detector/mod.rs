//! Detector backends and the shared, load-once detector handle.
//!
//! The pipeline treats a detector as an opaque capability: given an image and
//! a threshold, return raw candidate detections. Backends:
//!
//! - [`PredictionsDetector`]: replays candidates precomputed by an external
//!   model run (JSON file).
//! - `OnnxDetector` (feature `onnx`): runs a YOLO-style ONNX export.

mod handle;
#[cfg(feature = "onnx")]
mod onnx;
mod predictions;
pub mod yolo;

pub use handle::{DetectorHandle, HandleState};
#[cfg(feature = "onnx")]
pub use onnx::OnnxDetector;
pub use predictions::PredictionsDetector;

use std::path::{Path, PathBuf};

use crate::error::{InferenceError, LoadError};
use crate::ir::{ClassNames, ConfidenceThreshold, InputImage, RawDetection};

/// Common interface for object detectors.
///
/// Implementations must be safe for concurrent reads: `detect` takes `&self`
/// and must not change observable state between calls.
pub trait Detector: Send + Sync {
    /// Runs the model on one image and returns every candidate whose
    /// confidence meets `threshold`, in the model's emission order.
    fn detect(
        &self,
        image: &InputImage,
        threshold: ConfidenceThreshold,
    ) -> Result<Vec<RawDetection>, InferenceError>;

    /// Class-name table, if the model carries one.
    fn class_names(&self) -> &ClassNames {
        ClassNames::empty()
    }

    /// Backend name, for logging.
    fn name(&self) -> &str;
}

/// Where detector weights come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DetectorSource {
    /// A predictions JSON file (see [`crate::ir::io_predictions`]).
    Predictions(PathBuf),
    /// An ONNX model file.
    Onnx(PathBuf),
}

impl DetectorSource {
    /// Picks the backend from the file extension: `.json` replays
    /// predictions, anything else is treated as an ONNX model.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            DetectorSource::Predictions(path)
        } else {
            DetectorSource::Onnx(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            DetectorSource::Predictions(path) | DetectorSource::Onnx(path) => path,
        }
    }

    /// Loads the detector. This is the expensive step the handle memoizes.
    pub fn load(&self) -> Result<Box<dyn Detector>, LoadError> {
        let path = self.path();
        if !path.exists() {
            return Err(LoadError::WeightsMissing {
                path: path.to_path_buf(),
            });
        }

        match self {
            DetectorSource::Predictions(path) => {
                Ok(Box::new(PredictionsDetector::load(path)?))
            }
            #[cfg(feature = "onnx")]
            DetectorSource::Onnx(path) => Ok(Box::new(OnnxDetector::load(
                path,
                onnx::OnnxOptions::default(),
            )?)),
            #[cfg(not(feature = "onnx"))]
            DetectorSource::Onnx(path) => Err(LoadError::BackendDisabled {
                path: path.clone(),
                backend: "onnx",
            }),
        }
    }
}

/// Wraps a detector and replaces its class-name table.
///
/// Used when names come from a dataset file rather than the model itself.
pub struct RenamedDetector {
    inner: Box<dyn Detector>,
    names: ClassNames,
}

impl RenamedDetector {
    pub fn new(inner: Box<dyn Detector>, names: ClassNames) -> Self {
        Self { inner, names }
    }
}

impl Detector for RenamedDetector {
    fn detect(
        &self,
        image: &InputImage,
        threshold: ConfidenceThreshold,
    ) -> Result<Vec<RawDetection>, InferenceError> {
        self.inner.detect(image, threshold)
    }

    fn class_names(&self) -> &ClassNames {
        &self.names
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
