use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Why the detector could not be brought up.
///
/// Load errors are memoized by [`DetectorHandle`](crate::detector::DetectorHandle)
/// and handed to every later caller, so the type is cheap to clone and
/// compares by value.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("Model file not found at: {}", path.display())]
    WeightsMissing { path: PathBuf },

    #[error("Error loading model from {}: {message}", path.display())]
    Backend { path: PathBuf, message: String },

    #[error("Cannot load {}: stonescan was built without the '{backend}' backend", path.display())]
    BackendDisabled {
        path: PathBuf,
        backend: &'static str,
    },
}

/// A detector failed while processing one request.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InferenceError {
    #[error("{0}")]
    Backend(String),

    #[error("unexpected model output: {0}")]
    InvalidOutput(String),
}

/// Failure kinds visible at the request boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ModelUnavailable,
    InferenceFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ModelUnavailable => f.write_str("model_unavailable"),
            ErrorKind::InferenceFailure => f.write_str("inference_failure"),
        }
    }
}

/// Error returned by [`handle_detection_request`](crate::pipeline::handle_detection_request).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DetectError {
    /// The detector never became ready. Determined once and cached.
    #[error("Model not loaded: {0}")]
    ModelUnavailable(#[source] LoadError),

    /// The detector raised during this request only.
    #[error("Error during detection: {0}")]
    InferenceFailure(#[source] InferenceError),
}

impl DetectError {
    /// Returns the failure kind, for callers that branch on it.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DetectError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            DetectError::InferenceFailure(_) => ErrorKind::InferenceFailure,
        }
    }
}

/// The main error type for stonescan operations.
#[derive(Debug, Error)]
pub enum StoneScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read image dimensions from {path}: {source}")]
    ImageProbe {
        path: PathBuf,
        #[source]
        source: imagesize::ImageError,
    },

    #[error("Failed to decode image {path}: {source}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Unsupported image format for {path}: {format} (supported: jpg, jpeg, png, bmp, webp)")]
    UnsupportedImageFormat { path: PathBuf, format: String },

    #[error("Image {path} is too large: {width}x{height} pixels (max: {max_pixels})")]
    ImageTooLarge {
        path: PathBuf,
        width: u64,
        height: u64,
        max_pixels: u64,
    },

    #[error("Failed to write image to {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Confidence threshold {value} is outside [{min}, {max}]")]
    InvalidThreshold { value: f64, min: f64, max: f64 },

    #[error("Failed to parse predictions JSON from {path}: {source}")]
    PredictionsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse class names from {path}: {message}")]
    ClassNamesParse { path: PathBuf, message: String },

    #[error("Failed to parse detection export: {message}")]
    ExportParse { message: String },

    #[error("Failed to write JSON report: {0}")]
    ReportWrite(#[source] serde_json::Error),

    #[error("Failed to load font from {path}")]
    FontLoad { path: PathBuf },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Detect(#[from] DetectError),
}
