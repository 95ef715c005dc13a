//! Detection request pipeline.
//!
//! One request runs, in order: detector lookup, inference at the operator's
//! threshold, normalization, annotation and aggregation. A missing model or
//! an inference failure ends the request with a [`DetectError`]; an empty
//! result does not.

mod aggregator;
mod normalizer;

pub use aggregator::{aggregate, DetectionResult, Outcome};
pub use normalizer::{normalize, normalize_all};

use tracing::{info, warn};

use crate::annotate::{annotate, AnnotationStyle};
use crate::detector::DetectorHandle;
use crate::error::DetectError;
use crate::ir::{ConfidenceThreshold, InputImage};

/// Runs detection requests against a shared [`DetectorHandle`].
#[derive(Debug)]
pub struct DetectionPipeline {
    handle: DetectorHandle,
    style: AnnotationStyle,
}

impl DetectionPipeline {
    pub fn new(handle: DetectorHandle) -> Self {
        Self {
            handle,
            style: AnnotationStyle::default(),
        }
    }

    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn handle(&self) -> &DetectorHandle {
        &self.handle
    }

    /// Handles one request. See [`handle_detection_request`].
    pub fn handle_detection_request(
        &self,
        image: &InputImage,
        threshold: ConfidenceThreshold,
    ) -> Result<DetectionResult, DetectError> {
        run(&self.handle, image, threshold, &self.style)
    }
}

/// Detects objects in `image` at `threshold` with the default drawing style.
///
/// # Errors
/// - [`DetectError::ModelUnavailable`] if the detector failed to load. The
///   load is not retried.
/// - [`DetectError::InferenceFailure`] if the detector errored on this image.
pub fn handle_detection_request(
    handle: &DetectorHandle,
    image: &InputImage,
    threshold: ConfidenceThreshold,
) -> Result<DetectionResult, DetectError> {
    run(handle, image, threshold, &AnnotationStyle::default())
}

#[tracing::instrument(
    skip_all,
    fields(image = %image.source().display(), threshold = threshold.value())
)]
fn run(
    handle: &DetectorHandle,
    image: &InputImage,
    threshold: ConfidenceThreshold,
    style: &AnnotationStyle,
) -> Result<DetectionResult, DetectError> {
    let detector = handle.get().map_err(DetectError::ModelUnavailable)?;

    let raw = detector.detect(image, threshold).map_err(|err| {
        warn!(backend = detector.name(), error = %err, "Detection failed");
        DetectError::InferenceFailure(err)
    })?;

    let detections = normalize_all(&raw, detector.class_names());
    let annotated = annotate(image.pixels(), &detections, style);
    let result = aggregate(image, detections, annotated, threshold);

    info!(count = result.count(), "Detection finished");
    Ok(result)
}
