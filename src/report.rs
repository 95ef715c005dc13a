//! Operator-facing summaries of a detection request.

use std::fmt;

use serde::Serialize;

use crate::ir::{BBoxXYXY, Detection, ImageInfo};
use crate::pipeline::{DetectionResult, Outcome};

/// Summary of one request, printable as text or serializable as JSON.
#[derive(Clone, Debug, Serialize)]
pub struct DetectionReport {
    pub image: ImageInfo,
    pub threshold: f64,
    #[serde(flatten)]
    pub outcome: Outcome,
    pub detections: Vec<DetectionSummary>,
}

/// One detection as shown to operators.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectionSummary {
    pub class_id: u64,
    pub class_name: String,
    pub confidence: f64,
    pub bbox: BBoxXYXY,
}

impl From<&Detection> for DetectionSummary {
    fn from(detection: &Detection) -> Self {
        Self {
            class_id: detection.class_id().as_u64(),
            class_name: detection.class_name().to_string(),
            confidence: detection.confidence(),
            bbox: *detection.bbox(),
        }
    }
}

impl DetectionReport {
    pub fn new(result: &DetectionResult) -> Self {
        Self {
            image: result.image_info().clone(),
            threshold: result.threshold().value(),
            outcome: result.outcome(),
            detections: result.detections().iter().map(DetectionSummary::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Image details block, also printed when detection is unavailable.
pub struct ImageInfoDisplay<'a>(pub &'a ImageInfo);

impl fmt::Display for ImageInfoDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.0;
        writeln!(f, "Image Info:")?;
        writeln!(f, "  Size: {} x {} pixels", info.width, info.height)?;
        writeln!(f, "  Format: {}", info.format)?;
        writeln!(f, "  Mode: {}", info.mode)
    }
}

impl fmt::Display for DetectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", ImageInfoDisplay(&self.image))?;
        writeln!(f, "Confidence threshold: {:.2}", self.threshold)?;
        writeln!(f)?;
        writeln!(f, "{}", self.outcome)?;
        if let Some(hint) = self.outcome.hint() {
            writeln!(f, "{}", hint)?;
        }

        for (i, det) in self.detections.iter().enumerate() {
            writeln!(f)?;
            writeln!(f, "Detection {}: {}", i + 1, det.class_name)?;
            writeln!(f, "  Confidence: {:.2}%", det.confidence * 100.0)?;
            writeln!(f, "  Bounding Box: {}", det.bbox)?;
        }

        Ok(())
    }
}
