//! Per-image result assembly.

use std::fmt;

use image::RgbImage;
use serde::Serialize;

use crate::ir::{ConfidenceThreshold, Detection, ImageInfo, InputImage};

/// How a detection request turned out.
///
/// `NoDetections` is a valid result, not an error: the operator should
/// reconsider the threshold or the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "count", rename_all = "snake_case")]
pub enum Outcome {
    NoDetections,
    DetectionsFound(usize),
}

impl Outcome {
    /// Short status line for operators.
    pub fn message(&self) -> String {
        match self {
            Outcome::NoDetections => "No detections found in this image".to_string(),
            Outcome::DetectionsFound(count) => {
                format!("Found {} potential detection(s)", count)
            }
        }
    }

    /// Follow-up hint, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Outcome::NoDetections => {
                Some("Try adjusting the confidence threshold or use a different image")
            }
            Outcome::DetectionsFound(_) => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Everything produced for one image at one threshold.
#[derive(Clone, Debug)]
pub struct DetectionResult {
    image: ImageInfo,
    threshold: ConfidenceThreshold,
    detections: Vec<Detection>,
    annotated: RgbImage,
}

impl DetectionResult {
    /// Detections in detector emission order.
    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn count(&self) -> usize {
        self.detections.len()
    }

    pub fn outcome(&self) -> Outcome {
        match self.count() {
            0 => Outcome::NoDetections,
            n => Outcome::DetectionsFound(n),
        }
    }

    /// The input image with detections drawn on it.
    pub fn annotated(&self) -> &RgbImage {
        &self.annotated
    }

    pub fn image_info(&self) -> &ImageInfo {
        &self.image
    }

    /// Threshold the detector was run with.
    pub fn threshold(&self) -> ConfidenceThreshold {
        self.threshold
    }
}

/// Groups the normalized detections of one image into a [`DetectionResult`].
///
/// Order is kept as given; nothing is filtered, deduplicated or re-sorted.
pub fn aggregate(
    image: &InputImage,
    detections: Vec<Detection>,
    annotated: RgbImage,
    threshold: ConfidenceThreshold,
) -> DetectionResult {
    DetectionResult {
        image: image.info(),
        threshold,
        detections,
        annotated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BBoxXYXY, ClassNames, RawDetection};
    use crate::pipeline::normalize_all;
    use image::{DynamicImage, ImageFormat};

    fn input() -> InputImage {
        InputImage::from_dynamic(
            "scan.png",
            ImageFormat::Png,
            DynamicImage::ImageRgb8(RgbImage::new(64, 48)),
        )
    }

    #[test]
    fn test_empty_is_no_detections() {
        let img = input();
        let result = aggregate(
            &img,
            Vec::new(),
            RgbImage::new(64, 48),
            ConfidenceThreshold::default(),
        );

        assert_eq!(result.count(), 0);
        assert_eq!(result.outcome(), Outcome::NoDetections);
        assert!(result.outcome().hint().is_some());
    }

    #[test]
    fn test_keeps_order_and_overlaps() {
        let img = input();
        let same = BBoxXYXY::from_xyxy(1.0, 1.0, 10.0, 10.0);
        let raw = [
            RawDetection::new(0u64, 0.2, same),
            RawDetection::new(0u64, 0.9, same),
            RawDetection::new(0u64, 0.5, same),
        ];
        let detections = normalize_all(&raw, ClassNames::empty());
        let threshold = ConfidenceThreshold::operator(0.15).unwrap();
        let result = aggregate(&img, detections, RgbImage::new(64, 48), threshold);

        let confidences: Vec<f64> = result.detections().iter().map(|d| d.confidence()).collect();
        assert_eq!(confidences, vec![0.2, 0.9, 0.5]);
        assert_eq!(result.outcome(), Outcome::DetectionsFound(3));
        assert_eq!(result.image_info().width, 64);
        assert_eq!(result.threshold(), threshold);
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(
            Outcome::DetectionsFound(2).to_string(),
            "Found 2 potential detection(s)"
        );
        assert_eq!(
            serde_json::to_string(&Outcome::DetectionsFound(2)).unwrap(),
            r#"{"outcome":"detections_found","count":2}"#
        );
        assert_eq!(
            serde_json::to_string(&Outcome::NoDetections).unwrap(),
            r#"{"outcome":"no_detections"}"#
        );
    }
}
