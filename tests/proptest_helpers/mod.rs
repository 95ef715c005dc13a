#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, RgbImage};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use stonescan::detector::{Detector, DetectorHandle, PredictionsDetector};
use stonescan::ir::io_predictions::Predictions;
use stonescan::ir::{BBoxXYXY, ClassNames, InputImage, RawDetection};

pub const IMAGE_WIDTH: u32 = 640;
pub const IMAGE_HEIGHT: u32 = 480;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_bbox() -> impl Strategy<Value = BBoxXYXY> {
    (
        0.0..(IMAGE_WIDTH as f64),
        0.0..(IMAGE_HEIGHT as f64),
        0.0..200.0f64,
        0.0..200.0f64,
    )
        .prop_map(|(x, y, w, h)| BBoxXYXY::from_xyxy(x, y, x + w, y + h))
}

pub fn arb_raw_detection() -> impl Strategy<Value = RawDetection> {
    (0u64..8, 0.0..=1.0f64, arb_bbox())
        .prop_map(|(class, confidence, bbox)| RawDetection::new(class, confidence, bbox))
}

pub fn arb_raw_detections(max: usize) -> impl Strategy<Value = Vec<RawDetection>> {
    prop::collection::vec(arb_raw_detection(), 0..=max)
}

/// Operator-range threshold on the 0.05 grid.
pub fn arb_operator_threshold() -> impl Strategy<Value = f64> {
    (2u32..=20).prop_map(|step| step as f64 * 0.05)
}

pub fn blank_image() -> InputImage {
    InputImage::from_dynamic(
        "scan.png",
        ImageFormat::Png,
        DynamicImage::ImageRgb8(RgbImage::new(IMAGE_WIDTH, IMAGE_HEIGHT)),
    )
}

/// Handle over a fixed candidate list, as a live model would produce it.
pub fn replay_handle(candidates: Vec<RawDetection>) -> DetectorHandle {
    let predictions = Predictions {
        names: ClassNames::from_sequence(["stone", "cyst"]),
        detections: candidates,
    };
    DetectorHandle::new(move || {
        Ok(Box::new(PredictionsDetector::from_predictions("memory", predictions.clone()))
            as Box<dyn Detector>)
    })
}
