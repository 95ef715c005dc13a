//! Raw detector output to presentable detections.

use crate::ir::{ClassNames, Detection, RawDetection};

/// Converts one raw detection into a [`Detection`].
///
/// The confidence is clamped into `[0, 1]` and the box corners are put in
/// min/max order. The class name comes from `names`, or is synthesized as
/// `"Class {id}"`; a missing name never fails.
pub fn normalize(raw: &RawDetection, names: &ClassNames) -> Detection {
    Detection::new(
        raw.class_id,
        names.resolve(raw.class_id),
        raw.confidence.clamp(0.0, 1.0),
        raw.bbox.ordered(),
    )
}

/// Normalizes a batch, preserving order and length.
pub fn normalize_all(raw: &[RawDetection], names: &ClassNames) -> Vec<Detection> {
    raw.iter().map(|r| normalize(r, names)).collect()
}
