//! YOLO pre- and post-processing shared by model backends.
//!
//! Kept free of any inference runtime so the geometry can be tested on its
//! own: letterbox fitting, CHW tensor packing, head decoding and per-class
//! non-maximum suppression.

use image::DynamicImage;
use image::imageops::FilterType;

use crate::error::InferenceError;
use crate::ir::{BBoxXYXY, ClassId, ConfidenceThreshold, RawDetection};

/// Gray used for letterbox padding (114/255).
pub const PAD_VALUE: f32 = 114.0 / 255.0;

/// Scale and padding that map a source image into a square model input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    pub scale: f32,
    /// Left offset of the resized image inside the model input, in pixels.
    pub pad_x: u32,
    /// Top offset of the resized image inside the model input, in pixels.
    pub pad_y: u32,
    pub new_width: u32,
    pub new_height: u32,
    pub orig_width: u32,
    pub orig_height: u32,
    pub input_size: u32,
}

impl Letterbox {
    /// Fits `orig_width x orig_height` into `input_size x input_size`
    /// preserving aspect ratio, centered. Odd padding puts the extra pixel
    /// on the right/bottom.
    pub fn fit(orig_width: u32, orig_height: u32, input_size: u32) -> Self {
        let scale = (input_size as f32 / orig_width.max(1) as f32)
            .min(input_size as f32 / orig_height.max(1) as f32);

        let new_width = ((orig_width as f32 * scale).round() as u32).clamp(1, input_size);
        let new_height = ((orig_height as f32 * scale).round() as u32).clamp(1, input_size);

        Self {
            scale,
            pad_x: (input_size - new_width) / 2,
            pad_y: (input_size - new_height) / 2,
            new_width,
            new_height,
            orig_width,
            orig_height,
            input_size,
        }
    }

    /// Maps a box from model-input space back to source pixels, clamped to
    /// the source image.
    pub fn unmap(&self, bbox: BBoxXYXY) -> BBoxXYXY {
        let scale = self.scale as f64;
        let pad_x = self.pad_x as f64;
        let pad_y = self.pad_y as f64;
        BBoxXYXY::from_xyxy(
            (bbox.xmin - pad_x) / scale,
            (bbox.ymin - pad_y) / scale,
            (bbox.xmax - pad_x) / scale,
            (bbox.ymax - pad_y) / scale,
        )
        .clamp_to(self.orig_width as f64, self.orig_height as f64)
    }
}

/// Resizes `image` into a letterboxed, normalized `[3, size, size]` tensor
/// in row-major CHW order.
pub fn letterbox_tensor(image: &DynamicImage, input_size: u32) -> (Vec<f32>, Letterbox) {
    let lb = Letterbox::fit(image.width(), image.height(), input_size);
    let rgb = image
        .resize_exact(lb.new_width, lb.new_height, FilterType::Triangle)
        .to_rgb8();

    let size = input_size as usize;
    let plane = size * size;
    let mut tensor = vec![PAD_VALUE; 3 * plane];

    let offset_x = lb.pad_x as usize;
    let offset_y = lb.pad_y as usize;
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let (tx, ty) = (offset_x + x as usize, offset_y + y as usize);
        if tx >= size || ty >= size {
            continue;
        }
        let idx = ty * size + tx;
        for channel in 0..3 {
            tensor[channel * plane + idx] = pixel[channel] as f32 / 255.0;
        }
    }

    (tensor, lb)
}

/// Post-processing limits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecodeOptions {
    /// Overlap above which a lower-scored box of the same class is dropped.
    pub iou_threshold: f64,
    /// Upper bound on returned detections.
    pub max_detections: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}

/// Decodes a YOLOv8-style head of shape `[4 + classes, anchors]`
/// (row-major) into detections in source-image pixels.
///
/// Rows 0..4 hold `cx, cy, w, h` in model-input pixels; the remaining rows
/// hold per-class scores. Results are sorted by descending confidence after
/// per-class NMS, which is the order the model reports them in.
pub fn decode_head(
    data: &[f32],
    features: usize,
    anchors: usize,
    threshold: ConfidenceThreshold,
    letterbox: &Letterbox,
    options: &DecodeOptions,
) -> Result<Vec<RawDetection>, InferenceError> {
    if features < 5 {
        return Err(InferenceError::InvalidOutput(format!(
            "expected at least 5 features per anchor, got {}",
            features
        )));
    }
    if data.len() != features * anchors {
        return Err(InferenceError::InvalidOutput(format!(
            "expected {} values for [{}, {}], got {}",
            features * anchors,
            features,
            anchors,
            data.len()
        )));
    }

    let at = |feature: usize, anchor: usize| data[feature * anchors + anchor];

    let mut candidates = Vec::new();
    for anchor in 0..anchors {
        let (best_class, best_score) = (4..features)
            .map(|f| (f - 4, at(f, anchor)))
            .fold((0usize, f32::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 { cur } else { best }
            });

        let score = best_score as f64;
        if !score.is_finite() || !threshold.admits(score) {
            continue;
        }

        let bbox = BBoxXYXY::from_cxcywh(
            at(0, anchor) as f64,
            at(1, anchor) as f64,
            at(2, anchor) as f64,
            at(3, anchor) as f64,
        );
        if !bbox.is_finite() {
            continue;
        }

        candidates.push(RawDetection::new(
            ClassId(best_class as u64),
            score.min(1.0),
            letterbox.unmap(bbox),
        ));
    }

    Ok(non_max_suppression(candidates, options))
}

/// Fuzz-only entrypoint for head decoding on a square 640 input.
#[cfg(feature = "fuzzing")]
pub fn fuzz_decode_head(
    data: &[f32],
    features: usize,
    anchors: usize,
) -> Result<(), InferenceError> {
    let letterbox = Letterbox::fit(640, 480, 640);
    let _ = decode_head(
        data,
        features,
        anchors,
        ConfidenceThreshold::default(),
        &letterbox,
        &DecodeOptions::default(),
    )?;
    Ok(())
}

/// Greedy per-class NMS; output is sorted by descending confidence.
pub fn non_max_suppression(
    mut candidates: Vec<RawDetection>,
    options: &DecodeOptions,
) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<RawDetection> = Vec::new();
    for candidate in candidates {
        if kept.len() >= options.max_detections {
            break;
        }
        let suppressed = kept.iter().any(|k| {
            k.class_id == candidate.class_id && k.bbox.iou(&candidate.bbox) > options.iou_threshold
        });
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_letterbox_wide_image() {
        let lb = Letterbox::fit(1280, 640, 640);
        assert_eq!(lb.scale, 0.5);
        assert_eq!((lb.new_width, lb.new_height), (640, 320));
        assert_eq!((lb.pad_x, lb.pad_y), (0, 160));
    }

    #[test]
    fn test_unmap_inverts_letterbox() {
        let lb = Letterbox::fit(1280, 640, 640);
        let mapped = BBoxXYXY::from_xyxy(10.0, 170.0, 60.0, 220.0);
        assert_eq!(
            lb.unmap(mapped),
            BBoxXYXY::from_xyxy(20.0, 20.0, 120.0, 120.0)
        );
    }

    #[test]
    fn test_letterbox_tensor_pads_and_normalizes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 2, Rgb([255, 0, 0])));
        let (tensor, lb) = letterbox_tensor(&img, 4);

        assert_eq!(tensor.len(), 3 * 16);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 1));
        // Row 0 is padding, row 1 is image.
        assert_eq!(tensor[0], PAD_VALUE);
        assert_eq!(tensor[4], 1.0);
        assert_eq!(tensor[16 + 4], 0.0);
    }

    #[test]
    fn test_odd_padding_places_and_unmaps_consistently() {
        // 8x5 into 8x8 leaves 3 rows of padding: 1 above, 2 below.
        let mut img = RgbImage::new(8, 5);
        for x in 0..8 {
            img.put_pixel(x, 0, Rgb([255, 255, 255]));
        }
        let (tensor, lb) = letterbox_tensor(&DynamicImage::ImageRgb8(img), 8);
        assert_eq!(lb.pad_y, 1);

        // Source row 0 sits at tensor row 1.
        assert_eq!(tensor[8], 1.0);
        assert_eq!(tensor[0], PAD_VALUE);
        assert_eq!(tensor[16], 0.0);

        let row = lb.unmap(BBoxXYXY::from_xyxy(0.0, 1.0, 8.0, 2.0));
        assert_eq!(row, BBoxXYXY::from_xyxy(0.0, 0.0, 8.0, 1.0));
    }

    /// Builds a `[4 + classes, anchors]` head from per-anchor rows.
    fn head(rows: &[[f32; 6]]) -> Vec<f32> {
        let anchors = rows.len();
        let mut data = vec![0.0; 6 * anchors];
        for (a, row) in rows.iter().enumerate() {
            for (f, value) in row.iter().enumerate() {
                data[f * anchors + a] = *value;
            }
        }
        data
    }

    #[test]
    fn test_decode_gates_by_threshold_and_picks_best_class() {
        let lb = Letterbox::fit(640, 640, 640);
        let data = head(&[
            [30.0, 30.0, 40.0, 40.0, 0.10, 0.91],
            [200.0, 200.0, 20.0, 20.0, 0.30, 0.05],
        ]);

        let t = ConfidenceThreshold::new(0.4).unwrap();
        let out = decode_head(&data, 6, 2, t, &lb, &DecodeOptions::default()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].class_id, ClassId(1));
        assert!((out[0].confidence - 0.91).abs() < 1e-6);
        assert_eq!(out[0].bbox, BBoxXYXY::from_xyxy(10.0, 10.0, 50.0, 50.0));
    }

    #[test]
    fn test_decode_rejects_mismatched_shape() {
        let lb = Letterbox::fit(640, 640, 640);
        let t = ConfidenceThreshold::new(0.4).unwrap();
        let err = decode_head(&[0.0; 10], 6, 2, t, &lb, &DecodeOptions::default()).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidOutput(_)));
    }

    #[test]
    fn test_nms_suppresses_same_class_only() {
        let a = RawDetection::new(0u64, 0.9, BBoxXYXY::from_xyxy(0.0, 0.0, 10.0, 10.0));
        let b = RawDetection::new(0u64, 0.8, BBoxXYXY::from_xyxy(1.0, 0.0, 11.0, 10.0));
        let c = RawDetection::new(1u64, 0.7, BBoxXYXY::from_xyxy(1.0, 0.0, 11.0, 10.0));

        let kept = non_max_suppression(vec![b, c, a], &DecodeOptions::default());
        assert_eq!(kept, vec![a, c]);
    }

    #[test]
    fn test_nms_caps_detections() {
        let boxes: Vec<RawDetection> = (0..5)
            .map(|i| {
                let x = i as f64 * 100.0;
                RawDetection::new(0u64, 0.5, BBoxXYXY::from_xyxy(x, 0.0, x + 10.0, 10.0))
            })
            .collect();
        let options = DecodeOptions {
            max_detections: 3,
            ..Default::default()
        };
        assert_eq!(non_max_suppression(boxes, &options).len(), 3);
    }
}
