//! Rendering detections onto a copy of the input image.

use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::error::StoneScanError;
use crate::ir::{ClassId, Detection};

/// Box colors, cycled by class id.
const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38],
    [0xFF, 0x9D, 0x97],
    [0xFF, 0x70, 0x1F],
    [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31],
    [0x48, 0xF9, 0x0A],
    [0x92, 0xCC, 0x17],
    [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34],
    [0x00, 0xD4, 0xBB],
    [0x2C, 0x99, 0xA8],
    [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93],
    [0x64, 0x73, 0xFF],
    [0x00, 0x18, 0xEC],
    [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85],
    [0xCB, 0x38, 0xFF],
    [0xFF, 0x95, 0xC8],
    [0xFF, 0x37, 0xC7],
];

const LABEL_TEXT: Rgb<u8> = Rgb([255, 255, 255]);

/// Color used for boxes of `class_id`.
pub fn class_color(class_id: ClassId) -> Rgb<u8> {
    Rgb(PALETTE[(class_id.as_u64() % PALETTE.len() as u64) as usize])
}

/// Line width scaled to the image: 0.3% of the mean side, at least 2px.
pub fn default_line_width(width: u32, height: u32) -> u32 {
    let scaled = ((width as f64 + height as f64) / 2.0 * 0.003).round() as u32;
    scaled.max(2)
}

/// Drawing options for annotated output.
#[derive(Clone, Debug, Default)]
pub struct AnnotationStyle {
    /// Fixed line width; scaled to the image when unset.
    pub line_width: Option<u32>,
    /// Font for `"{class} {confidence}"` labels. Without one only boxes are drawn.
    pub font: Option<FontArc>,
}

impl AnnotationStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_width(mut self, line_width: u32) -> Self {
        self.line_width = Some(line_width.max(1));
        self
    }

    pub fn with_font(mut self, font: FontArc) -> Self {
        self.font = Some(font);
        self
    }

    /// Loads a TTF/OTF font for labels.
    pub fn load_font(path: &Path) -> Result<FontArc, StoneScanError> {
        let bytes = std::fs::read(path).map_err(StoneScanError::Io)?;
        FontArc::try_from_vec(bytes).map_err(|_| StoneScanError::FontLoad {
            path: path.to_path_buf(),
        })
    }
}

/// Draws every detection onto an RGB copy of `image`.
///
/// The source is never modified. Boxes are clipped to the canvas; degenerate
/// boxes are drawn as at least one pixel.
pub fn annotate(
    image: &DynamicImage,
    detections: &[Detection],
    style: &AnnotationStyle,
) -> RgbImage {
    let mut canvas = image.to_rgb8();
    let (width, height) = canvas.dimensions();
    let line_width = style
        .line_width
        .unwrap_or_else(|| default_line_width(width, height));

    for detection in detections {
        let color = class_color(detection.class_id());
        let bbox = detection.bbox().clamp_to(width as f64, height as f64);
        let x = bbox.xmin.floor() as i32;
        let y = bbox.ymin.floor() as i32;
        let w = (bbox.width().round() as u32).max(1);
        let h = (bbox.height().round() as u32).max(1);

        for t in 0..line_width {
            let inset = t as i32;
            let (rw, rh) = (w.saturating_sub(2 * t), h.saturating_sub(2 * t));
            if rw == 0 || rh == 0 {
                break;
            }
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(x + inset, y + inset).of_size(rw, rh),
                color,
            );
        }

        if let Some(font) = &style.font {
            let label = format!("{} {:.2}", detection.class_name(), detection.confidence());
            draw_label(&mut canvas, font, &label, x, y, line_width, color);
        }
    }

    canvas
}

fn draw_label(
    canvas: &mut RgbImage,
    font: &FontArc,
    label: &str,
    x: i32,
    y: i32,
    line_width: u32,
    color: Rgb<u8>,
) {
    let scale = PxScale::from((line_width as f32 * 6.0).max(12.0));
    let (text_w, text_h) = text_size(scale, font, label);
    let pad = 2;
    let box_h = text_h as i32 + 2 * pad;

    // Above the box when there is room, otherwise just inside its top edge.
    let top = if y >= box_h { y - box_h } else { y };
    draw_filled_rect_mut(
        canvas,
        Rect::at(x, top).of_size(text_w + 2 * pad as u32, box_h as u32),
        color,
    );
    draw_text_mut(canvas, LABEL_TEXT, x + pad, top + pad, scale, font, label);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BBoxXYXY, ClassNames, RawDetection};
    use crate::pipeline::normalize;

    fn gray(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([40, 40, 40])))
    }

    fn detection(class: u64, bbox: BBoxXYXY) -> Detection {
        normalize(&RawDetection::new(class, 0.9, bbox), ClassNames::empty())
    }

    #[test]
    fn test_default_line_width() {
        assert_eq!(default_line_width(100, 100), 2);
        assert_eq!(default_line_width(2000, 2000), 6);
    }

    #[test]
    fn test_no_detections_is_plain_copy() {
        let img = gray(32, 24);
        let out = annotate(&img, &[], &AnnotationStyle::new());
        assert_eq!(out, img.to_rgb8());
    }

    #[test]
    fn test_box_edges_use_class_color() {
        let img = gray(64, 64);
        let det = detection(1, BBoxXYXY::from_xyxy(10.0, 10.0, 40.0, 40.0));
        let out = annotate(&img, &[det], &AnnotationStyle::new().with_line_width(2));

        let color = class_color(ClassId(1));
        assert_eq!(*out.get_pixel(10, 10), color);
        assert_eq!(*out.get_pixel(11, 20), color);
        assert_eq!(*out.get_pixel(25, 25), Rgb([40, 40, 40]));
        // Source untouched.
        assert_eq!(img.to_rgb8().get_pixel(10, 10), &Rgb([40, 40, 40]));
    }

    #[test]
    fn test_out_of_bounds_box_is_clipped() {
        let img = gray(20, 20);
        let det = detection(0, BBoxXYXY::from_xyxy(-10.0, -10.0, 500.0, 500.0));
        let out = annotate(&img, &[det], &AnnotationStyle::new());
        assert_eq!(out.dimensions(), (20, 20));
        assert_eq!(*out.get_pixel(0, 0), class_color(ClassId(0)));
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(class_color(ClassId(0)), class_color(ClassId(20)));
        assert_ne!(class_color(ClassId(0)), class_color(ClassId(1)));
    }

    #[test]
    fn test_bad_font_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(matches!(
            AnnotationStyle::load_font(&path),
            Err(StoneScanError::FontLoad { .. })
        ));
    }
}
