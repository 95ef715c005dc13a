//! Bounding box type in canonical XYXY pixel format.

use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax),
/// expressed in the pixel coordinate space of the source image.
///
/// The constructor does not reorder corners; use [`BBoxXYXY::ordered`] to
/// obtain the canonical form with `min <= max` on both axes.
#[derive(Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BBoxXYXY {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BBoxXYXY {
    /// Creates a new bounding box from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Creates a box from a center point and size, as emitted by YOLO heads.
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self::from_xyxy(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
    }

    /// Returns the four coordinates as `[xmin, ymin, xmax, ymax]`.
    #[inline]
    pub fn to_array(&self) -> [f64; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }

    /// Returns the width of the bounding box.
    ///
    /// May be negative if the box is malformed (xmax < xmin).
    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Returns the height of the bounding box.
    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Returns the area, or zero for degenerate boxes.
    #[inline]
    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    /// Returns true if all coordinates are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }

    /// Returns true if the box is properly ordered (min <= max for both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax
    }

    /// Returns the same rectangle with its corners swapped into min/max order.
    pub fn ordered(&self) -> Self {
        Self::from_xyxy(
            self.xmin.min(self.xmax),
            self.ymin.min(self.ymax),
            self.xmin.max(self.xmax),
            self.ymin.max(self.ymax),
        )
    }

    /// Clamps all coordinates into `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: f64, height: f64) -> Self {
        Self::from_xyxy(
            self.xmin.clamp(0.0, width),
            self.ymin.clamp(0.0, height),
            self.xmax.clamp(0.0, width),
            self.ymax.clamp(0.0, height),
        )
    }

    /// Intersection over union with another box.
    pub fn iou(&self, other: &Self) -> f64 {
        let ix = (self.xmax.min(other.xmax) - self.xmin.max(other.xmin)).max(0.0);
        let iy = (self.ymax.min(other.ymax) - self.ymin.max(other.ymin)).max(0.0);
        let inter = ix * iy;
        let union = self.area() + other.area() - inter;
        if union <= 0.0 { 0.0 } else { inter / union }
    }
}

impl std::fmt::Debug for BBoxXYXY {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

/// Renders as `[xmin, ymin, xmax, ymax]`, the list form operators see.
impl std::fmt::Display for BBoxXYXY {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{:?}, {:?}, {:?}, {:?}]",
            self.xmin, self.ymin, self.xmax, self.ymax
        )
    }
}
