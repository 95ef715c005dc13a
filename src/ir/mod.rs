//! Core value types for the detection pipeline.
//!
//! Everything that flows between the detector, the normalizer, the
//! aggregator and the exporter is defined here.
//!
//! # Design Principles
//!
//! 1. **Canonical boxes**: every box is XYXY in the source image's pixel
//!    space, regardless of what the model computes internally.
//!
//! 2. **Raw vs. normalized**: [`RawDetection`] is detector output taken
//!    verbatim; [`Detection`] is the immutable, named value shown to
//!    operators.
//!
//! 3. **Checked inputs**: thresholds and images are validated when they are
//!    constructed, so the pipeline itself never sees an out-of-range value.
//!
//! # Example
//!
//! ```
//! use stonescan::ir::{BBoxXYXY, ClassNames, RawDetection};
//!
//! let names: ClassNames = [(0u64, "stone")].into_iter().collect();
//! let raw = RawDetection::new(0u64, 0.91, BBoxXYXY::from_xyxy(10.0, 10.0, 50.0, 50.0));
//! assert_eq!(names.resolve(raw.class_id), "stone");
//! ```

mod bbox;
mod ids;
mod input_image;
pub mod io_names;
pub mod io_predictions;
mod model;
mod threshold;

pub use bbox::BBoxXYXY;
pub use ids::ClassId;
pub use input_image::{DEFAULT_MAX_PIXELS, ImageInfo, InputImage, SUPPORTED_FORMATS};
pub use model::{ClassNames, Detection, RawDetection};
pub use threshold::ConfidenceThreshold;
