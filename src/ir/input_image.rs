//! Input image loading.
//!
//! Images are probed with `imagesize` before decoding so that oversized
//! inputs are rejected without allocating the full pixel buffer.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ColorType, DynamicImage, ImageFormat, ImageReader};
use serde::Serialize;

use crate::error::StoneScanError;

/// Raster formats accepted as detector input.
pub const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::WebP,
];

/// Default decode guard: 100 megapixels.
pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;

/// A decoded image, immutable for the duration of one request.
#[derive(Clone, Debug)]
pub struct InputImage {
    source: PathBuf,
    format: ImageFormat,
    pixels: DynamicImage,
}

/// Summary of an input image as shown to operators.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: String,
    pub mode: String,
}

impl InputImage {
    /// Loads and decodes an image file.
    pub fn open(path: &Path, max_pixels: u64) -> Result<Self, StoneScanError> {
        let size = imagesize::size(path).map_err(|source| StoneScanError::ImageProbe {
            path: path.to_path_buf(),
            source,
        })?;
        check_pixel_budget(path, size.width as u64, size.height as u64, max_pixels)?;

        let bytes = std::fs::read(path).map_err(StoneScanError::Io)?;
        Self::decode(path, &bytes)
    }

    /// Decodes an image held in memory. `label` names the source in errors.
    pub fn from_bytes(
        label: &Path,
        bytes: &[u8],
        max_pixels: u64,
    ) -> Result<Self, StoneScanError> {
        let size = imagesize::blob_size(bytes).map_err(|source| StoneScanError::ImageProbe {
            path: label.to_path_buf(),
            source,
        })?;
        check_pixel_budget(label, size.width as u64, size.height as u64, max_pixels)?;

        Self::decode(label, bytes)
    }

    /// Wraps an already-decoded image.
    pub fn from_dynamic(
        source: impl Into<PathBuf>,
        format: ImageFormat,
        pixels: DynamicImage,
    ) -> Self {
        Self {
            source: source.into(),
            format,
            pixels,
        }
    }

    fn decode(path: &Path, bytes: &[u8]) -> Result<Self, StoneScanError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(StoneScanError::Io)?;

        let format = reader
            .format()
            .ok_or_else(|| StoneScanError::UnsupportedImageFormat {
                path: path.to_path_buf(),
                format: "unknown".to_string(),
            })?;

        if !SUPPORTED_FORMATS.contains(&format) {
            return Err(StoneScanError::UnsupportedImageFormat {
                path: path.to_path_buf(),
                format: format_name(format),
            });
        }

        let pixels = reader.decode().map_err(|source| StoneScanError::ImageDecode {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            source: path.to_path_buf(),
            format,
            pixels,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn color_type(&self) -> ColorType {
        self.pixels.color()
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn info(&self) -> ImageInfo {
        ImageInfo {
            width: self.width(),
            height: self.height(),
            format: format_name(self.format),
            mode: color_mode(self.color_type()).to_string(),
        }
    }
}

fn check_pixel_budget(
    path: &Path,
    width: u64,
    height: u64,
    max_pixels: u64,
) -> Result<(), StoneScanError> {
    if width.saturating_mul(height) > max_pixels {
        return Err(StoneScanError::ImageTooLarge {
            path: path.to_path_buf(),
            width,
            height,
            max_pixels,
        });
    }
    Ok(())
}

fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG".to_string(),
        ImageFormat::Png => "PNG".to_string(),
        ImageFormat::Bmp => "BMP".to_string(),
        ImageFormat::WebP => "WEBP".to_string(),
        other => format!("{:?}", other).to_uppercase(),
    }
}

/// Channel layout label in the conventional short form (RGB, RGBA, L, ...).
fn color_mode(color: ColorType) -> &'static str {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F",
        ColorType::Rgba32F => "RGBA;F",
        _ => "unknown",
    }
}
