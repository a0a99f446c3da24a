//! Image resizing and re-encoding.
//!
//! Every upload produces two JPEGs from the same decoded source:
//!
//! - **Main image**: scaled to fit inside 800×800, never enlarged, quality 90.
//! - **Thumbnail**: scaled and center-cropped to exactly 150×150, quality 80.
//!
//! Sources with an alpha channel are flattened to RGB since JPEG has no alpha.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};

use crate::error::MediaError;

/// Bounding box of the main image.
pub const MAIN_MAX_DIMENSION: u32 = 800;

/// JPEG quality of the main image.
pub const MAIN_QUALITY: u8 = 90;

/// Edge length of the square thumbnail.
pub const THUMBNAIL_DIMENSION: u32 = 150;

/// JPEG quality of the thumbnail.
pub const THUMBNAIL_QUALITY: u8 = 80;

/// Encoded output of one processed upload.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub main: Bytes,
    pub thumbnail: Bytes,
}

// =============================================================================
// Processor
// =============================================================================

/// Stateless image processor. Work is CPU-bound; callers on the async runtime
/// should run it via `spawn_blocking`.
#[derive(Debug, Clone, Default)]
pub struct ImageProcessor {}

impl ImageProcessor {
    pub fn new() -> Self {
        Self {}
    }

    /// Decode `source` (any supported format) and produce both renditions.
    pub fn process(&self, source: &[u8]) -> Result<ProcessedImage, MediaError> {
        let img = decode(source)?;

        let main = fit_inside(&img, MAIN_MAX_DIMENSION);
        let thumbnail = img.resize_to_fill(
            THUMBNAIL_DIMENSION,
            THUMBNAIL_DIMENSION,
            FilterType::Lanczos3,
        );

        Ok(ProcessedImage {
            main: encode_jpeg(&main, MAIN_QUALITY)?,
            thumbnail: encode_jpeg(&thumbnail, THUMBNAIL_QUALITY)?,
        })
    }
}

fn decode(source: &[u8]) -> Result<DynamicImage, MediaError> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| MediaError::Decode {
            message: e.to_string(),
        })?;

    reader.decode().map_err(|e| MediaError::Decode {
        message: e.to_string(),
    })
}

/// Scale down to fit a `max`×`max` box, preserving aspect ratio.
fn fit_inside(img: &DynamicImage, max: u32) -> DynamicImage {
    if img.width() <= max && img.height() <= max {
        return img.clone();
    }
    img.resize(max, max, FilterType::Lanczos3)
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, MediaError> {
    let rgb = img.to_rgb8();

    let mut output = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut output, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| MediaError::Encode {
            message: e.to_string(),
        })?;

    Ok(Bytes::from(output))
}
