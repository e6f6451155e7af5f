//! Upload normalization: decode, force RGB, scale to a fixed width and park
//! the result in a temp file for the agent client.
//!
//! The temp file belongs to [`NormalizedImage`] and is unlinked when that value
//! is dropped, whichever way the request ends.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Value for the file input's `accept` attribute.
pub const ACCEPT_FILTER: &str = ".jpg,.jpeg,.png";

/// Upper bound on pixels in the resized image (500 x 40000 RGB is 60 MB).
pub const MAX_OUTPUT_PIXELS: u64 = 20_000_000;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("the uploaded file is empty")]
    Empty,

    #[error("unsupported image format ({0}); upload a JPEG or PNG")]
    UnsupportedFormat(String),

    #[error("{0}")]
    Decode(String),

    #[error("image is too tall to scale ({width}x{height} exceeds the pixel limit)")]
    TooLarge { width: u32, height: u32 },

    #[error("failed to write normalized image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("temporary file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image worker failed: {0}")]
    Worker(String),
}

/// RGB PNG on disk, removed when dropped.
#[derive(Debug)]
pub struct NormalizedImage {
    file: NamedTempFile,
    width: u32,
    height: u32,
}

impl NormalizedImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Height that keeps the aspect ratio at `target_width`, never below one row.
/// Saturates at `u32::MAX`.
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    let scaled = (f64::from(target_width) / f64::from(width.max(1)) * f64::from(height)).round();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        (scaled as u32).max(1)
    }
}

pub fn normalize_upload(bytes: &[u8], max_width: u32) -> Result<NormalizedImage, IngestionError> {
    if bytes.is_empty() {
        return Err(IngestionError::Empty);
    }

    let format = image::guess_format(bytes)
        .map_err(|_| IngestionError::UnsupportedFormat("unrecognized".to_string()))?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        return Err(IngestionError::UnsupportedFormat(format!("{:?}", format)));
    }

    let decoded = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| IngestionError::Decode(e.to_string()))?;

    let height = scaled_height(decoded.width(), decoded.height(), max_width);
    if u64::from(max_width) * u64::from(height) > MAX_OUTPUT_PIXELS {
        return Err(IngestionError::TooLarge {
            width: max_width,
            height,
        });
    }

    let rgb = DynamicImage::ImageRgb8(decoded.to_rgb8());
    let resized = rgb.resize_exact(max_width, height, FilterType::CatmullRom);

    let mut file = tempfile::Builder::new()
        .prefix("scan-")
        .suffix(".png")
        .tempfile()?;
    resized.write_to(&mut file, ImageFormat::Png)?;

    tracing::debug!(
        source_format = ?format,
        source_width = decoded.width(),
        source_height = decoded.height(),
        width = max_width,
        height,
        path = %file.path().display(),
        "Normalized uploaded image"
    );

    Ok(NormalizedImage {
        file,
        width: max_width,
        height,
    })
}

/// [`normalize_upload`] on the blocking pool; decoding large scans is CPU bound.
pub async fn normalize_upload_blocking(
    bytes: Vec<u8>,
    max_width: u32,
) -> Result<NormalizedImage, IngestionError> {
    tokio::task::spawn_blocking(move || normalize_upload(&bytes, max_width))
        .await
        .map_err(|e| IngestionError::Worker(e.to_string()))?
}
