//! Pixel buffers and codecs.
//!
//! All buffers are `image::RgbaImage`: dense, row-major RGBA bytes. Each tile
//! gets a freshly allocated buffer that is dropped once it has been written.

use std::io::Cursor;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{PyramidError, Result};
use crate::geometry::{HALF_TILE, TILE_SIZE};

/// Resize filter used when folding a tile into a quadrant of the level below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownsampleFilter {
    /// Nearest neighbour
    Nearest,
    /// Linear (bilinear-equivalent) filter
    #[default]
    Triangle,
    /// Cubic Catmull-Rom filter
    CatmullRom,
}

impl From<DownsampleFilter> for FilterType {
    fn from(filter: DownsampleFilter) -> Self {
        match filter {
            DownsampleFilter::Nearest => FilterType::Nearest,
            DownsampleFilter::Triangle => FilterType::Triangle,
            DownsampleFilter::CatmullRom => FilterType::CatmullRom,
        }
    }
}

/// Decode the source image at `path` into RGBA.
///
/// # Errors
/// Returns [`PyramidError::Io`] if the file is missing or unreadable and
/// [`PyramidError::Image`] if it cannot be decoded.
pub fn load_source_image(path: &Path) -> Result<RgbaImage> {
    let bytes = std::fs::read(path).map_err(|e| PyramidError::io(path, e))?;
    let image = image::load_from_memory(&bytes)
        .map_err(|e| PyramidError::image(format!("decoding {}", path.display()), e))?;
    Ok(image.into_rgba8())
}

/// A transparent 256×256 tile buffer.
#[must_use]
pub fn blank_tile() -> RgbaImage {
    RgbaImage::new(TILE_SIZE, TILE_SIZE)
}

/// Encode a tile as PNG.
///
/// # Errors
/// Returns [`PyramidError::Image`] if encoding fails.
pub fn encode_png(tile: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(tile.as_raw(), tile.width(), tile.height(), ExtendedColorType::Rgba8)
        .map_err(|e| PyramidError::image("encoding PNG tile", e))?;
    Ok(bytes)
}

/// Decode PNG bytes into RGBA.
///
/// # Errors
/// Returns [`PyramidError::Image`] if the bytes are not a valid PNG.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load(Cursor::new(bytes), ImageFormat::Png)
        .map_err(|e| PyramidError::image("decoding PNG tile", e))?;
    Ok(image.into_rgba8())
}

/// Scale `parent` to a 128×128 quadrant and write it into `child` at `(dx, dy)`.
///
/// `dx` and `dy` are 0 or 1; the quadrant's pixels replace whatever `child` held there.
pub fn draw_quadrant(child: &mut RgbaImage, parent: &RgbaImage, dx: u32, dy: u32, filter: DownsampleFilter) {
    let scaled = if parent.dimensions() == (HALF_TILE, HALF_TILE) {
        parent.clone()
    } else {
        imageops::resize(parent, HALF_TILE, HALF_TILE, filter.into())
    };
    imageops::replace(child, &scaled, i64::from(dx * HALF_TILE), i64::from(dy * HALF_TILE));
}
