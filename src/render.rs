//! Top-level tile rendering.
//!
//! Every pixel of every tile at the most detailed zoom is mapped from
//! Mercator space back into the source image through the inverse transform
//! and resampled with cubic convolution.

use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::config::{RenderOptions, TransformFailurePolicy};
use crate::error::Result;
use crate::geometry::{MercatorPoint, PixelPoint, TileBounds, TileIndex, TILE_SIZE};
use crate::raster::blank_tile;
use crate::resample::sample_cubic;
use crate::tile_store::TileStore;
use crate::transform::{CoordTransform, TransformError};

/// Renders the most detailed level straight from the source image.
pub struct MaxZoomRenderer<'a, T: CoordTransform + ?Sized> {
    transform: &'a T,
    source: &'a RgbaImage,
    options: RenderOptions,
}

impl<'a, T: CoordTransform + ?Sized> MaxZoomRenderer<'a, T> {
    pub fn new(transform: &'a T, source: &'a RgbaImage, options: RenderOptions) -> Self {
        Self { transform, source, options }
    }

    /// Render and store every tile in `bounds`, returning how many were written.
    ///
    /// # Errors
    /// Stops at the first transform (under [`TransformFailurePolicy::Abort`]),
    /// encoding or store failure.
    pub fn render<S: TileStore + ?Sized>(&self, bounds: &TileBounds, store: &mut S) -> Result<usize> {
        info!(
            zoom = bounds.zoom,
            tiles = bounds.tile_count(),
            "Rendering top zoom level from source"
        );

        let mut written = 0;
        for index in bounds.tiles() {
            let tile = self.render_tile(index)?;
            store.write_tile(index, &tile)?;
            written += 1;
        }

        info!(zoom = bounds.zoom, written, "Finished top zoom level");
        Ok(written)
    }

    /// Render a single tile into a fresh buffer.
    ///
    /// # Errors
    /// Returns a transform error under [`TransformFailurePolicy::Abort`].
    pub fn render_tile(&self, index: TileIndex) -> Result<RgbaImage> {
        let mut tile = blank_tile();
        let mut failures = 0_usize;

        for py in 0..TILE_SIZE {
            for px in 0..TILE_SIZE {
                let merc = MercatorPoint::of_tile_pixel(index, px, py);
                let src = match self.source_position(merc) {
                    Ok(src) => src,
                    Err(e) => match self.options.on_transform_error {
                        TransformFailurePolicy::Abort => return Err(e.into()),
                        TransformFailurePolicy::Transparent => {
                            failures += 1;
                            continue;
                        }
                    },
                };
                let color = sample_cubic(self.source, src.x, src.y, self.options.edge_policy);
                tile.put_pixel(px, py, color);
            }
        }

        if failures > 0 {
            warn!(tile = %index, failures, "Transform failed for some pixels; left transparent");
        }
        debug!(tile = %index, "Rendered tile");
        Ok(tile)
    }

    /// Inverse-transform a Mercator point into source pixel space.
    fn source_position(&self, merc: MercatorPoint) -> std::result::Result<PixelPoint, TransformError> {
        let point: [f64; 2] = merc.into();
        let src = PixelPoint::from(self.transform.transform(point, true, self.options.stateful_transform)?);
        if src.x.is_finite() && src.y.is_finite() {
            Ok(src)
        } else {
            Err(TransformError::new(point, true, "transform returned a non-finite point"))
        }
    }
}
