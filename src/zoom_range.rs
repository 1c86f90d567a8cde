//! Zoom range and top-level tile bounds for a transformed image.
//!
//! The image's native resolution is estimated from how long its two
//! diagonals become in Mercator space. The shorter diagonal wins, so a
//! sheared mesh never makes the image look sharper than it is.

use serde::Serialize;
use tracing::debug;

use crate::casting::i64_to_zoom;
use crate::error::{PyramidError, Result};
use crate::geometry::{MercatorExtent, MercatorPoint, TileBounds, MAX_MERC, MAX_SUPPORTED_ZOOM, TILE_SIZE};
use crate::transform::CoordTransform;

/// Log2 results closer than this to an integer are treated as that integer.
const ZOOM_EPSILON: f64 = 1e-9;

/// The four image corners projected into Mercator space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageCorners {
    /// Pixel `(0, 0)`
    pub top_left: MercatorPoint,
    /// Pixel `(width, 0)`
    pub top_right: MercatorPoint,
    /// Pixel `(width, height)`
    pub bottom_right: MercatorPoint,
    /// Pixel `(0, height)`
    pub bottom_left: MercatorPoint,
}

impl ImageCorners {
    /// Push the corners of a `width × height` image through the forward transform.
    ///
    /// # Errors
    /// Returns [`PyramidError::Transform`] if any corner cannot be resolved.
    pub fn from_transform<T: CoordTransform + ?Sized>(
        transform: &T,
        width: u32,
        height: u32,
        stateful: bool,
    ) -> Result<Self> {
        let (w, h) = (f64::from(width), f64::from(height));
        let project = |x: f64, y: f64| -> Result<MercatorPoint> {
            Ok(MercatorPoint::from(transform.transform([x, y], false, stateful)?))
        };
        Ok(Self {
            top_left: project(0.0, 0.0)?,
            top_right: project(w, 0.0)?,
            bottom_right: project(w, h)?,
            bottom_left: project(0.0, h)?,
        })
    }

    #[must_use]
    pub fn to_array(&self) -> [MercatorPoint; 4] {
        [self.top_left, self.top_right, self.bottom_right, self.bottom_left]
    }

    #[must_use]
    pub fn extent(&self) -> MercatorExtent {
        MercatorExtent::enclosing(&self.to_array())
    }
}

/// Levels to generate and the tiles needed at the most detailed one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomRange {
    /// Most detailed level; rendered from the source image
    pub max_zoom: u8,
    /// Coarsest level; equal to `max_zoom` for single-level pyramids
    pub min_zoom: u8,
    /// Tile bounds at `max_zoom`
    pub bounds: TileBounds,
    /// Mercator extent of the image corners
    pub extent: MercatorExtent,
    /// Estimated Mercator meters per source pixel
    pub map_scale: f64,
}

impl ZoomRange {
    /// Transform the image corners, then derive the range from them.
    ///
    /// # Errors
    /// Propagates transform failures and the geometry errors of [`ZoomRange::from_corners`].
    pub fn compute<T: CoordTransform + ?Sized>(
        transform: &T,
        width: u32,
        height: u32,
        stateful: bool,
    ) -> Result<Self> {
        let corners = ImageCorners::from_transform(transform, width, height, stateful)?;
        Self::from_corners(width, height, &corners)
    }

    /// Derive zoom levels and top-level tile bounds from projected corners.
    ///
    /// # Errors
    /// Returns [`PyramidError::Configuration`] for empty images, collapsed or
    /// non-finite footprints, zooms above `MAX_SUPPORTED_ZOOM`, and
    /// footprints that miss the world entirely.
    pub fn from_corners(width: u32, height: u32, corners: &ImageCorners) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PyramidError::config(format!("Image has no pixels: {width}x{height}")));
        }

        let pixel_diagonal = f64::from(width).hypot(f64::from(height));
        let diag_tl_br = corners.top_left.distance(corners.bottom_right);
        let diag_tr_bl = corners.top_right.distance(corners.bottom_left);

        let world_scale = 2.0 * MAX_MERC / f64::from(TILE_SIZE);
        let map_scale = diag_tl_br.min(diag_tr_bl) / pixel_diagonal;
        if !map_scale.is_finite() || map_scale <= 0.0 {
            return Err(PyramidError::config(format!(
                "Degenerate image footprint: {map_scale} meters per pixel"
            )));
        }

        // Sources coarser than zoom 0 still get the single world tile
        let max_zoom = snapped_ceil((world_scale / map_scale).log2()).max(0);
        let max_zoom = i64_to_zoom(max_zoom)
            .filter(|z| *z <= MAX_SUPPORTED_ZOOM)
            .ok_or_else(|| {
                PyramidError::config(format!(
                    "Image resolution needs zoom {max_zoom}, above {MAX_SUPPORTED_ZOOM}"
                ))
            })?;

        // A negative delta means the image is smaller than one tile: build one level only
        let min_side = f64::from(width.min(height));
        let delta_zoom = snapped_ceil((min_side / f64::from(TILE_SIZE)).log2()).max(0);
        let min_zoom = i64_to_zoom((i64::from(max_zoom) - delta_zoom).max(0)).unwrap_or(0);

        let extent = corners.extent();
        let bounds = TileBounds::covering(&extent, max_zoom).ok_or_else(|| {
            PyramidError::config(format!("Image footprint {extent:?} does not intersect the world"))
        })?;

        debug!(
            max_zoom,
            min_zoom,
            map_scale,
            tiles = bounds.tile_count(),
            "Computed zoom range"
        );

        Ok(Self { max_zoom, min_zoom, bounds, extent, map_scale })
    }

    /// Zoom levels from `max_zoom` down to `min_zoom`.
    pub fn levels(&self) -> impl Iterator<Item = u8> {
        (self.min_zoom..=self.max_zoom).rev()
    }

    #[must_use]
    pub fn level_count(&self) -> usize {
        usize::from(self.max_zoom - self.min_zoom) + 1
    }
}

/// `ceil(value)` with values within `ZOOM_EPSILON` of an integer snapped to it.
fn snapped_ceil(value: f64) -> i64 {
    let rounded = value.round();
    let snapped = if (value - rounded).abs() < ZOOM_EPSILON { rounded } else { value.ceil() };
    // Zoom arithmetic stays far inside i64; saturating cast for absurd inputs
    #[allow(clippy::cast_possible_truncation)]
    {
        snapped as i64
    }
}
