//! Coordinate spaces and tile addressing.
//!
//! Three spaces meet in a pyramid build:
//!
//! - **Mercator space**: Web Mercator meters, spanning `±MAX_MERC` on both axes.
//! - **Source pixel space**: real-valued coordinates in the distorted input
//!   image, `(0, 0)` at the top-left texel.
//! - **Tile space**: `(zoom, x, y)` indices of 256×256 tiles, `y` growing south.
//!
//! The constants below parameterize every conversion between them.

pub mod projection;

use serde::Serialize;

use crate::casting::{f64_to_tile_coord, i64_to_clamped_u32};

/// Half the circumference of the Web Mercator world, in meters.
pub const MAX_MERC: f64 = 20_037_508.342_789_244;

/// Edge length of an output tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Edge length of one quadrant when four tiles are folded into one.
pub const HALF_TILE: u32 = TILE_SIZE / 2;

/// Deepest zoom the crate will render; keeps tile indices inside `u32`.
pub const MAX_SUPPORTED_ZOOM: u8 = 30;

/// Mercator meters covered by one tile pixel at `zoom`.
#[inline]
#[must_use]
pub fn units_per_pixel(zoom: u8) -> f64 {
    2.0 * MAX_MERC / (f64::from(TILE_SIZE) * 2_f64.powi(i32::from(zoom)))
}

/// Number of tiles along one axis at `zoom`.
#[inline]
#[must_use]
pub fn tiles_per_axis(zoom: u8) -> u64 {
    1_u64 << zoom
}

/// A point in Web Mercator meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

impl MercatorPoint {
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Global pixel position of this point at `zoom` (origin at the north-west corner of the world).
    #[inline]
    #[must_use]
    pub fn to_global_pixel(self, zoom: u8) -> (f64, f64) {
        let world_px = f64::from(TILE_SIZE) * 2_f64.powi(i32::from(zoom));
        let px = (self.x + MAX_MERC) / (2.0 * MAX_MERC) * world_px;
        let py = (MAX_MERC - self.y) / (2.0 * MAX_MERC) * world_px;
        (px, py)
    }

    /// Mercator position of pixel `(px, py)` inside `tile`.
    ///
    /// Uses the pixel's north-west corner, matching how tiles were cut
    /// historically for these maps.
    #[inline]
    #[must_use]
    pub fn of_tile_pixel(tile: TileIndex, px: u32, py: u32) -> Self {
        let unit = units_per_pixel(tile.zoom);
        let gx = f64::from(px) + f64::from(tile.x) * f64::from(TILE_SIZE);
        let gy = f64::from(py) + f64::from(tile.y) * f64::from(TILE_SIZE);
        Self {
            x: gx * unit - MAX_MERC,
            y: MAX_MERC - gy * unit,
        }
    }

    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for MercatorPoint {
    fn from(p: [f64; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

impl From<MercatorPoint> for [f64; 2] {
    fn from(p: MercatorPoint) -> Self {
        [p.x, p.y]
    }
}

/// A real-valued position in source image pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[inline]
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for PixelPoint {
    fn from(p: [f64; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

impl From<PixelPoint> for [f64; 2] {
    fn from(p: PixelPoint) -> Self {
        [p.x, p.y]
    }
}

/// Axis-aligned extent in Web Mercator meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MercatorExtent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl MercatorExtent {
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// The whole zoom-0 tile.
    #[must_use]
    pub fn world() -> Self {
        Self::new(-MAX_MERC, -MAX_MERC, MAX_MERC, MAX_MERC)
    }

    /// Smallest extent enclosing all `points`.
    #[must_use]
    pub fn enclosing(points: &[MercatorPoint]) -> Self {
        points.iter().fold(
            Self::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |acc, p| Self {
                min_x: acc.min_x.min(p.x),
                min_y: acc.min_y.min(p.y),
                max_x: acc.max_x.max(p.x),
                max_y: acc.max_y.max(p.y),
            },
        )
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite() && self.min_y.is_finite() && self.max_x.is_finite() && self.max_y.is_finite()
    }
}

/// A tile address `(zoom, x, y)` in the XYZ scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TileIndex {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileIndex {
    #[inline]
    #[must_use]
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }
}

impl std::fmt::Display for TileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Inclusive range of tile indices at one zoom level.
///
/// Always satisfies `x_west <= x_east` and `y_north <= y_south`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TileBounds {
    pub zoom: u8,
    pub x_west: u32,
    pub x_east: u32,
    pub y_north: u32,
    pub y_south: u32,
}

impl TileBounds {
    /// Build bounds, rejecting inverted ranges.
    ///
    /// # Errors
    /// Returns a message if `x_west > x_east` or `y_north > y_south`.
    pub fn new(zoom: u8, x_west: u32, x_east: u32, y_north: u32, y_south: u32) -> Result<Self, String> {
        if x_west > x_east || y_north > y_south {
            return Err(format!(
                "Inverted tile bounds at zoom {zoom}: x {x_west}..={x_east}, y {y_north}..={y_south}"
            ));
        }
        Ok(Self { zoom, x_west, x_east, y_north, y_south })
    }

    /// Tiles covering `extent` at `zoom`, clipped to the world grid.
    ///
    /// Returns `None` when the extent is not finite or lies entirely outside the world.
    #[must_use]
    pub fn covering(extent: &MercatorExtent, zoom: u8) -> Option<Self> {
        if !extent.is_finite() {
            return None;
        }
        let (west_px, north_px) = MercatorPoint::new(extent.min_x, extent.max_y).to_global_pixel(zoom);
        let (east_px, south_px) = MercatorPoint::new(extent.max_x, extent.min_y).to_global_pixel(zoom);

        let x_west = f64_to_tile_coord(west_px)?;
        let x_east = f64_to_tile_coord(east_px)?;
        let y_north = f64_to_tile_coord(north_px)?;
        let y_south = f64_to_tile_coord(south_px)?;

        // tiles_per_axis(30) fits in i64 comfortably
        #[allow(clippy::cast_possible_wrap)]
        let last = tiles_per_axis(zoom) as i64 - 1;
        if x_east < 0 || y_south < 0 || x_west > last || y_north > last {
            return None;
        }

        Some(Self {
            zoom,
            x_west: i64_to_clamped_u32(x_west, last),
            x_east: i64_to_clamped_u32(x_east, last),
            y_north: i64_to_clamped_u32(y_north, last),
            y_south: i64_to_clamped_u32(y_south, last),
        })
    }

    /// Bounds one zoom level coarser: every component floor-divided by two.
    ///
    /// Returns `None` at zoom 0.
    #[must_use]
    pub fn zoomed_out(&self) -> Option<Self> {
        let zoom = self.zoom.checked_sub(1)?;
        Some(Self {
            zoom,
            x_west: self.x_west / 2,
            x_east: self.x_east / 2,
            y_north: self.y_north / 2,
            y_south: self.y_south / 2,
        })
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        (self.x_west..=self.x_east).contains(&x) && (self.y_north..=self.y_south).contains(&y)
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.x_east - self.x_west + 1
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.y_south - self.y_north + 1
    }

    #[must_use]
    pub fn tile_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Every tile in the bounds, column by column (x outer, y inner).
    pub fn tiles(&self) -> impl Iterator<Item = TileIndex> + '_ {
        (self.x_west..=self.x_east)
            .flat_map(move |x| (self.y_north..=self.y_south).map(move |y| TileIndex::new(self.zoom, x, y)))
    }

    /// Mercator extent covered by these tiles.
    #[must_use]
    pub fn extent(&self) -> MercatorExtent {
        let nw = MercatorPoint::of_tile_pixel(TileIndex::new(self.zoom, self.x_west, self.y_north), 0, 0);
        let unit = units_per_pixel(self.zoom);
        let tile_span = unit * f64::from(TILE_SIZE);
        MercatorExtent {
            min_x: nw.x,
            max_y: nw.y,
            max_x: nw.x + f64::from(self.width()) * tile_span,
            min_y: nw.y - f64::from(self.height()) * tile_span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_units_per_pixel() {
        assert!(approx_eq(units_per_pixel(0), 2.0 * MAX_MERC / 256.0, 1e-9));
        assert!(approx_eq(units_per_pixel(1) * 2.0, units_per_pixel(0), 1e-9));
    }

    #[test]
    fn test_tile_pixel_origin() {
        let nw = MercatorPoint::of_tile_pixel(TileIndex::new(0, 0, 0), 0, 0);
        assert!(approx_eq(nw.x, -MAX_MERC, 1e-6));
        assert!(approx_eq(nw.y, MAX_MERC, 1e-6));

        // Pixel (128, 128) of the single zoom-0 tile is the center of the world
        let center = MercatorPoint::of_tile_pixel(TileIndex::new(0, 0, 0), 128, 128);
        assert!(approx_eq(center.x, 0.0, 1e-6));
        assert!(approx_eq(center.y, 0.0, 1e-6));
    }

    #[test]
    fn test_global_pixel_inverts_tile_pixel() {
        let tile = TileIndex::new(5, 17, 11);
        let p = MercatorPoint::of_tile_pixel(tile, 40, 200);
        let (gx, gy) = p.to_global_pixel(5);
        assert!(approx_eq(gx, 17.0 * 256.0 + 40.0, 1e-6), "gx = {gx}");
        assert!(approx_eq(gy, 11.0 * 256.0 + 200.0, 1e-6), "gy = {gy}");
    }

    #[test]
    fn test_covering_world() {
        let bounds = TileBounds::covering(&MercatorExtent::world(), 2).unwrap();
        // East/south edges land exactly on the grid end and are clipped back in
        assert_eq!((bounds.x_west, bounds.x_east, bounds.y_north, bounds.y_south), (0, 3, 0, 3));
        assert_eq!(bounds.tile_count(), 16);
    }

    #[test]
    fn test_covering_small_extent() {
        // A few hundred meters around the origin at zoom 10
        let extent = MercatorExtent::new(-100.0, -100.0, 100.0, 100.0);
        let bounds = TileBounds::covering(&extent, 10).unwrap();
        assert_eq!((bounds.x_west, bounds.x_east), (511, 512));
        assert_eq!((bounds.y_north, bounds.y_south), (511, 512));
    }

    #[test]
    fn test_covering_outside_world() {
        let extent = MercatorExtent::new(3.0 * MAX_MERC, 0.0, 4.0 * MAX_MERC, 10.0);
        assert!(TileBounds::covering(&extent, 3).is_none());
        let nan = MercatorExtent::new(f64::NAN, 0.0, 1.0, 1.0);
        assert!(TileBounds::covering(&nan, 3).is_none());
    }

    #[test]
    fn test_zoomed_out_halves() {
        let bounds = TileBounds::new(4, 5, 9, 2, 7).unwrap();
        let up = bounds.zoomed_out().unwrap();
        assert_eq!(up, TileBounds::new(3, 2, 4, 1, 3).unwrap());
        assert!(TileBounds::new(0, 0, 0, 0, 0).unwrap().zoomed_out().is_none());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert!(TileBounds::new(3, 4, 2, 0, 0).is_err());
        assert!(TileBounds::new(3, 0, 0, 5, 1).is_err());
    }

    #[test]
    fn test_tiles_order_is_column_major() {
        let bounds = TileBounds::new(2, 1, 2, 0, 1).unwrap();
        let tiles: Vec<_> = bounds.tiles().map(|t| (t.x, t.y)).collect();
        assert_eq!(tiles, vec![(1, 0), (1, 1), (2, 0), (2, 1)]);
        assert!(bounds.contains(2, 1));
        assert!(!bounds.contains(0, 1));
    }

    #[test]
    fn test_bounds_extent() {
        let bounds = TileBounds::new(1, 0, 1, 0, 1).unwrap();
        let extent = bounds.extent();
        assert!(approx_eq(extent.min_x, -MAX_MERC, 1e-6));
        assert!(approx_eq(extent.max_x, MAX_MERC, 1e-6));
        assert!(approx_eq(extent.min_y, -MAX_MERC, 1e-6));
        assert!(approx_eq(extent.max_y, MAX_MERC, 1e-6));
    }
}
