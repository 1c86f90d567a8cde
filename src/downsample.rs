//! Coarser zoom levels from finer ones.
//!
//! Level `Z - 1` is built from level `Z` by shrinking each 2×2 block of tiles
//! into one. Levels are processed in a loop, one complete level at a time,
//! from the top zoom down to the minimum.

use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::geometry::{TileBounds, TileIndex};
use crate::raster::{blank_tile, draw_quadrant, DownsampleFilter};
use crate::tile_store::TileStore;

/// What one downsampling pass produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelSummary {
    pub zoom: u8,
    pub bounds: TileBounds,
    pub tiles_written: usize,
}

/// Builds every level below the top one from already-written tiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct PyramidDownsampler {
    filter: DownsampleFilter,
}

impl PyramidDownsampler {
    #[must_use]
    pub fn new(filter: DownsampleFilter) -> Self {
        Self { filter }
    }

    /// Derive levels `top.zoom - 1` down to `min_zoom` from the tiles in `store`.
    ///
    /// Only tiles inside each level's bounds are ever read. Returns one
    /// summary per level written, in descending zoom order; empty when
    /// `min_zoom >= top.zoom`.
    ///
    /// # Errors
    /// Fails on the first missing parent tile, decode, encode or store error.
    pub fn downsample<S: TileStore + ?Sized>(
        &self,
        top: &TileBounds,
        min_zoom: u8,
        store: &mut S,
    ) -> Result<Vec<LevelSummary>> {
        let mut summaries = Vec::new();
        let mut parent = *top;

        while parent.zoom > min_zoom {
            let Some(child) = parent.zoomed_out() else { break };
            info!(zoom = child.zoom, tiles = child.tile_count(), "Downsampling zoom level");

            let mut written = 0;
            for index in child.tiles() {
                let tile = self.compose_tile(index, &parent, store)?;
                store.write_tile(index, &tile)?;
                written += 1;
            }

            summaries.push(LevelSummary { zoom: child.zoom, bounds: child, tiles_written: written });
            parent = child;
        }

        Ok(summaries)
    }

    /// Compose tile `index` from its up-to-four parents inside `parent_bounds`.
    ///
    /// Quadrants whose parent lies outside the bounds stay transparent.
    ///
    /// # Errors
    /// Returns [`crate::PyramidError::MissingTile`] when an in-bounds parent was never written.
    pub fn compose_tile<S: TileStore + ?Sized>(
        &self,
        index: TileIndex,
        parent_bounds: &TileBounds,
        store: &S,
    ) -> Result<RgbaImage> {
        let mut tile = blank_tile();
        let mut used = 0;

        for dx in 0..2 {
            let ux = index.x * 2 + dx;
            for dy in 0..2 {
                let uy = index.y * 2 + dy;
                if !parent_bounds.contains(ux, uy) {
                    continue;
                }
                let parent = store.read_tile(TileIndex::new(parent_bounds.zoom, ux, uy))?;
                draw_quadrant(&mut tile, &parent, dx, dy, self.filter);
                used += 1;
            }
        }

        debug!(tile = %index, parents = used, "Composed tile");
        Ok(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile_store::MemoryTileStore;
    use crate::PyramidError;
    use image::Rgba;

    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    fn solid(color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(256, 256, Rgba(color))
    }

    fn fill(store: &mut MemoryTileStore, bounds: &TileBounds, color: impl Fn(u32, u32) -> [u8; 4]) {
        for t in bounds.tiles() {
            store.write_tile(t, &solid(color(t.x, t.y))).unwrap();
        }
    }

    #[test]
    fn test_four_parents_fill_quadrants() {
        let top = TileBounds::new(3, 2, 3, 4, 5).unwrap();
        let mut store = MemoryTileStore::new();
        fill(&mut store, &top, |x, y| [(x * 40) as u8, (y * 40) as u8, 7, 255]);

        let levels = PyramidDownsampler::default().downsample(&top, 2, &mut store).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].zoom, 2);
        assert_eq!(levels[0].tiles_written, 1);

        let child = store.read_tile(TileIndex::new(2, 1, 2)).unwrap();
        assert_eq!(*child.get_pixel(10, 10), Rgba([80, 160, 7, 255]));
        assert_eq!(*child.get_pixel(200, 10), Rgba([120, 160, 7, 255]));
        assert_eq!(*child.get_pixel(10, 200), Rgba([80, 200, 7, 255]));
        assert_eq!(*child.get_pixel(200, 200), Rgba([120, 200, 7, 255]));
    }

    #[test]
    fn test_partial_coverage_leaves_quadrants_transparent() {
        // Parents x 3..=4 at y 1 straddle two children
        let top = TileBounds::new(3, 3, 4, 1, 1).unwrap();
        let mut store = MemoryTileStore::new();
        fill(&mut store, &top, |_, _| [255, 255, 255, 255]);

        let levels = PyramidDownsampler::default().downsample(&top, 2, &mut store).unwrap();
        assert_eq!(levels[0].bounds, TileBounds::new(2, 1, 2, 0, 0).unwrap());

        // Child (1, 0): only the south-east quadrant comes from parent (3, 1)
        let west = store.read_tile(TileIndex::new(2, 1, 0)).unwrap();
        assert_eq!(*west.get_pixel(200, 200), Rgba([255, 255, 255, 255]));
        assert_eq!(*west.get_pixel(10, 10), CLEAR);
        assert_eq!(*west.get_pixel(200, 10), CLEAR);
        assert_eq!(*west.get_pixel(10, 200), CLEAR);

        // Child (2, 0): only the south-west quadrant comes from parent (4, 1)
        let east = store.read_tile(TileIndex::new(2, 2, 0)).unwrap();
        assert_eq!(*east.get_pixel(10, 200), Rgba([255, 255, 255, 255]));
        assert_eq!(*east.get_pixel(200, 200), CLEAR);
    }

    #[test]
    fn test_multiple_levels_down_to_min() {
        let top = TileBounds::new(4, 0, 3, 0, 3).unwrap();
        let mut store = MemoryTileStore::new();
        fill(&mut store, &top, |_, _| [0, 0, 255, 255]);

        let levels = PyramidDownsampler::new(DownsampleFilter::Nearest)
            .downsample(&top, 1, &mut store)
            .unwrap();
        let zooms: Vec<_> = levels.iter().map(|l| (l.zoom, l.tiles_written)).collect();
        assert_eq!(zooms, vec![(3, 4), (2, 1), (1, 1)]);

        let coarse = store.read_tile(TileIndex::new(1, 0, 0)).unwrap();
        // Zoom 1 tile (0, 0) only has its north-west quadrant covered
        assert_eq!(*coarse.get_pixel(60, 60), Rgba([0, 0, 255, 255]));
        assert_eq!(*coarse.get_pixel(200, 200), CLEAR);
        assert!(store.indices_at(0).is_empty());
    }

    #[test]
    fn test_every_child_exists_after_downsampling() {
        let top = TileBounds::new(6, 13, 18, 40, 43).unwrap();
        let mut store = MemoryTileStore::new();
        fill(&mut store, &top, |_, _| [1, 2, 3, 255]);

        PyramidDownsampler::default().downsample(&top, 5, &mut store).unwrap();
        for t in top.tiles() {
            assert!(store.contains(TileIndex::new(5, t.x / 2, t.y / 2)), "no child for {t}");
        }
    }

    #[test]
    fn test_missing_parent_is_error() {
        let top = TileBounds::new(2, 0, 1, 0, 1).unwrap();
        let mut store = MemoryTileStore::new();
        store.write_tile(TileIndex::new(2, 0, 0), &solid([1, 1, 1, 255])).unwrap();

        let err = PyramidDownsampler::default().downsample(&top, 1, &mut store).unwrap_err();
        assert!(matches!(err, PyramidError::MissingTile(_)));
    }

    #[test]
    fn test_nothing_below_min_zoom() {
        let top = TileBounds::new(5, 0, 0, 0, 0).unwrap();
        let mut store = MemoryTileStore::new();
        let levels = PyramidDownsampler::default().downsample(&top, 5, &mut store).unwrap();
        assert!(levels.is_empty());
        assert!(store.is_empty());
    }
}
