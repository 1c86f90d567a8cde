//! Tile storage backends.
//!
//! The renderer and downsampler only see the [`TileStore`] trait. Tiles are
//! stored PNG-encoded so every backend sees exactly the bytes a viewer would
//! fetch.
//!
//! # Example
//!
//! ```rust,no_run
//! use tinpyramid::tile_store::{FsTileStore, TileStore};
//! use tinpyramid::TileIndex;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let store = FsTileStore::new("/srv/tiles", "old_town")?;
//!     let tile = store.read_tile(TileIndex::new(16, 57_345, 25_980))?;
//!     println!("{}x{}", tile.width(), tile.height());
//!     Ok(())
//! }
//! ```

pub mod local;

pub use local::{FsTileStore, StoreStats};

use std::collections::HashMap;

use image::RgbaImage;

use crate::error::{PyramidError, Result};
use crate::geometry::TileIndex;
use crate::raster::{decode_png, encode_png};

/// Sink and source for finished tiles.
pub trait TileStore {
    /// Encode and persist `tile` under `index`, replacing any previous tile.
    ///
    /// # Errors
    /// Returns an error if encoding or writing fails.
    fn write_tile(&mut self, index: TileIndex, tile: &RgbaImage) -> Result<()>;

    /// Load and decode the tile stored under `index`.
    ///
    /// # Errors
    /// Returns [`PyramidError::MissingTile`] if no such tile was written, or a
    /// decode/I/O error.
    fn read_tile(&self, index: TileIndex) -> Result<RgbaImage>;

    /// Whether a tile exists under `index`.
    fn contains(&self, index: TileIndex) -> bool;
}

impl<S: TileStore + ?Sized> TileStore for &mut S {
    fn write_tile(&mut self, index: TileIndex, tile: &RgbaImage) -> Result<()> {
        (**self).write_tile(index, tile)
    }

    fn read_tile(&self, index: TileIndex) -> Result<RgbaImage> {
        (**self).read_tile(index)
    }

    fn contains(&self, index: TileIndex) -> bool {
        (**self).contains(index)
    }
}

/// In-memory store holding encoded PNG bytes.
#[derive(Debug, Default, Clone)]
pub struct MemoryTileStore {
    tiles: HashMap<TileIndex, Vec<u8>>,
}

impl MemoryTileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Encoded bytes of a tile.
    #[must_use]
    pub fn png_bytes(&self, index: TileIndex) -> Option<&[u8]> {
        self.tiles.get(&index).map(Vec::as_slice)
    }

    /// All stored indices at `zoom`, sorted.
    #[must_use]
    pub fn indices_at(&self, zoom: u8) -> Vec<TileIndex> {
        let mut indices: Vec<_> = self.tiles.keys().filter(|t| t.zoom == zoom).copied().collect();
        indices.sort_unstable();
        indices
    }
}

impl TileStore for MemoryTileStore {
    fn write_tile(&mut self, index: TileIndex, tile: &RgbaImage) -> Result<()> {
        let bytes = encode_png(tile)?;
        self.tiles.insert(index, bytes);
        Ok(())
    }

    fn read_tile(&self, index: TileIndex) -> Result<RgbaImage> {
        let bytes = self.tiles.get(&index).ok_or(PyramidError::MissingTile(index))?;
        decode_png(bytes)
    }

    fn contains(&self, index: TileIndex) -> bool {
        self.tiles.contains_key(&index)
    }
}
