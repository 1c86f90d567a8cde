//! Local filesystem tile store.
//!
//! Lays tiles out as `<root>/<map_id>/<zoom>/<x>/<y>.png`, creating
//! directories on demand.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::TileStore;
use crate::error::{PyramidError, Result};
use crate::geometry::TileIndex;
use crate::raster::{decode_png, encode_png};

/// Name of the JSON manifest written beside the zoom folders.
pub const MANIFEST_FILE: &str = "metadata.json";

/// Tile store rooted at `<root>/<map_id>`.
#[derive(Debug, Clone)]
pub struct FsTileStore {
    map_dir: PathBuf,
}

impl FsTileStore {
    /// Create a store for `map_id` under `root`. Nothing is touched on disk yet.
    ///
    /// # Errors
    /// Returns [`PyramidError::Configuration`] if `map_id` is empty or would
    /// escape `root` as a path segment.
    pub fn new<P: AsRef<Path>>(root: P, map_id: &str) -> Result<Self> {
        validate_map_id(map_id)?;
        Ok(Self { map_dir: root.as_ref().join(map_id) })
    }

    /// Directory holding the zoom folders.
    #[must_use]
    pub fn map_dir(&self) -> &Path {
        &self.map_dir
    }

    /// Path of the PNG file for `index`.
    #[must_use]
    pub fn tile_path(&self, index: TileIndex) -> PathBuf {
        self.map_dir
            .join(index.zoom.to_string())
            .join(index.x.to_string())
            .join(format!("{}.png", index.y))
    }

    /// Remove every tile and the manifest for this map.
    ///
    /// # Errors
    /// Returns an I/O error if the directory exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.map_dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PyramidError::io(&self.map_dir, e)),
        }
    }

    /// Serialize `manifest` as pretty JSON into `<map_dir>/metadata.json`.
    ///
    /// # Errors
    /// Returns a serialization or I/O error.
    pub fn write_manifest<M: Serialize>(&self, manifest: &M) -> Result<PathBuf> {
        fs::create_dir_all(&self.map_dir).map_err(|e| PyramidError::io(&self.map_dir, e))?;
        let path = self.map_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(manifest)?;
        fs::write(&path, json).map_err(|e| PyramidError::io(&path, e))?;
        debug!(path = %path.display(), "Wrote manifest");
        Ok(path)
    }

    /// Walk the map directory and count the tiles on disk.
    ///
    /// Files that do not follow the `<zoom>/<x>/<y>.png` layout are skipped.
    ///
    /// # Errors
    /// Returns an I/O error if a directory entry cannot be read.
    pub fn scan(&self) -> Result<StoreStats> {
        let mut stats = StoreStats::default();
        if !self.map_dir.exists() {
            return Ok(stats);
        }

        for entry in WalkDir::new(&self.map_dir).min_depth(3).max_depth(3) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.map_dir).to_path_buf();
                PyramidError::io(&path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let Some(index) = self.index_of(path) else {
                warn!(path = %path.display(), "Skipping file outside the tile layout");
                continue;
            };

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            stats.tile_count += 1;
            stats.total_size_bytes += size;
            *stats.tiles_per_zoom.entry(index.zoom).or_insert(0) += 1;
        }

        Ok(stats)
    }

    /// Parse `<map_dir>/<zoom>/<x>/<y>.png` back into a tile index.
    fn index_of(&self, path: &Path) -> Option<TileIndex> {
        let rel = path.strip_prefix(&self.map_dir).ok()?;
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            return None;
        }
        let mut parts = rel.iter().map(|p| p.to_str());
        let zoom = parts.next()??.parse().ok()?;
        let x = parts.next()??.parse().ok()?;
        let y = Path::new(parts.next()??).file_stem()?.to_str()?.parse().ok()?;
        Some(TileIndex::new(zoom, x, y))
    }
}

impl TileStore for FsTileStore {
    fn write_tile(&mut self, index: TileIndex, tile: &RgbaImage) -> Result<()> {
        let path = self.tile_path(index);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| PyramidError::io(dir, e))?;
        }
        let bytes = encode_png(tile)?;
        fs::write(&path, bytes).map_err(|e| PyramidError::io(&path, e))?;
        debug!(tile = %index, path = %path.display(), "Wrote tile");
        Ok(())
    }

    fn read_tile(&self, index: TileIndex) -> Result<RgbaImage> {
        let path = self.tile_path(index);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(PyramidError::MissingTile(index)),
            Err(e) => return Err(PyramidError::io(&path, e)),
        };
        decode_png(&bytes)
    }

    fn contains(&self, index: TileIndex) -> bool {
        self.tile_path(index).is_file()
    }
}

/// Reject map ids that are empty or are not a single plain path segment.
pub(crate) fn validate_map_id(map_id: &str) -> Result<()> {
    if map_id.trim().is_empty() {
        return Err(PyramidError::config("map id is empty"));
    }
    if map_id == "." || map_id == ".." || map_id.contains(['/', '\\']) {
        return Err(PyramidError::config(format!("map id {map_id:?} is not a single path segment")));
    }
    Ok(())
}

/// Statistics about the tiles on disk for one map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of tile files
    pub tile_count: usize,
    /// Combined size of all tile files
    pub total_size_bytes: u64,
    /// Tile count per zoom level
    pub tiles_per_zoom: BTreeMap<u8, usize>,
}
