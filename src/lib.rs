#![doc = include_str!("../README.md")]
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`zoom_range`]: Zoom levels and top-level tile bounds from projected corners
//! - [`render`]: Top-level tiles resampled from the source via [`MaxZoomRenderer`]
//! - [`downsample`]: Coarser levels folded from finer ones via [`PyramidDownsampler`]
//! - [`pyramid`]: Build orchestration with [`PyramidBuilder`] and [`build_from_config`]
//! - [`resample`]: Cubic convolution kernel and sampling
//! - [`transform`]: The [`CoordTransform`] capability and simple implementations
//! - [`geometry`]: Mercator, pixel and tile coordinate types and constants
//! - [`tile_store`]: Where tiles go: filesystem or memory
//! - [`raster`]: Image decoding, PNG encoding and quadrant compositing
//! - [`config`]: Build configuration and the compiled mesh descriptor

// ============================================================================
// Public modules
// ============================================================================

pub mod casting;
pub mod config;
pub mod downsample;
pub mod error;
pub mod geometry;
pub mod pyramid;
pub mod raster;
pub mod render;
pub mod resample;
pub mod tile_store;
pub mod transform;
pub mod zoom_range;

// ============================================================================
// Pyramid Build
// ============================================================================
// Primary API: PyramidBuilder::new(&transform, w, h).build(source, &mut store)

pub use pyramid::{
    build_from_config,
    BuildPlan,
    BuildReport,
    PyramidBuilder,
};

pub use render::MaxZoomRenderer;
pub use downsample::{LevelSummary, PyramidDownsampler};
pub use zoom_range::{ImageCorners, ZoomRange};

// ============================================================================
// Configuration & Errors
// ============================================================================

pub use config::{
    MeshDescriptor,
    PyramidConfig,
    RenderOptions,
    TransformFailurePolicy,
};

pub use error::{PyramidError, Result};

// ============================================================================
// Transforms & Resampling
// ============================================================================

pub use transform::{
    AffineTransform,
    CoordTransform,
    IdentityTransform,
    TransformError,
};

pub use resample::{cubic_weight, sample_cubic, EdgePolicy};
pub use raster::DownsampleFilter;

// ============================================================================
// Geometry
// ============================================================================

pub use geometry::{
    MercatorExtent,
    MercatorPoint,
    PixelPoint,
    TileBounds,
    TileIndex,
    MAX_MERC,
    TILE_SIZE,
};
pub use geometry::projection::LonLatExtent;

// ============================================================================
// Tile Storage
// ============================================================================

pub use tile_store::{
    FsTileStore,
    MemoryTileStore,
    StoreStats,
    TileStore,
};
