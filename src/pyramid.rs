//! Pyramid build orchestration.
//!
//! A build plans the zoom range from the image corners, renders the top level
//! from the source image, drops the source, then folds the pyramid down level
//! by level. Each level is complete before the next one starts, because the
//! coarser level reads the finer one's tiles back from the store.
//!
//! # Example
//!
//! ```rust,no_run
//! use tinpyramid::{AffineTransform, MemoryTileStore, MercatorExtent, PyramidBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let source = image::open("map.png")?.into_rgba8();
//!     let transform = AffineTransform::north_up(source.width(), source.height(), MercatorExtent::world())?;
//!
//!     let mut store = MemoryTileStore::new();
//!     let report = PyramidBuilder::new(&transform, source.width(), source.height())
//!         .build(source, &mut store)?;
//!     println!("{} tiles", report.total_tiles);
//!     Ok(())
//! }
//! ```

use image::RgbaImage;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{MeshDescriptor, PyramidConfig, RenderOptions};
use crate::downsample::{LevelSummary, PyramidDownsampler};
use crate::error::{PyramidError, Result};
use crate::geometry::projection::{extent_to_lon_lat, LonLatExtent};
use crate::geometry::{MercatorExtent, TileBounds};
use crate::raster::load_source_image;
use crate::render::MaxZoomRenderer;
use crate::tile_store::{FsTileStore, TileStore};
use crate::transform::{CoordTransform, TransformError};
use crate::zoom_range::{ImageCorners, ZoomRange};

/// Corners and zoom range computed before any pixel is touched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BuildPlan {
    pub corners: ImageCorners,
    pub range: ZoomRange,
}

/// Summary of a finished build; also written as the map manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildReport {
    /// Map identifier, when built from a configuration
    pub map_id: Option<String>,
    /// Source image size in pixels
    pub image_size: (u32, u32),
    pub max_zoom: u8,
    pub min_zoom: u8,
    /// Tile bounds at `max_zoom`
    pub bounds: TileBounds,
    /// Tiles written per level, most detailed first
    pub levels: Vec<LevelSummary>,
    pub total_tiles: usize,
    /// Image corners in Mercator meters
    pub corners: ImageCorners,
    /// Mercator extent of the corners
    pub extent: MercatorExtent,
    /// Same extent in lon/lat, when it can be projected
    pub extent_wgs84: Option<LonLatExtent>,
}

/// Drives a build for one image and one transform.
pub struct PyramidBuilder<'a, T: CoordTransform + ?Sized> {
    transform: &'a T,
    width: u32,
    height: u32,
    options: RenderOptions,
}

impl<'a, T: CoordTransform + ?Sized> PyramidBuilder<'a, T> {
    /// `width` and `height` are the image size the transform was built for.
    pub fn new(transform: &'a T, width: u32, height: u32) -> Self {
        Self { transform, width, height, options: RenderOptions::default() }
    }

    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Project the corners and derive the zoom range.
    ///
    /// # Errors
    /// Returns transform errors and degenerate-geometry configuration errors.
    pub fn plan(&self) -> Result<BuildPlan> {
        let corners =
            ImageCorners::from_transform(self.transform, self.width, self.height, self.options.stateful_transform)?;
        let range = ZoomRange::from_corners(self.width, self.height, &corners)?;
        Ok(BuildPlan { corners, range })
    }

    /// Plan and execute in one go.
    ///
    /// # Errors
    /// See [`PyramidBuilder::plan`] and [`PyramidBuilder::execute`].
    pub fn build<S: TileStore + ?Sized>(&self, source: RgbaImage, store: &mut S) -> Result<BuildReport> {
        let plan = self.plan()?;
        self.execute(&plan, source, store)
    }

    /// Render the top level of `plan` from `source`, then every coarser level.
    ///
    /// `source` is consumed and dropped as soon as the top level is written.
    ///
    /// # Errors
    /// Returns a configuration error if `source` does not match the size the
    /// transform expects; otherwise the first render, downsample or store error.
    pub fn execute<S: TileStore + ?Sized>(
        &self,
        plan: &BuildPlan,
        source: RgbaImage,
        store: &mut S,
    ) -> Result<BuildReport> {
        if source.dimensions() != (self.width, self.height) {
            return Err(PyramidError::config(format!(
                "source image is {}x{} but the mesh expects {}x{}",
                source.width(),
                source.height(),
                self.width,
                self.height
            )));
        }

        let range = &plan.range;
        info!(
            max_zoom = range.max_zoom,
            min_zoom = range.min_zoom,
            levels = range.level_count(),
            "Building tile pyramid"
        );

        let top_written = MaxZoomRenderer::new(self.transform, &source, self.options).render(&range.bounds, store)?;
        drop(source);

        let mut levels = vec![LevelSummary { zoom: range.max_zoom, bounds: range.bounds, tiles_written: top_written }];
        levels.extend(
            PyramidDownsampler::new(self.options.downsample_filter).downsample(&range.bounds, range.min_zoom, store)?,
        );

        let total_tiles = levels.iter().map(|l| l.tiles_written).sum();
        let extent_wgs84 = match extent_to_lon_lat(&range.extent) {
            Ok(ll) => Some(ll),
            Err(e) => {
                warn!(error = %e, "Could not project footprint to lon/lat");
                None
            }
        };

        info!(total_tiles, "Tile pyramid complete");

        Ok(BuildReport {
            map_id: None,
            image_size: (self.width, self.height),
            max_zoom: range.max_zoom,
            min_zoom: range.min_zoom,
            bounds: range.bounds,
            levels,
            total_tiles,
            corners: plan.corners,
            extent: range.extent,
            extent_wgs84,
        })
    }
}

/// Run a full build from a configuration.
///
/// `connect` turns the compiled mesh into a transform. Geometry is planned
/// before the source image is decoded, so a degenerate mesh fails fast.
///
/// If rendering, downsampling or the manifest fails, `<output_root>/<map_id>`
/// is removed so no partial pyramid is left behind. This also removes any
/// earlier pyramid stored under the same map id.
///
/// # Errors
/// Any configuration, transform, image, I/O or serialization error.
pub fn build_from_config<T, F>(config: &PyramidConfig, connect: F) -> Result<BuildReport>
where
    T: CoordTransform,
    F: FnOnce(&MeshDescriptor) -> std::result::Result<T, TransformError>,
{
    config.validate()?;
    let mesh = MeshDescriptor::from_json_file(&config.mesh_path)?;
    let transform =
        connect(&mesh).map_err(|e| PyramidError::config(format!("cannot set up transform from mesh: {e}")))?;

    let builder = PyramidBuilder::new(&transform, mesh.width, mesh.height).with_options(config.options);
    let plan = builder.plan()?;

    info!(
        map_id = %config.map_id,
        source = %config.source_image.display(),
        width = mesh.width,
        height = mesh.height,
        "Loading source image"
    );
    let source = load_source_image(&config.source_image)?;

    let mut store = FsTileStore::new(&config.output_root, &config.map_id)?;
    let outcome = builder.execute(&plan, source, &mut store).and_then(|mut report| {
        report.map_id = Some(config.map_id.clone());
        if config.options.write_manifest {
            store.write_manifest(&report)?;
        }
        Ok(report)
    });

    if let Err(e) = &outcome {
        warn!(map_id = %config.map_id, error = %e, "Build failed; removing partial pyramid");
        if let Err(clear_err) = store.clear() {
            warn!(error = %clear_err, "Could not remove partial pyramid");
        }
    }
    outcome
}
