//! Build configuration and the compiled mesh descriptor.
//!
//! A configuration names the source image, the compiled mesh JSON, the output
//! root and the map id used as a path segment. It can be built in code or
//! read from JSON:
//!
//! ```json
//! {
//!   "source_image": "originals/naramachi.jpg",
//!   "mesh_path": "compiled/naramachi.json",
//!   "output_root": "wmts",
//!   "map_id": "naramachi_2",
//!   "options": { "edge_policy": "transparent", "on_transform_error": "abort" }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{PyramidError, Result};
use crate::raster::DownsampleFilter;
use crate::resample::EdgePolicy;
use crate::tile_store::local::validate_map_id;

/// What the renderer does when the transform cannot resolve an output pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformFailurePolicy {
    /// Fail the whole build.
    #[default]
    Abort,
    /// Leave the pixel transparent and keep going.
    Transparent,
}

/// Knobs for rendering and downsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Treatment of texels outside the source image
    pub edge_policy: EdgePolicy,
    /// Reaction to unresolvable transform points
    pub on_transform_error: TransformFailurePolicy,
    /// Value forwarded as the transform's `stateful` flag
    pub stateful_transform: bool,
    /// Resize filter for folding four tiles into one
    pub downsample_filter: DownsampleFilter,
    /// Write `metadata.json` next to the zoom folders
    pub write_manifest: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            edge_policy: EdgePolicy::Transparent,
            on_transform_error: TransformFailurePolicy::Abort,
            stateful_transform: true,
            downsample_filter: DownsampleFilter::Triangle,
            write_manifest: true,
        }
    }
}

impl RenderOptions {
    #[must_use]
    pub fn with_edge_policy(mut self, policy: EdgePolicy) -> Self {
        self.edge_policy = policy;
        self
    }

    #[must_use]
    pub fn with_transform_failure(mut self, policy: TransformFailurePolicy) -> Self {
        self.on_transform_error = policy;
        self
    }

    #[must_use]
    pub fn with_stateful_transform(mut self, stateful: bool) -> Self {
        self.stateful_transform = stateful;
        self
    }

    #[must_use]
    pub fn with_downsample_filter(mut self, filter: DownsampleFilter) -> Self {
        self.downsample_filter = filter;
        self
    }

    #[must_use]
    pub fn with_manifest(mut self, write: bool) -> Self {
        self.write_manifest = write;
        self
    }
}

/// Inputs of one pyramid build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidConfig {
    /// Distorted source raster
    pub source_image: PathBuf,
    /// Compiled mesh JSON (`{ width, height, compiled }`)
    pub mesh_path: PathBuf,
    /// Directory receiving `<map_id>/<z>/<x>/<y>.png`
    pub output_root: PathBuf,
    /// Map identifier, used as a single path segment
    pub map_id: String,
    #[serde(default)]
    pub options: RenderOptions,
}

impl PyramidConfig {
    pub fn new(
        source_image: impl Into<PathBuf>,
        mesh_path: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        map_id: impl Into<String>,
    ) -> Self {
        Self {
            source_image: source_image.into(),
            mesh_path: mesh_path.into(),
            output_root: output_root.into(),
            map_id: map_id.into(),
            options: RenderOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    /// Read a configuration from a JSON file.
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    ///
    /// # Errors
    /// Returns an I/O or JSON error.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PyramidError::io(path, e))?;
        let mut config: Self = serde_json::from_str(&text)?;
        if let Some(base) = path.parent() {
            config.source_image = base.join(&config.source_image);
            config.mesh_path = base.join(&config.mesh_path);
            config.output_root = base.join(&config.output_root);
        }
        Ok(config)
    }

    /// Check the configuration before any tile is written.
    ///
    /// # Errors
    /// Returns [`PyramidError::Configuration`] for a bad map id or missing input files.
    pub fn validate(&self) -> Result<()> {
        validate_map_id(&self.map_id)?;
        if !self.source_image.is_file() {
            return Err(PyramidError::config(format!(
                "source image {} does not exist",
                self.source_image.display()
            )));
        }
        if !self.mesh_path.is_file() {
            return Err(PyramidError::config(format!(
                "mesh descriptor {} does not exist",
                self.mesh_path.display()
            )));
        }
        Ok(())
    }
}

/// Compiled triangulated mesh as produced by the map editor.
///
/// `compiled` is opaque here and handed verbatim to the transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshDescriptor {
    /// Source image width in pixels
    pub width: u32,
    /// Source image height in pixels
    pub height: u32,
    /// Mesh payload consumed by the transform implementation
    pub compiled: serde_json::Value,
}

impl MeshDescriptor {
    /// Read a mesh descriptor from a JSON file.
    ///
    /// # Errors
    /// Returns [`PyramidError::Configuration`] if the file is missing, is not
    /// valid JSON, or describes an empty image.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| PyramidError::config(format!("cannot read mesh {}: {e}", path.display())))?;
        let mesh: Self = serde_json::from_str(&text)
            .map_err(|e| PyramidError::config(format!("malformed mesh {}: {e}", path.display())))?;
        mesh.validate()?;
        Ok(mesh)
    }

    /// # Errors
    /// Returns [`PyramidError::Configuration`] if either dimension is zero or
    /// the payload is `null`.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PyramidError::config(format!(
                "mesh describes an empty image: {}x{}",
                self.width, self.height
            )));
        }
        if self.compiled.is_null() {
            return Err(PyramidError::config("mesh has no compiled payload"));
        }
        Ok(())
    }
}
