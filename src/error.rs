//! Error taxonomy for pyramid builds.
//!
//! Every failure surfaces to the caller of the build; nothing is retried and
//! there is no partial-success mode.

use std::path::{Path, PathBuf};

use crate::geometry::TileIndex;
use crate::transform::TransformError;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PyramidError>;

/// Error type for pyramid construction
#[derive(Debug)]
pub enum PyramidError {
    /// Invalid configuration, mesh descriptor or degenerate geometry
    Configuration(String),
    /// The coordinate transform could not resolve a point
    Transform(TransformError),
    /// Filesystem failure
    Io { path: PathBuf, source: std::io::Error },
    /// Image decode or encode failure
    Image { context: String, source: image::ImageError },
    /// A tile the build relies on is not in the store
    MissingTile(TileIndex),
    /// JSON (de)serialization failure
    Serialization(serde_json::Error),
}

impl PyramidError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    pub(crate) fn image(context: impl Into<String>, source: image::ImageError) -> Self {
        Self::Image { context: context.into(), source }
    }
}

impl std::fmt::Display for PyramidError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(e) => write!(f, "Configuration error: {e}"),
            Self::Transform(e) => write!(f, "Transform error: {e}"),
            Self::Io { path, source } => write!(f, "I/O error at {}: {source}", path.display()),
            Self::Image { context, source } => write!(f, "Image error ({context}): {source}"),
            Self::MissingTile(tile) => write!(f, "Tile {tile} is missing from the store"),
            Self::Serialization(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for PyramidError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transform(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            Self::Image { source, .. } => Some(source),
            Self::Serialization(e) => Some(e),
            Self::Configuration(_) | Self::MissingTile(_) => None,
        }
    }
}

impl From<TransformError> for PyramidError {
    fn from(e: TransformError) -> Self {
        Self::Transform(e)
    }
}

impl From<serde_json::Error> for PyramidError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_messages() {
        let e = PyramidError::config("map id is empty");
        assert_eq!(e.to_string(), "Configuration error: map id is empty");

        let e = PyramidError::MissingTile(TileIndex::new(3, 1, 2));
        assert_eq!(e.to_string(), "Tile 3/1/2 is missing from the store");
    }

    #[test]
    fn test_io_source_is_kept() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e = PyramidError::io(Path::new("/tmp/x.png"), inner);
        assert!(e.to_string().contains("/tmp/x.png"));
        assert!(e.source().is_some());
    }

    #[test]
    fn test_from_transform_error() {
        let e: PyramidError = TransformError::new([1.0, 2.0], true, "outside mesh").into();
        assert!(matches!(e, PyramidError::Transform(_)));
        assert!(e.to_string().contains("outside mesh"));
    }
}
