//! Error types for raster I/O and processing.

use access_common::AccessError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, writing or transforming rasters.
#[derive(Error, Debug)]
pub enum RasterError {
    /// The raster file does not exist.
    #[error("raster not found: {}", .0.display())]
    NotFound(PathBuf),

    /// TIFF container could not be decoded or encoded.
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// Geo-referencing tags are missing or inconsistent.
    #[error("invalid GeoTIFF {}: {reason}", path.display())]
    InvalidGeoTiff { path: PathBuf, reason: String },

    /// Buffer length does not match the grid shape.
    #[error("shape mismatch: expected {expected} pixels, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Two rasters that must share a grid do not.
    #[error("rasters are not aligned: {0}")]
    NotAligned(String),

    /// Storage/IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Grid or geometry error bubbled up from the common types.
    #[error(transparent)]
    Access(#[from] AccessError),
}

impl RasterError {
    /// Create an InvalidGeoTiff error.
    pub fn invalid_geotiff(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidGeoTiff {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Map into the modeling taxonomy, naming the layer being processed.
    pub fn into_access(self, layer: &str) -> AccessError {
        match self {
            RasterError::NotFound(path) => AccessError::missing_data(layer, path),
            RasterError::Access(err) => err,
            RasterError::Io(err) => AccessError::Io(err),
            other => AccessError::bad_data(layer, other.to_string()),
        }
    }
}

impl From<RasterError> for AccessError {
    fn from(err: RasterError) -> Self {
        err.into_access("raster")
    }
}

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;
