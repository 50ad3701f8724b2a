//! Raster payloads and the raster-processing toolkit used by the modeling
//! pipeline.
//!
//! A [`Raster`] is a 2-D row-major buffer bound to a [`Grid`]
//! (affine transform, shape and CRS). Floating point rasters use `NaN` for
//! undefined pixels in memory; numeric nodata sentinels only exist at the
//! GeoTIFF boundary.
//!
//! # Pipeline
//!
//! ```text
//! GeoTIFF ──read_geotiff──► Raster<f64> ──resample──► Raster<f64> on another Grid
//!                                │
//! GeoJSON ──rasterize──► Raster<T>/Mask
//!                                │
//!                        write_geotiff ──► GeoTIFF (nodata sentinel)
//! ```

pub mod config;
pub mod error;
pub mod geotiff;
pub mod interpolation;
pub mod rasterize;
pub mod resample;
pub mod types;

// Re-export commonly used types at crate root
pub use access_common::Grid;
pub use config::{RasterConfig, COST_NODATA, FRICTION_NODATA};
pub use error::{RasterError, Result};
pub use geotiff::{read_geotiff, read_geotiff_with, write_geotiff, SampleType};
pub use interpolation::{bilinear_interpolate, nearest_interpolate, InterpolationMethod};
pub use rasterize::{burn, polygon_spans, rasterize, rasterize_mask, RasterizeOptions};
pub use resample::resample;
pub use types::{Mask, Raster};
