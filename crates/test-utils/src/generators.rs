//! Synthetic rasters and vector layers.
//!
//! These generators create predictable, verifiable data patterns that can be
//! used across the test suite.

use access_common::{CrsCode, Feature, FeatureCollection, Geometry, Grid, Position};
use raster_io::{write_geotiff, Raster};
use std::path::{Path, PathBuf};

/// Raster with every pixel set to `value`.
pub fn uniform_raster(grid: &Grid, value: f64) -> Raster<f64> {
    Raster::filled(grid, value)
}

/// Raster where each cell value is `col * 1000 + row`.
///
/// # Example
///
/// ```
/// use test_utils::{ramp_raster, unit_grid};
///
/// let raster = ramp_raster(&unit_grid(5, 10));
/// assert_eq!(raster.get(0, 1), Some(1000.0));
/// assert_eq!(raster.get(1, 0), Some(1.0));
/// ```
pub fn ramp_raster(grid: &Grid) -> Raster<f64> {
    let mut raster = Raster::filled(grid, 0.0);
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            raster.set(row, col, (col * 1000 + row) as f64);
        }
    }
    raster
}

/// Write `raster` as `<dir>/<name>` and return the path.
pub fn write_raster(dir: &Path, name: &str, raster: &Raster<f64>, nodata: Option<f64>) -> PathBuf {
    let path = dir.join(name);
    write_geotiff(&path, raster, nodata).expect("Failed to write fixture raster");
    path
}

/// Line feature with string tags.
pub fn line_feature(coords: &[(f64, f64)], tags: &[(&str, &str)]) -> Feature {
    let geometry = Geometry::LineString {
        coordinates: coords.iter().map(|&(x, y)| Position::new(x, y)).collect(),
    };
    with_tags(Feature::new(geometry), tags)
}

/// Point feature with string tags.
pub fn point_feature(x: f64, y: f64, tags: &[(&str, &str)]) -> Feature {
    with_tags(
        Feature::new(Geometry::Point {
            coordinates: Position::new(x, y),
        }),
        tags,
    )
}

/// Polygon feature from an extent `(x0, y0, x1, y1)`.
pub fn extent_feature(extent: (f64, f64, f64, f64), tags: &[(&str, &str)]) -> Feature {
    let geometry = Geometry::from_geo(&crate::extent_polygon(extent));
    with_tags(Feature::new(geometry), tags)
}

fn with_tags(feature: Feature, tags: &[(&str, &str)]) -> Feature {
    tags.iter()
        .fold(feature, |f, (k, v)| f.with_property(k, serde_json::Value::from(*v)))
}

/// Write a feature collection in `crs` as `<dir>/<name>` and return the path.
pub fn write_features(dir: &Path, name: &str, features: Vec<Feature>, crs: CrsCode) -> PathBuf {
    let path = dir.join(name);
    FeatureCollection::new(features)
        .with_crs(crs)
        .write(&path)
        .expect("Failed to write fixture features");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit_grid;

    #[test]
    fn test_ramp_raster() {
        let raster = ramp_raster(&unit_grid(3, 4));
        assert_eq!(raster.data().len(), 12);
        assert_eq!(raster.get(2, 3), Some(3002.0));
    }

    #[test]
    fn test_line_feature_tags() {
        let f = line_feature(&[(0.0, 0.0), (1.0, 1.0)], &[("highway", "primary")]);
        assert_eq!(f.property_str("highway").as_deref(), Some("primary"));
    }
}
