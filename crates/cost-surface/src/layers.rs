//! Reading input layers onto the analysis grid.

use access_common::{AccessError, AccessResult, FeatureCollection, Grid};
use projection::Transformer;
use raster_io::{read_geotiff, resample, InterpolationMethod, Raster};
use std::path::Path;
use tracing::debug;

/// Read a single-band raster layer and bring it onto `grid`.
///
/// Layers already aligned with the grid are returned as is. Anything else is
/// resampled with `method`.
pub fn read_raster_layer(
    layer: &str,
    path: &Path,
    grid: &Grid,
    method: InterpolationMethod,
) -> AccessResult<Raster<f64>> {
    let raster = read_geotiff(path).map_err(|e| e.into_access(layer))?;
    if raster.grid().is_aligned_with(grid) {
        return Ok(raster);
    }
    debug!(layer, path = %path.display(), method = %method, "Resampling layer onto grid");
    Ok(resample(&raster, grid, method))
}

/// Read a vector layer and reproject its geometries into `grid`'s CRS.
///
/// Returns each feature's geometry alongside the feature itself. Features
/// without a geometry are dropped.
pub fn read_vector_layer(
    layer: &str,
    path: &Path,
    grid: &Grid,
) -> AccessResult<Vec<(access_common::Feature, geo::Geometry<f64>)>> {
    let collection = FeatureCollection::read(layer, path)?;
    project_features(layer, collection, grid)
}

/// Reproject the geometries of a parsed collection into `grid`'s CRS.
pub fn project_features(
    layer: &str,
    collection: FeatureCollection,
    grid: &Grid,
) -> AccessResult<Vec<(access_common::Feature, geo::Geometry<f64>)>> {
    let src_crs = collection.crs_code()?;
    let to_grid = Transformer::new(src_crs, grid.crs());

    let mut features = Vec::with_capacity(collection.len());
    for feature in collection.features {
        let geometry = match &feature.geometry {
            Some(g) => to_grid.transform_geometry(&g.to_geo()?),
            None => continue,
        };
        features.push((feature, geometry));
    }
    if features.is_empty() {
        return Err(AccessError::bad_data(layer, "feature set is empty"));
    }
    debug!(layer, count = features.len(), src_crs = %src_crs, "Loaded vector layer");
    Ok(features)
}
