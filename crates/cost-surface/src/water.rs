//! Surface water raster from OpenStreetMap water features.

use crate::layers::read_vector_layer;
use access_common::{AccessResult, Feature, Grid};
use raster_io::{rasterize, Raster, RasterizeOptions};
use std::path::Path;
use tracing::info;

const WATER_BODIES: &[&str] = &["lake", "basin", "reservoir", "lagoon", "river"];
const LARGE_WATERWAYS: &[&str] = &["riverbank", "river", "canal"];

/// True when a feature is surface water. Streams only count with `include_streams`.
pub fn is_water(feature: &Feature, include_streams: bool) -> bool {
    let water = feature.property_str("water");
    let waterway = feature.property_str("waterway");
    water.as_deref().is_some_and(|w| WATER_BODIES.contains(&w))
        || waterway.as_deref().is_some_and(|w| {
            LARGE_WATERWAYS.contains(&w) || (include_streams && w == "stream")
        })
}

/// Rasterize water features onto `grid` (1 = water, 0 = dry).
pub fn water_raster(
    features: &[(Feature, geo::Geometry<f64>)],
    grid: &Grid,
    include_streams: bool,
) -> Raster<u8> {
    let water: Vec<&geo::Geometry<f64>> = features
        .iter()
        .filter(|(f, _)| is_water(f, include_streams))
        .map(|(_, g)| g)
        .collect();
    info!(objects = water.len(), include_streams, "Rasterizing OSM water");
    rasterize(
        water.into_iter().map(|g| (g, 1u8)),
        grid,
        0u8,
        RasterizeOptions::all_touched(),
    )
}

/// Load an OSM water layer and rasterize it.
pub fn load_water_raster(path: &Path, grid: &Grid, include_streams: bool) -> AccessResult<Raster<u8>> {
    let features = read_vector_layer("water", path, grid)?;
    Ok(water_raster(&features, grid, include_streams))
}
