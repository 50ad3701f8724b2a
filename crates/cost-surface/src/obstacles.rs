//! Impassable terrain.

use access_common::{AccessResult, Grid};
use raster_io::{write_geotiff, Mask, Raster};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Thresholds above which terrain cannot be crossed off-road.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleThresholds {
    /// Maximum passable slope in degrees.
    pub max_slope: f64,
    /// Water occurrence (0-100) from which a pixel counts as water.
    pub water_seasonality: f64,
}

impl Default for ObstacleThresholds {
    fn default() -> Self {
        Self {
            max_slope: 35.0,
            water_seasonality: 10.0,
        }
    }
}

impl ObstacleThresholds {
    pub fn with_max_slope(mut self, max_slope: f64) -> Self {
        self.max_slope = max_slope;
        self
    }
}

/// Rasters feeding the obstacle mask, all aligned to the analysis grid.
#[derive(Debug, Clone, Copy)]
pub struct ObstacleLayers<'a> {
    /// OSM water, `>= 1` is water.
    pub water_osm: &'a Raster<f64>,
    /// Surface water occurrence.
    pub water_seasonality: &'a Raster<f64>,
    /// Slope in degrees.
    pub slope: &'a Raster<f64>,
}

/// `water_osm >= 1 OR seasonality >= threshold OR slope >= max_slope`.
///
/// Undefined pixels never count as obstacles.
pub fn obstacle_mask(
    layers: ObstacleLayers<'_>,
    thresholds: ObstacleThresholds,
    grid: &Grid,
) -> AccessResult<Mask> {
    for (layer, raster) in [
        ("water_osm", layers.water_osm),
        ("water_seasonality", layers.water_seasonality),
        ("slope", layers.slope),
    ] {
        raster.ensure_aligned(grid).map_err(|e| e.into_access(layer))?;
    }

    let mut mask = Mask::filled(grid, false);
    let cells = layers
        .water_osm
        .data()
        .iter()
        .zip(layers.water_seasonality.data())
        .zip(layers.slope.data());
    for (out, ((osm, gsw), slope)) in mask.data_mut().iter_mut().zip(cells) {
        *out = *osm >= 1.0 || *gsw >= thresholds.water_seasonality || *slope >= thresholds.max_slope;
    }

    info!(
        max_slope = thresholds.max_slope,
        water_seasonality = thresholds.water_seasonality,
        obstacles = mask.count(),
        "Computed obstacle mask"
    );
    Ok(mask)
}

/// Persist the mask as a `u8` layer, `1` marking obstacles.
pub fn write_obstacles(path: &Path, mask: &Mask) -> AccessResult<()> {
    write_geotiff(path, &mask.map(u8::from), None).map_err(|e| e.into_access("obstacles"))?;
    info!(path = %path.display(), obstacles = mask.count(), "Saved obstacle mask");
    Ok(())
}
