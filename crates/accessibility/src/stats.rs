//! Zonal population statistics.
//!
//! Zones are reprojected into the population raster's CRS and rasterized by
//! pixel centre on its native grid, so totals never depend on the modeling
//! resolution. Travel times are brought onto the population grid once and
//! every level thresholds that single array.

use crate::zones::Zones;
use access_common::{AccessError, AccessResult};
use raster_io::{polygon_spans, read_geotiff, resample, Grid, InterpolationMethod, Raster};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Per-zone totals keyed by zone id.
pub type ZoneTotals = BTreeMap<String, f64>;

/// Per-level totals keyed by travel-time level in minutes.
pub type LevelTotals = BTreeMap<u32, ZoneTotals>;

/// Pixel runs covered by one zone.
struct Footprint<'a> {
    id: &'a str,
    spans: Vec<(usize, usize, usize)>,
}

pub fn load_population(path: &Path) -> AccessResult<Raster<f64>> {
    read_geotiff(path).map_err(|e| e.into_access("population"))
}

fn footprints<'a>(zones: &'a Zones, grid: &Grid) -> Vec<Footprint<'a>> {
    let projected = zones.to_crs(grid.crs());
    zones
        .iter()
        .zip(projected.iter())
        .map(|(zone, shape)| Footprint {
            id: zone.id.as_str(),
            spans: shape
                .geometry
                .iter()
                .flat_map(|poly| polygon_spans(poly, grid))
                .collect(),
        })
        .collect()
}

/// Sum of `values` over the spans, weighted by `keep`. `NaN` values add nothing.
fn span_sum(values: &Raster<f64>, spans: &[(usize, usize, usize)], keep: impl Fn(usize) -> bool) -> f64 {
    let grid = values.grid();
    let data = values.data();
    let mut total = 0.0;
    for &(row, start, end) in spans {
        for col in start..end {
            let idx = grid.index(row, col);
            let v = data[idx];
            if !v.is_nan() && keep(idx) {
                total += v;
            }
        }
    }
    total
}

/// Total population of every zone. Zones outside the raster report `0`.
pub fn population_counts(population: &Raster<f64>, zones: &Zones) -> ZoneTotals {
    footprints(zones, population.grid())
        .into_iter()
        .map(|fp| (fp.id.to_string(), span_sum(population, &fp.spans, |_| true)))
        .collect()
}

/// Population reachable within each level (minutes) of `travel_time`
/// (seconds), per zone.
///
/// A pixel counts for a level when its resampled travel time is at most
/// `level * 60`. Pixels with an undefined travel time are never reachable.
pub fn accessibility_stats(
    travel_time: &Raster<f64>,
    population: &Raster<f64>,
    zones: &Zones,
    levels: &[u32],
    method: InterpolationMethod,
) -> AccessResult<LevelTotals> {
    if levels.is_empty() {
        return Err(AccessError::configuration("at least one travel-time level is required"));
    }

    let time = if travel_time.grid().is_aligned_with(population.grid()) {
        travel_time.clone()
    } else {
        resample(travel_time, population.grid(), method)
    };
    let time = time.data();
    let footprints = footprints(zones, population.grid());

    let mut stats = LevelTotals::new();
    for &level in levels {
        let limit = f64::from(level) * 60.0;
        let totals = footprints
            .iter()
            .map(|fp| {
                let reachable = span_sum(population, &fp.spans, |idx| time[idx] <= limit);
                (fp.id.to_string(), reachable)
            })
            .collect();
        debug!(level, zones = footprints.len(), "Computed accessible population");
        stats.insert(level, totals);
    }

    info!(
        levels = ?levels,
        zones = zones.len(),
        method = %method,
        "Computed accessibility statistics"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::Zone;
    use access_common::CrsCode;
    use test_utils::{extent_polygon, unit_grid, uniform_raster};

    fn zone(id: &str, extent: (f64, f64, f64, f64)) -> Zone {
        let geometry = match extent_polygon(extent) {
            geo::Geometry::Polygon(p) => geo::MultiPolygon(vec![p]),
            _ => unreachable!("extent polygon"),
        };
        Zone {
            id: id.to_string(),
            geometry,
        }
    }

    fn zones() -> Zones {
        Zones::new(
            vec![
                zone("west", (0.0, 0.0, 200.0, 400.0)),
                zone("east", (200.0, 0.0, 400.0, 400.0)),
                zone("far", (5000.0, 5000.0, 6000.0, 6000.0)),
            ],
            CrsCode::Epsg3857,
        )
        .unwrap()
    }

    /// Travel time of `col * 10` minutes.
    fn column_times(grid: &Grid) -> Raster<f64> {
        let mut r = Raster::filled(grid, 0.0);
        for row in 0..grid.height() {
            for col in 0..grid.width() {
                r.set(row, col, col as f64 * 600.0);
            }
        }
        r
    }

    #[test]
    fn test_population_counts() {
        let grid = unit_grid(4, 4);
        let mut pop = uniform_raster(&grid, 2.0);
        pop.set(0, 0, f64::NAN);

        let totals = population_counts(&pop, &zones());
        assert_eq!(totals["west"], 14.0);
        assert_eq!(totals["east"], 16.0);
        assert_eq!(totals["far"], 0.0);
    }

    #[test]
    fn test_population_counts_is_idempotent() {
        let grid = unit_grid(4, 4);
        let pop = uniform_raster(&grid, 1.5);
        let zones = zones();
        assert_eq!(population_counts(&pop, &zones), population_counts(&pop, &zones));
    }

    #[test]
    fn test_levels_threshold_travel_time() {
        let grid = unit_grid(4, 4);
        let pop = uniform_raster(&grid, 1.0);
        let time = column_times(&grid);

        let stats =
            accessibility_stats(&time, &pop, &zones(), &[5, 10, 30], InterpolationMethod::Bilinear)
                .unwrap();
        assert_eq!(stats[&5]["west"], 4.0);
        assert_eq!(stats[&5]["east"], 0.0);
        // Level bounds are inclusive
        assert_eq!(stats[&10]["west"], 8.0);
        assert_eq!(stats[&30]["east"], 8.0);
        assert_eq!(stats[&30]["far"], 0.0);
    }

    #[test]
    fn test_undefined_travel_time_is_unreachable() {
        let grid = unit_grid(4, 4);
        let pop = uniform_raster(&grid, 1.0);
        let mut time = uniform_raster(&grid, 0.0);
        time.set(1, 1, f64::NAN);

        let stats =
            accessibility_stats(&time, &pop, &zones(), &[60], InterpolationMethod::Nearest).unwrap();
        assert_eq!(stats[&60]["west"], 7.0);
    }

    #[test]
    fn test_coarser_travel_time_is_resampled() {
        let pop_grid = unit_grid(4, 4);
        let pop = uniform_raster(&pop_grid, 1.0);
        let coarse = test_utils::grid_at(0.0, 400.0, 200.0, 2, 2, CrsCode::Epsg3857);
        let mut time = uniform_raster(&coarse, 60.0);
        time.set(1, 1, 7200.0);
        time.set(0, 1, 7200.0);

        let stats =
            accessibility_stats(&time, &pop, &zones(), &[30], InterpolationMethod::Nearest).unwrap();
        assert_eq!(stats[&30]["west"], 8.0);
        assert_eq!(stats[&30]["east"], 0.0);
    }

    #[test]
    fn test_bilinear_keeps_population_next_to_unreached_pixel() {
        let pop_grid = test_utils::grid_at(0.0, 1600.0, 100.0, 16, 16, CrsCode::Epsg3857);
        let pop = uniform_raster(&pop_grid, 1.0);
        let coarse = test_utils::grid_at(0.0, 1600.0, 400.0, 4, 4, CrsCode::Epsg3857);
        let mut time = uniform_raster(&coarse, 60.0);
        time.set(1, 1, f64::NAN);
        let zones = Zones::new(vec![zone("all", (0.0, 0.0, 1600.0, 1600.0))], CrsCode::Epsg3857)
            .unwrap();

        let nearest =
            accessibility_stats(&time, &pop, &zones, &[5], InterpolationMethod::Nearest).unwrap();
        assert_eq!(nearest[&5]["all"], 240.0);

        // No population pixel center falls on the undefined source center,
        // so every one has a defined neighbor to interpolate from
        let bilinear =
            accessibility_stats(&time, &pop, &zones, &[5], InterpolationMethod::Bilinear).unwrap();
        assert_eq!(bilinear[&5]["all"], 256.0);
    }

    #[test]
    fn test_no_levels_is_configuration_error() {
        let grid = unit_grid(2, 2);
        let pop = uniform_raster(&grid, 1.0);
        assert!(matches!(
            accessibility_stats(&pop, &pop, &zones(), &[], InterpolationMethod::Bilinear),
            Err(AccessError::Configuration(_))
        ));
    }
}
