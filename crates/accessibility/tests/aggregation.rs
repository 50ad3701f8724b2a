//! Zone loading, statistics and report over files on disk.

use access_common::CrsCode;
use accessibility::{
    accessibility_stats, load_population, population_counts, seconds_to_minutes,
    AccessibilityReport, Zones,
};
use raster_io::{InterpolationMethod, Raster};
use test_utils::{extent_feature, temp_test_dir, unit_grid, uniform_raster, write_features, write_raster};

#[test]
fn test_report_from_files() {
    let dir = temp_test_dir();
    let grid = unit_grid(4, 4);
    let pop_path = write_raster(dir.path(), "population.tif", &uniform_raster(&grid, 10.0), Some(-1.0));

    let mut cost = Raster::filled(&grid, 0.0);
    for row in 0..4 {
        for col in 0..4 {
            cost.set(row, col, (row * 4 + col) as f64 * 300.0);
        }
    }
    let zones_path = write_features(
        dir.path(),
        "areas.geojson",
        vec![
            extent_feature((0.0, 200.0, 400.0, 400.0), &[("GID_2", "north")]),
            extent_feature((0.0, 0.0, 400.0, 200.0), &[("GID_2", "south")]),
        ],
        CrsCode::Epsg3857,
    );

    let zones = Zones::load(&zones_path, "GID_2").unwrap();
    let population = load_population(&pop_path).unwrap();
    let totals = population_counts(&population, &zones);
    assert_eq!(totals["north"], 80.0);

    // Times run from 0 to 75 minutes, row-major
    let stats =
        accessibility_stats(&cost, &population, &zones, &[15, 90], InterpolationMethod::Bilinear)
            .unwrap();
    let report = AccessibilityReport::new("car", "health", &totals, &stats);

    let north = report.zone("north").unwrap();
    assert_eq!(north.levels[0].population, 40.0);
    assert_eq!(north.levels[0].share, 0.5);
    assert_eq!(north.levels[1].share, 1.0);
    let south = report.zone("south").unwrap();
    assert_eq!(south.levels[0].population, 0.0);
    assert_eq!(south.levels[1].population, 80.0);

    let minutes = seconds_to_minutes(&cost);
    assert_eq!(minutes.get(3, 3), Some(75.0));
}

#[test]
fn test_geographic_zones_are_reprojected() {
    let dir = temp_test_dir();
    let grid = unit_grid(4, 4);
    let pop_path = write_raster(dir.path(), "population.tif", &uniform_raster(&grid, 1.0), None);
    let zones_path = write_features(
        dir.path(),
        "areas.geojson",
        vec![extent_feature((-1.0, -1.0, 1.0, 1.0), &[("id", "origin")])],
        CrsCode::Epsg4326,
    );

    let zones = Zones::load(&zones_path, "id").unwrap();
    let totals = population_counts(&load_population(&pop_path).unwrap(), &zones);
    assert_eq!(totals["origin"], 16.0);
}

#[test]
fn test_missing_population_is_missing_data() {
    let dir = temp_test_dir();
    let err = load_population(&dir.path().join("population.tif")).unwrap_err();
    assert!(matches!(err, access_common::AccessError::MissingData { .. }));
}
