//! Travel-time raster conversions.

use access_common::AccessResult;
use raster_io::{write_geotiff, Raster, RasterConfig};
use std::path::Path;

/// Accumulated cost in seconds to travel time in minutes.
pub fn seconds_to_minutes(seconds: &Raster<f64>) -> Raster<f64> {
    seconds.map(|v| v / 60.0)
}

/// Write a travel-time raster with the cost nodata sentinel.
pub fn write_travel_time(path: &Path, minutes: &Raster<f64>, config: &RasterConfig) -> AccessResult<()> {
    write_geotiff(path, minutes, Some(config.cost_nodata)).map_err(|e| e.into_access("travel time"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{unit_grid, uniform_raster};

    #[test]
    fn test_seconds_to_minutes() {
        let mut cost = uniform_raster(&unit_grid(2, 2), 5400.0);
        cost.set(1, 1, f64::NAN);
        let minutes = seconds_to_minutes(&cost);
        assert_eq!(minutes.get(0, 0), Some(90.0));
        assert!(minutes.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn test_written_travel_time_keeps_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("travel_time.tif");
        let mut minutes = uniform_raster(&unit_grid(2, 2), 12.5);
        minutes.set(0, 1, f64::NAN);

        write_travel_time(&path, &minutes, &RasterConfig::default()).unwrap();
        let back = raster_io::read_geotiff(&path).unwrap();
        assert_eq!(back.nodata(), Some(raster_io::COST_NODATA));
        assert!(back.get(0, 1).unwrap().is_nan());
        assert_eq!(back.get(1, 1), Some(12.5));
    }
}
