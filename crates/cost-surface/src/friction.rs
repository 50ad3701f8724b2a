//! Speed composition and friction conversion.

use access_common::{AccessError, AccessResult};
use raster_io::{write_geotiff, Mask, Raster, RasterConfig};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Transport scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Car,
    Walk,
    Bike,
}

impl TransportMode {
    pub const ALL: [TransportMode; 3] = [TransportMode::Car, TransportMode::Walk, TransportMode::Bike];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Car => "car",
            TransportMode::Walk => "walk",
            TransportMode::Bike => "bike",
        }
    }

    /// Walking accumulates cost over terrain with elevation.
    pub fn is_anisotropic(&self) -> bool {
        matches!(self, TransportMode::Walk)
    }
}

impl FromStr for TransportMode {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car" => Ok(TransportMode::Car),
            "walk" => Ok(TransportMode::Walk),
            "bike" => Ok(TransportMode::Bike),
            other => Err(AccessError::configuration(format!(
                "invalid transport mode '{}' (expected car, walk or bike)",
                other
            ))),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `max(off_road with obstacles zeroed, on_road)`, km/h.
///
/// Obstacles only suppress off-road travel: a road crossing an obstacle
/// keeps its speed.
pub fn combine_speed(
    off_road: &Raster<f64>,
    on_road: &Raster<f64>,
    obstacles: &Mask,
) -> AccessResult<Raster<f64>> {
    let off_road = off_road
        .zip_map(obstacles, |speed, blocked| if blocked { 0.0 } else { speed })
        .map_err(|e| e.into_access("off-road speed"))?;
    off_road
        .zip_map(on_road, |off, on| off.max(on))
        .map_err(|e| e.into_access("on-road speed"))
}

/// Convert a combined speed (km/h) into friction.
///
/// Walking friction is seconds per meter, with speed clipped to
/// `walk_ceiling_kmh`. Other modes use seconds per pixel. Zero and undefined
/// speeds give `NaN`, then every pixel outside `aoi` is set to `NaN`.
pub fn friction(
    speed_kmh: &Raster<f64>,
    mode: TransportMode,
    aoi: &Mask,
    walk_ceiling_kmh: f64,
) -> AccessResult<Raster<f64>> {
    if mode == TransportMode::Walk && !(walk_ceiling_kmh > 0.0) {
        return Err(AccessError::configuration(format!(
            "walking speed must be positive, got {}",
            walk_ceiling_kmh
        )));
    }
    aoi.ensure_aligned(speed_kmh.grid())
        .map_err(|e| e.into_access("aoi mask"))?;
    let pixel_size = speed_kmh.grid().pixel_size();

    let mut out = speed_kmh.map(|kmh| {
        let kmh = match mode {
            TransportMode::Walk => kmh.min(walk_ceiling_kmh),
            TransportMode::Car | TransportMode::Bike => kmh,
        };
        let ms = kmh / 3.6;
        let value = match mode {
            TransportMode::Walk => 1.0 / ms,
            TransportMode::Car | TransportMode::Bike => pixel_size / ms,
        };
        if ms == 0.0 || !value.is_finite() {
            f64::NAN
        } else {
            value
        }
    });

    // AOI clipping is applied last
    for (value, inside) in out.data_mut().iter_mut().zip(aoi.data()) {
        if !inside {
            *value = f64::NAN;
        }
    }

    info!(
        mode = %mode,
        valid = out.valid_count(),
        total = out.grid().len(),
        "Computed friction surface"
    );
    Ok(out)
}

/// Persist a friction raster with the numeric friction sentinel.
pub fn write_friction(path: &Path, friction: &Raster<f64>, config: &RasterConfig) -> AccessResult<()> {
    write_geotiff(path, friction, Some(config.friction_nodata))
        .map_err(|e| e.into_access("friction"))?;
    info!(path = %path.display(), "Saved friction surface");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{assert_approx_eq, unit_grid, uniform_raster};

    #[test]
    fn test_mode_parse() {
        assert_eq!("walk".parse::<TransportMode>().unwrap(), TransportMode::Walk);
        assert!(TransportMode::Walk.is_anisotropic());
        assert!(!TransportMode::Bike.is_anisotropic());
        assert!(matches!(
            "boat".parse::<TransportMode>(),
            Err(AccessError::Configuration(_))
        ));
    }

    #[test]
    fn test_road_wins_over_obstacle() {
        let grid = unit_grid(1, 3);
        let off = uniform_raster(&grid, 6.0);
        let mut on = uniform_raster(&grid, 0.0);
        on.set(0, 0, 25.0);
        on.set(0, 2, 4.0);
        let mut obstacles = Mask::filled(&grid, false);
        obstacles.set(0, 0, true);
        obstacles.set(0, 1, true);

        let speed = combine_speed(&off, &on, &obstacles).unwrap();
        assert_eq!(speed.data(), &[25.0, 0.0, 6.0]);
    }

    #[test]
    fn test_walk_friction_is_seconds_per_meter() {
        let grid = unit_grid(2, 2);
        let speed = uniform_raster(&grid, 4.0);
        let aoi = Mask::filled(&grid, true);
        let f = friction(&speed, TransportMode::Walk, &aoi, 5.0).unwrap();
        for v in f.data() {
            assert_approx_eq!(*v, 0.9, 1e-12);
        }

        // Faster surfaces are clipped to the walking ceiling
        let f = friction(&uniform_raster(&grid, 50.0), TransportMode::Walk, &aoi, 5.0).unwrap();
        assert_approx_eq!(f.get(0, 0).unwrap(), 0.72, 1e-12);
    }

    #[test]
    fn test_car_friction_is_seconds_per_pixel() {
        let grid = unit_grid(1, 1);
        let aoi = Mask::filled(&grid, true);
        let f = friction(&uniform_raster(&grid, 36.0), TransportMode::Car, &aoi, 5.0).unwrap();
        assert_approx_eq!(f.get(0, 0).unwrap(), 10.0, 1e-12);
    }

    #[test]
    fn test_zero_nan_and_outside_aoi() {
        let grid = unit_grid(1, 4);
        let mut speed = uniform_raster(&grid, 10.0);
        speed.set(0, 0, 0.0);
        speed.set(0, 1, f64::NAN);
        let mut aoi = Mask::filled(&grid, true);
        aoi.set(0, 3, false);

        let f = friction(&speed, TransportMode::Bike, &aoi, 5.0).unwrap();
        test_utils::assert_all_nan!(f, [(0, 0), (0, 1), (0, 3)]);
        assert_approx_eq!(f.get(0, 2).unwrap(), 36.0, 1e-12);
    }

    #[test]
    fn test_write_friction_uses_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let grid = unit_grid(1, 2);
        let mut f = uniform_raster(&grid, 0.9);
        f.set(0, 1, f64::NAN);
        let path = dir.path().join("friction_walk.tif");
        write_friction(&path, &f, &RasterConfig::default()).unwrap();

        let back = raster_io::read_geotiff(&path).unwrap();
        assert_eq!(back.nodata(), Some(raster_io::FRICTION_NODATA));
        assert!(back.get(0, 1).unwrap().is_nan());
    }
}
