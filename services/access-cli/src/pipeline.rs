//! Modeling run driver.
//!
//! ```text
//! grid      aoi.geojson ──► meta.json
//! friction  input layers ──► obstacles.tif, friction_<mode>.tif
//! access    friction + destinations ──► cost/nearest/backlink_<mode>_<name>.tif,
//!           travel_time_<mode>_<name>.tif, access_<mode>_<name>.json
//! ```

use crate::config::AccessConfig;
use access_common::{AccessError, AccessResult, CrsCode, FeatureCollection};
use accessibility::{
    accessibility_stats, load_population, population_counts, seconds_to_minutes,
    write_travel_time, AccessibilityReport, Zones,
};
use cost_distance::{CostDistance, CostSolver, Targets};
use cost_surface::layers::read_raster_layer;
use cost_surface::session::META_FILE;
use cost_surface::{
    qa, write_friction, write_obstacles, CostSurface, Session, SurfaceInputs, TransportMode,
    TravelSpeeds,
};
use geo::MultiPolygon;
use projection::Transformer;
use raster_io::{read_geotiff, InterpolationMethod, Raster};
use std::path::PathBuf;
use tracing::{info, warn};

pub const ELEVATION_FILE: &str = "elevation.tif";
pub const OBSTACLES_FILE: &str = "obstacles.tif";

/// Friction surface written for one mode.
#[derive(Debug, Clone)]
pub struct ModeFriction {
    pub mode: TransportMode,
    pub path: PathBuf,
    pub friction: Raster<f64>,
}

/// Build the analysis grid from the configured AOI and persist it.
pub fn build_session(config: &AccessConfig) -> AccessResult<Session> {
    let aoi_path = config.input(&config.aoi);
    let aoi = area_of_interest(&FeatureCollection::read("aoi", &aoi_path)?)?;
    let session = Session::create(
        config.country.clone(),
        aoi,
        config.grid.crs,
        config.grid.resolution,
    )?;
    session.dump(&config.output_dir)?;
    Ok(session)
}

/// Restore the session of `output_dir`, building it on first use.
pub fn open_session(config: &AccessConfig) -> AccessResult<Session> {
    if config.output_dir.join(META_FILE).is_file() {
        let session = Session::restore(&config.output_dir)?;
        if session.grid().crs() != config.grid.crs || session.resolution() != config.grid.resolution {
            warn!(
                crs = %session.grid().crs(),
                resolution = session.resolution(),
                "Existing session differs from configured grid, keeping existing session"
            );
        }
        Ok(session)
    } else {
        build_session(config)
    }
}

/// Union of the polygons of `collection` in EPSG:4326.
fn area_of_interest(collection: &FeatureCollection) -> AccessResult<geo::Geometry<f64>> {
    let to_geographic = Transformer::new(collection.crs_code()?, CrsCode::Epsg4326);
    let mut polygons = Vec::new();
    for geometry in collection.geometries()? {
        match to_geographic.transform_geometry(&geometry) {
            geo::Geometry::Polygon(p) => polygons.push(p),
            geo::Geometry::MultiPolygon(mp) => polygons.extend(mp),
            _ => {}
        }
    }
    if polygons.is_empty() {
        return Err(AccessError::bad_data("aoi", "no polygon in area of interest"));
    }
    Ok(geo::Geometry::MultiPolygon(MultiPolygon(polygons)))
}

fn travel_speeds(config: &AccessConfig) -> AccessResult<TravelSpeeds> {
    match &config.speeds {
        Some(path) => TravelSpeeds::load(&config.input(path)),
        None => TravelSpeeds::embedded(),
    }
}

/// Compute and write the friction surface of every mode.
pub fn compute_friction(
    config: &AccessConfig,
    session: &Session,
    modes: &[TransportMode],
) -> AccessResult<Vec<ModeFriction>> {
    if modes.is_empty() {
        return Err(AccessError::configuration("no transport mode selected"));
    }
    let speeds = travel_speeds(config)?;
    let mut inputs = SurfaceInputs::in_dir(&config.input_dir);
    inputs.include_streams = config.include_streams;
    let mut surface = CostSurface::new(session, &speeds, inputs);

    qa::check_nan_ratio("land cover", surface.off_road_speed()?, session.mask())?;
    write_obstacles(&config.output(OBSTACLES_FILE), surface.obstacles(config.obstacles)?)?;

    let mut frictions = Vec::with_capacity(modes.len());
    for &mode in modes {
        let friction = surface.friction(mode, config.obstacles, config.walk_speed)?;
        let path = config.output(&format!("friction_{}.tif", mode));
        write_friction(&path, &friction, &config.solver.raster)?;
        frictions.push(ModeFriction {
            mode,
            path,
            friction,
        });
    }
    qa::check_directory_alignment(&config.output_dir)?;
    Ok(frictions)
}

/// Solve every mode against every destination layer and aggregate the
/// resulting travel times. Returns the written report paths.
pub fn compute_access<S: CostSolver>(
    config: &AccessConfig,
    session: &Session,
    frictions: &[ModeFriction],
    orchestrator: &CostDistance<S>,
) -> AccessResult<Vec<PathBuf>> {
    let settings = &config.access;
    if settings.destinations.is_empty() {
        return Err(AccessError::configuration("no destination layer configured"));
    }

    let zones = Zones::load(&config.input(&settings.zones), &settings.zone_id)?;
    let population = load_population(&config.input(&settings.population))?;
    let totals = population_counts(&population, &zones);
    info!(zones = zones.len(), "Counted population per zone");

    let elevation = if frictions.iter().any(|f| f.mode.is_anisotropic()) {
        Some(read_raster_layer(
            "elevation",
            &config.input(std::path::Path::new(ELEVATION_FILE)),
            session.grid(),
            InterpolationMethod::Bilinear,
        )?)
    } else {
        None
    };

    let mut reports = Vec::new();
    for (name, path) in &settings.destinations {
        let targets = Targets::load(&config.input(path))?;
        for entry in frictions {
            let label = format!("{}_{}", entry.mode, name);
            let outputs = match (&elevation, entry.mode.is_anisotropic()) {
                (Some(elevation), true) => orchestrator.anisotropic(
                    &entry.friction,
                    elevation,
                    &targets,
                    &config.output_dir,
                    &label,
                )?,
                _ => orchestrator.isotropic(&entry.friction, &targets, &config.output_dir, &label)?,
            };

            let cost = read_geotiff(&outputs.cost).map_err(|e| e.into_access("cost"))?;
            write_travel_time(
                &config.output(&format!("travel_time_{}.tif", label)),
                &seconds_to_minutes(&cost),
                &config.solver.raster,
            )?;

            let stats =
                accessibility_stats(&cost, &population, &zones, &settings.levels, settings.resampling)?;
            let report = AccessibilityReport::new(entry.mode.as_str(), name.as_str(), &totals, &stats);
            let report_path = config.output_dir.join(format!("access_{}.json", label));
            report.write(&report_path)?;
            reports.push(report_path);
        }
    }
    Ok(reports)
}
