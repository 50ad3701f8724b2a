//! Friction surface assembly for one session.
//!
//! Speed rasters do not depend on the transport mode, so they are computed
//! once and reused for every mode of a run. The obstacle mask is reused as
//! long as the thresholds do not change.

use crate::friction::{combine_speed, friction, TransportMode};
use crate::landcover::LandCover;
use crate::layers::read_raster_layer;
use crate::obstacles::{obstacle_mask, ObstacleLayers, ObstacleThresholds};
use crate::roads::RoadNetwork;
use crate::session::Session;
use crate::speeds::TravelSpeeds;
use crate::water::load_water_raster;
use access_common::AccessResult;
use raster_io::{InterpolationMethod, Mask, Raster};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Locations of the preprocessed input layers.
#[derive(Debug, Clone)]
pub struct SurfaceInputs {
    /// Directory holding `landcover_<class>.tif` files.
    pub land_cover_dir: PathBuf,
    pub roads: PathBuf,
    /// Optional ferry layer; absent file means no ferries.
    pub ferries: Option<PathBuf>,
    /// OSM water, vector (`.geojson`) or already rasterized (`.tif`).
    pub water_osm: PathBuf,
    pub water_seasonality: PathBuf,
    pub slope: PathBuf,
    /// Include streams when rasterizing OSM water.
    pub include_streams: bool,
}

impl SurfaceInputs {
    /// Conventional file names inside one input directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            land_cover_dir: dir.to_path_buf(),
            roads: dir.join("roads.geojson"),
            ferries: Some(dir.join("ferry.geojson")),
            water_osm: dir.join("water_osm.tif"),
            water_seasonality: dir.join("water_gsw.tif"),
            slope: dir.join("slope.tif"),
            include_streams: false,
        }
    }
}

/// Builds friction surfaces, caching intermediate rasters.
pub struct CostSurface<'a> {
    session: &'a Session,
    speeds: &'a TravelSpeeds,
    inputs: SurfaceInputs,
    off_road: Option<Raster<f64>>,
    on_road: Option<Raster<f64>>,
    obstacles: Option<(ObstacleThresholds, Mask)>,
}

impl<'a> CostSurface<'a> {
    pub fn new(session: &'a Session, speeds: &'a TravelSpeeds, inputs: SurfaceInputs) -> Self {
        Self {
            session,
            speeds,
            inputs,
            off_road: None,
            on_road: None,
            obstacles: None,
        }
    }

    pub fn session(&self) -> &Session {
        self.session
    }

    /// Off-road speed in km/h.
    pub fn off_road_speed(&mut self) -> AccessResult<&Raster<f64>> {
        let (session, speeds, inputs) = (self.session, self.speeds, &self.inputs);
        cached(&mut self.off_road, || load_off_road(inputs, session, speeds))
    }

    /// On-road speed in km/h.
    pub fn on_road_speed(&mut self) -> AccessResult<&Raster<f64>> {
        let (session, speeds, inputs) = (self.session, self.speeds, &self.inputs);
        cached(&mut self.on_road, || load_on_road(inputs, session, speeds))
    }

    /// Obstacle mask for `thresholds`.
    pub fn obstacles(&mut self, thresholds: ObstacleThresholds) -> AccessResult<&Mask> {
        let (session, inputs) = (self.session, &self.inputs);
        invalidate_obstacles(&mut self.obstacles, thresholds);
        let (_, mask) = cached(&mut self.obstacles, || {
            Ok((thresholds, load_obstacles(inputs, session, thresholds)?))
        })?;
        Ok(mask)
    }

    /// Friction surface for `mode`, clipped to the session AOI.
    pub fn friction(
        &mut self,
        mode: TransportMode,
        thresholds: ObstacleThresholds,
        walk_ceiling_kmh: f64,
    ) -> AccessResult<Raster<f64>> {
        info!(mode = %mode, max_slope = thresholds.max_slope, "Computing friction surface");
        let (session, speeds, inputs) = (self.session, self.speeds, &self.inputs);

        let off_road = cached(&mut self.off_road, || load_off_road(inputs, session, speeds))?;
        let on_road = cached(&mut self.on_road, || load_on_road(inputs, session, speeds))?;
        invalidate_obstacles(&mut self.obstacles, thresholds);
        let (_, obstacles) = cached(&mut self.obstacles, || {
            Ok((thresholds, load_obstacles(inputs, session, thresholds)?))
        })?;

        let speed = combine_speed(off_road, on_road, obstacles)?;
        debug!(mode = %mode, "Combined off-road and on-road speed");
        friction(&speed, mode, session.mask(), walk_ceiling_kmh)
    }
}

fn cached<T>(slot: &mut Option<T>, compute: impl FnOnce() -> AccessResult<T>) -> AccessResult<&T> {
    let value = match slot.take() {
        Some(value) => value,
        None => compute()?,
    };
    Ok(slot.insert(value))
}

fn invalidate_obstacles(slot: &mut Option<(ObstacleThresholds, Mask)>, thresholds: ObstacleThresholds) {
    if slot.as_ref().is_some_and(|(t, _)| *t != thresholds) {
        *slot = None;
    }
}

fn load_off_road(inputs: &SurfaceInputs, session: &Session, speeds: &TravelSpeeds) -> AccessResult<Raster<f64>> {
    LandCover::load(&inputs.land_cover_dir, session.grid())?.off_road_speed(speeds, session.grid())
}

fn load_on_road(inputs: &SurfaceInputs, session: &Session, speeds: &TravelSpeeds) -> AccessResult<Raster<f64>> {
    let network = RoadNetwork::load(&inputs.roads, inputs.ferries.as_deref(), session.grid())?;
    Ok(network.on_road_speed(speeds, session.grid()))
}

fn load_obstacles(
    inputs: &SurfaceInputs,
    session: &Session,
    thresholds: ObstacleThresholds,
) -> AccessResult<Mask> {
    let grid = session.grid();
    let water_osm = if inputs.water_osm.extension().and_then(|e| e.to_str()) == Some("tif") {
        read_raster_layer("water_osm", &inputs.water_osm, grid, InterpolationMethod::Nearest)?
    } else {
        load_water_raster(&inputs.water_osm, grid, inputs.include_streams)?.map(f64::from)
    };
    let water_seasonality = read_raster_layer(
        "water_seasonality",
        &inputs.water_seasonality,
        grid,
        InterpolationMethod::Bilinear,
    )?;
    let slope = read_raster_layer("slope", &inputs.slope, grid, InterpolationMethod::Bilinear)?;

    obstacle_mask(
        ObstacleLayers {
            water_osm: &water_osm,
            water_seasonality: &water_seasonality,
            slope: &slope,
        },
        thresholds,
        grid,
    )
}
