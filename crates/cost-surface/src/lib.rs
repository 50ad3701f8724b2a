//! Analysis grid, speed surfaces and friction for accessibility modeling.
//!
//! # Pipeline
//!
//! ```text
//! AOI ──build_grid──► Grid + AOI mask (Session, meta.json)
//!
//! landcover_*.tif ──LandCover──► off-road speed ─┐
//! roads/ferries ──RoadNetwork──► on-road speed ──┼─combine_speed─► speed ─friction─► friction.tif
//! water / slope ──obstacle_mask──► obstacles ────┘
//! ```
//!
//! All speeds are km/h. Friction is seconds per pixel, or seconds per meter
//! for walking.

pub mod friction;
pub mod grid_builder;
pub mod landcover;
pub mod layers;
pub mod obstacles;
pub mod qa;
pub mod roads;
pub mod session;
pub mod speeds;
pub mod surface;
pub mod water;

pub use friction::{combine_speed, friction, write_friction, TransportMode};
pub use grid_builder::{build_grid, rasterize_mask, MAX_GRID_PIXELS};
pub use landcover::LandCover;
pub use obstacles::{obstacle_mask, write_obstacles, ObstacleLayers, ObstacleThresholds};
pub use roads::{RoadNetwork, Segment};
pub use session::Session;
pub use speeds::{Highway, LandCoverClass, Smoothness, Surface, TrackType, TravelSpeeds};
pub use surface::{CostSurface, SurfaceInputs};
pub use water::{load_water_raster, water_raster};
