//! Common types shared across the accessibility modeling crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod vector;

pub use bbox::BoundingBox;
pub use crs::CrsCode;
pub use error::{AccessError, AccessResult};
pub use grid::{Affine, Grid};
pub use vector::{Feature, FeatureCollection, Geometry, Position};
