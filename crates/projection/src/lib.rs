//! Coordinate reference system transformations.
//!
//! Implements the projections the modeling grid can use from scratch:
//! spherical Web Mercator and WGS84 Transverse Mercator (UTM zones), with
//! EPSG:4326 as the pivot between them.

pub mod mercator;
pub mod transform;
pub mod utm;

pub use mercator::WebMercator;
pub use transform::Transformer;
pub use utm::TransverseMercator;
