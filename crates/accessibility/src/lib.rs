//! Population-weighted accessibility statistics.
//!
//! Zones (administrative areas) are summed over a population raster at its
//! native resolution. Travel-time rasters produced by the cost-distance step
//! are thresholded at a set of levels in minutes to count the population
//! that can reach a destination in time.
//!
//! # Example
//!
//! ```ignore
//! use accessibility::{accessibility_stats, population_counts, AccessibilityReport, Zones};
//!
//! let zones = Zones::load(Path::new("areas.geojson"), "GID_2")?;
//! let population = accessibility::load_population(Path::new("population.tif"))?;
//! let totals = population_counts(&population, &zones);
//! let stats = accessibility_stats(&cost, &population, &zones, &[30, 60], Default::default())?;
//! AccessibilityReport::new("car", "health", &totals, &stats).write(&out)?;
//! ```

pub mod convert;
pub mod report;
pub mod stats;
pub mod zones;

pub use convert::{seconds_to_minutes, write_travel_time};
pub use report::{AccessibilityReport, LevelSummary, ZoneSummary};
pub use stats::{accessibility_stats, load_population, population_counts, LevelTotals, ZoneTotals};
pub use zones::{Zone, Zones};
