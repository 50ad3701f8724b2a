//! Request-scoped GIS environment.
//!
//! GRASS-like solvers need a database directory, a location bound to a CRS
//! and a mapset before the first command. All of it lives in this value and
//! is handed to the solver explicitly; nothing is read from or written to the
//! process environment.

use access_common::CrsCode;
use raster_io::RasterConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOCATION: &str = "ACCESS";
pub const DEFAULT_MAPSET: &str = "PERMANENT";
pub const DEFAULT_EXECUTABLE: &str = "grass";
pub const DEFAULT_MEMORY_MB: u32 = 8000;

/// Solver settings that outlive a single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Solver executable, resolved through `PATH` when relative.
    pub executable: PathBuf,
    /// Memory budget handed to the solver, in megabytes.
    pub memory_mb: u32,
    /// Directory under which scratch workspaces are created.
    pub cache_root: PathBuf,
    /// Sentinels of the staged friction and the collected outputs.
    pub raster: RasterConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from(DEFAULT_EXECUTABLE),
            memory_mb: DEFAULT_MEMORY_MB,
            cache_root: std::env::temp_dir(),
            raster: RasterConfig::from_env(),
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.memory_mb == 0 {
            return Err("solver memory must be > 0 MB".to_string());
        }
        if self.executable.as_os_str().is_empty() {
            return Err("solver executable must not be empty".to_string());
        }
        self.raster.validate()
    }
}

/// GIS database, location and mapset of one solver call.
#[derive(Debug, Clone, PartialEq)]
pub struct GisEnvironment {
    pub gisdbase: PathBuf,
    pub location: String,
    pub mapset: String,
    pub crs: CrsCode,
    pub executable: PathBuf,
    pub memory_mb: u32,
    /// Nodata written into exported solver rasters.
    pub cost_nodata: f64,
}

impl GisEnvironment {
    pub fn new(gisdbase: impl Into<PathBuf>, crs: CrsCode, config: &SolverConfig) -> Self {
        Self {
            gisdbase: gisdbase.into(),
            location: DEFAULT_LOCATION.to_string(),
            mapset: DEFAULT_MAPSET.to_string(),
            crs,
            executable: config.executable.clone(),
            memory_mb: config.memory_mb,
            cost_nodata: config.raster.cost_nodata,
        }
    }

    pub fn location_path(&self) -> PathBuf {
        self.gisdbase.join(&self.location)
    }

    pub fn mapset_path(&self) -> PathBuf {
        self.location_path().join(&self.mapset)
    }

    pub fn gisdbase(&self) -> &Path {
        &self.gisdbase
    }
}
