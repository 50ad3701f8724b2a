//! Configuration for raster file I/O.

use serde::{Deserialize, Serialize};

/// Nodata sentinel written for friction rasters handed to the solver.
pub const FRICTION_NODATA: f64 = -1.0;

/// Nodata sentinel written for collected cost-distance outputs.
pub const COST_NODATA: f64 = -9999.0;

/// Configuration for raster file I/O.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterConfig {
    /// Sentinel replacing `NaN` in friction rasters.
    pub friction_nodata: f64,

    /// Sentinel for unreached pixels in accumulated-cost, nearest and backlink outputs.
    pub cost_nodata: f64,

    /// Upper bound on decoded raster size in megabytes.
    pub decoding_limit_mb: usize,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            friction_nodata: FRICTION_NODATA,
            cost_nodata: COST_NODATA,
            decoding_limit_mb: 4096,
        }
    }
}

impl RasterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RASTER_FRICTION_NODATA") {
            if let Ok(v) = val.parse() {
                config.friction_nodata = v;
            }
        }

        if let Ok(val) = std::env::var("RASTER_COST_NODATA") {
            if let Ok(v) = val.parse() {
                config.cost_nodata = v;
            }
        }

        if let Ok(val) = std::env::var("RASTER_DECODING_LIMIT_MB") {
            if let Ok(v) = val.parse() {
                config.decoding_limit_mb = v;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !self.friction_nodata.is_finite() || !self.cost_nodata.is_finite() {
            return Err("nodata sentinels must be finite numbers".to_string());
        }

        // Friction is seconds and strictly positive, so a positive sentinel
        // could collide with a real value.
        if self.friction_nodata > 0.0 {
            return Err("friction_nodata must be <= 0".to_string());
        }

        if self.friction_nodata == self.cost_nodata {
            return Err("friction_nodata and cost_nodata must differ".to_string());
        }

        if self.decoding_limit_mb == 0 {
            return Err("decoding_limit_mb must be > 0".to_string());
        }

        Ok(())
    }

    /// Decoding limit in bytes.
    pub fn decoding_limit_bytes(&self) -> usize {
        self.decoding_limit_mb * 1024 * 1024
    }
}
