//! Interpolation methods for grid resampling.
//!
//! Sample positions are fractional pixel coordinates measured between pixel
//! centers: `(0.0, 0.0)` is the center of the top-left pixel.

use serde::{Deserialize, Serialize};

/// Interpolation method for grid resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Nearest neighbor (preserves exact values).
    Nearest,
    /// Bilinear interpolation (smooth, slight value changes).
    #[default]
    Bilinear,
}

impl InterpolationMethod {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Some(Self::Nearest),
            "bilinear" | "linear" => Some(Self::Bilinear),
            _ => None,
        }
    }

    pub fn sample(&self, data: &[f64], width: usize, height: usize, x: f64, y: f64) -> f64 {
        match self {
            Self::Nearest => nearest_interpolate(data, width, height, x, y),
            Self::Bilinear => bilinear_interpolate(data, width, height, x, y),
        }
    }
}

impl std::fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nearest => write!(f, "nearest"),
            Self::Bilinear => write!(f, "bilinear"),
        }
    }
}

/// Nearest neighbor interpolation.
///
/// Returns the value of the nearest grid point, `NaN` off the grid.
pub fn nearest_interpolate(data: &[f64], width: usize, height: usize, x: f64, y: f64) -> f64 {
    let col = x.round();
    let row = y.round();

    if col < 0.0 || row < 0.0 || col >= width as f64 || row >= height as f64 {
        return f64::NAN;
    }

    data[row as usize * width + col as usize]
}

/// Bilinear interpolation.
///
/// Smoothly interpolates between the four nearest grid points. Positions
/// within half a pixel outside the outermost centers are clamped to the edge.
/// `NaN` corners are left out and the remaining weights renormalized; the
/// result is `NaN` only when no corner with a non-zero weight is defined.
pub fn bilinear_interpolate(data: &[f64], width: usize, height: usize, x: f64, y: f64) -> f64 {
    if width == 0 || height == 0 || x < -0.5 || y < -0.5 {
        return f64::NAN;
    }
    if x > width as f64 - 0.5 || y > height as f64 - 0.5 {
        return f64::NAN;
    }

    let x = x.clamp(0.0, (width - 1) as f64);
    let y = y.clamp(0.0, (height - 1) as f64);

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let xf = x - x0 as f64;
    let yf = y - y0 as f64;

    let v00 = data[y0 * width + x0];
    let v10 = data[y0 * width + x1];
    let v01 = data[y1 * width + x0];
    let v11 = data[y1 * width + x1];

    let corners = [
        (v00, (1.0 - xf) * (1.0 - yf)),
        (v10, xf * (1.0 - yf)),
        (v01, (1.0 - xf) * yf),
        (v11, xf * yf),
    ];
    let (sum, weight) = corners
        .iter()
        .filter(|(v, w)| !v.is_nan() && *w > 0.0)
        .fold((0.0, 0.0), |(sum, weight), (v, w)| (sum + v * w, weight + w));

    if weight == 0.0 {
        return f64::NAN;
    }
    sum / weight
}
