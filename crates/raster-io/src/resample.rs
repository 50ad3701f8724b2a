//! Resample a raster onto another grid, reprojecting when the CRSs differ.

use crate::interpolation::InterpolationMethod;
use crate::types::Raster;
use access_common::Grid;
use projection::Transformer;
use tracing::debug;

/// Resample `src` onto `dst`.
///
/// Each destination pixel center is mapped into the source CRS and sampled
/// with `method`. Destination pixels falling outside the source, or on
/// undefined source pixels, are `NaN`.
pub fn resample(src: &Raster<f64>, dst: &Grid, method: InterpolationMethod) -> Raster<f64> {
    let to_src = Transformer::new(dst.crs(), src.grid().crs());
    let src_transform = src.grid().transform();
    let (src_w, src_h) = (src.width(), src.height());
    let (rows, cols) = dst.shape();

    let mut out = Raster::filled(dst, f64::NAN);
    for row in 0..rows {
        for col in 0..cols {
            let (x, y) = dst.pixel_center(row, col);
            let (sx, sy) = to_src.transform(x, y);
            let (fc, fr) = src_transform.invert(sx, sy);
            // Interpolators index between pixel centers
            let value = method.sample(src.data(), src_w, src_h, fc - 0.5, fr - 0.5);
            out.set(row, col, value);
        }
    }

    debug!(
        method = %method,
        src_crs = %src.grid().crs(),
        dst_crs = %dst.crs(),
        rows,
        cols,
        "Resampled raster"
    );
    out
}
