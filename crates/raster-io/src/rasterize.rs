//! Burn vector geometries onto a grid.
//!
//! All geometry coordinates must already be in the grid's CRS.
//!
//! - Points burn the pixel that contains them.
//! - Lines burn every pixel their segments pass through.
//! - Polygons burn every pixel whose center lies inside (even-odd rule over
//!   all rings). With `all_touched`, every pixel crossed by a ring is burned
//!   as well.

use crate::types::{Mask, Raster};
use access_common::Grid;
use geo::{Coord, Geometry, LineString, Polygon};

/// Rasterization options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterizeOptions {
    /// Burn every pixel touched by the geometry, not only those whose center is covered.
    pub all_touched: bool,
}

impl RasterizeOptions {
    pub fn all_touched() -> Self {
        Self { all_touched: true }
    }
}

/// Rasterize `(geometry, value)` pairs in iteration order onto a fresh
/// raster. Later shapes overwrite earlier ones where they overlap.
pub fn rasterize<'a, T, I>(shapes: I, grid: &Grid, fill: T, options: RasterizeOptions) -> Raster<T>
where
    T: Copy,
    I: IntoIterator<Item = (&'a Geometry<f64>, T)>,
{
    let mut raster = Raster::filled(grid, fill);
    for (geometry, value) in shapes {
        burn(&mut raster, geometry, value, options);
    }
    raster
}

/// Rasterize geometries into a boolean mask.
pub fn rasterize_mask<'a, I>(geometries: I, grid: &Grid, options: RasterizeOptions) -> Mask
where
    I: IntoIterator<Item = &'a Geometry<f64>>,
{
    rasterize(geometries.into_iter().map(|g| (g, true)), grid, false, options)
}

/// Burn one geometry onto an existing raster.
pub fn burn<T: Copy>(raster: &mut Raster<T>, geometry: &Geometry<f64>, value: T, options: RasterizeOptions) {
    let grid = raster.grid().clone();
    visit_geometry(geometry, &grid, options, &mut |row, col| raster.set(row, col, value));
}

fn visit_geometry(
    geometry: &Geometry<f64>,
    grid: &Grid,
    options: RasterizeOptions,
    visit: &mut dyn FnMut(usize, usize),
) {
    match geometry {
        Geometry::Point(p) => {
            if let Some((row, col)) = grid.pixel_at(p.x(), p.y()) {
                visit(row, col);
            }
        }
        Geometry::MultiPoint(mp) => {
            for p in mp.iter() {
                if let Some((row, col)) = grid.pixel_at(p.x(), p.y()) {
                    visit(row, col);
                }
            }
        }
        Geometry::Line(line) => {
            let a = to_pixel(grid, line.start);
            let b = to_pixel(grid, line.end);
            trace_segment(a, b, grid, visit);
        }
        Geometry::LineString(ls) => trace_line_string(ls, grid, visit),
        Geometry::MultiLineString(mls) => {
            for ls in mls.iter() {
                trace_line_string(ls, grid, visit);
            }
        }
        Geometry::Polygon(poly) => fill_polygon(poly, grid, options, visit),
        Geometry::MultiPolygon(mp) => {
            for poly in mp.iter() {
                fill_polygon(poly, grid, options, visit);
            }
        }
        Geometry::Rect(rect) => fill_polygon(&rect.to_polygon(), grid, options, visit),
        Geometry::Triangle(tri) => fill_polygon(&tri.to_polygon(), grid, options, visit),
        Geometry::GeometryCollection(gc) => {
            for g in gc.iter() {
                visit_geometry(g, grid, options, visit);
            }
        }
    }
}

/// World coordinate to fractional pixel coordinate `(col, row)`.
fn to_pixel(grid: &Grid, c: Coord<f64>) -> (f64, f64) {
    grid.transform().invert(c.x, c.y)
}

fn trace_line_string(ls: &LineString<f64>, grid: &Grid, visit: &mut dyn FnMut(usize, usize)) {
    let pixels: Vec<(f64, f64)> = ls.coords().map(|c| to_pixel(grid, *c)).collect();
    match pixels.as_slice() {
        [] => {}
        [single] => trace_segment(*single, *single, grid, visit),
        _ => {
            for pair in pixels.windows(2) {
                trace_segment(pair[0], pair[1], grid, visit);
            }
        }
    }
}

fn fill_polygon(
    poly: &Polygon<f64>,
    grid: &Grid,
    options: RasterizeOptions,
    visit: &mut dyn FnMut(usize, usize),
) {
    for (row, start, end) in polygon_spans(poly, grid) {
        for col in start..end {
            visit(row, col);
        }
    }
    if options.all_touched {
        trace_line_string(poly.exterior(), grid, visit);
        for interior in poly.interiors() {
            trace_line_string(interior, grid, visit);
        }
    }
}

/// Horizontal runs `(row, col_start, col_end)` of pixels whose centers lie
/// inside the polygon. `col_end` is exclusive. Rows outside the polygon's
/// extent are never scanned.
pub fn polygon_spans(poly: &Polygon<f64>, grid: &Grid) -> Vec<(usize, usize, usize)> {
    let rings: Vec<Vec<(f64, f64)>> = std::iter::once(poly.exterior())
        .chain(poly.interiors())
        .map(|ring| ring.coords().map(|c| to_pixel(grid, *c)).collect())
        .collect();

    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in rings.iter().flatten() {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if !(min_y.is_finite() && max_y.is_finite()) {
        return Vec::new();
    }

    let (rows, cols) = grid.shape();
    let first_row = (min_y - 0.5).ceil().max(0.0);
    let last_row = (max_y - 0.5).floor().min(rows as f64 - 1.0);
    if first_row > last_row {
        return Vec::new();
    }

    let mut spans = Vec::new();
    let mut crossings = Vec::new();
    for row in first_row as usize..=last_row as usize {
        let yc = row as f64 + 0.5;
        crossings.clear();
        for ring in &rings {
            for edge in ring.windows(2) {
                let ((x0, y0), (x1, y1)) = (edge[0], edge[1]);
                if (y0 <= yc) != (y1 <= yc) {
                    crossings.push(x0 + (yc - y0) * (x1 - x0) / (y1 - y0));
                }
            }
        }
        crossings.sort_by(|a, b| a.total_cmp(b));

        for pair in crossings.chunks_exact(2) {
            let start = (pair[0] - 0.5).ceil().clamp(0.0, cols as f64) as usize;
            let end = (pair[1] - 0.5).ceil().clamp(0.0, cols as f64) as usize;
            if start < end {
                spans.push((row, start, end));
            }
        }
    }
    spans
}

/// Visit every pixel crossed by the segment `a -> b` (pixel coordinates).
fn trace_segment(a: (f64, f64), b: (f64, f64), grid: &Grid, visit: &mut dyn FnMut(usize, usize)) {
    let (rows, cols) = grid.shape();
    let Some(((x0, y0), (x1, y1))) = clip_segment(a, b, cols as f64, rows as f64) else {
        return;
    };

    let mut visit_cell = |cx: i64, cy: i64| {
        if cx >= 0 && cy >= 0 && (cx as usize) < cols && (cy as usize) < rows {
            visit(cy as usize, cx as usize);
        }
    };

    let (mut cx, mut cy) = (x0.floor() as i64, y0.floor() as i64);
    let (ex, ey) = (x1.floor() as i64, y1.floor() as i64);
    let (dx, dy) = (x1 - x0, y1 - y0);

    let step_x = if dx > 0.0 { 1 } else { -1 };
    let step_y = if dy > 0.0 { 1 } else { -1 };
    let t_delta_x = if dx != 0.0 { 1.0 / dx.abs() } else { f64::INFINITY };
    let t_delta_y = if dy != 0.0 { 1.0 / dy.abs() } else { f64::INFINITY };
    let mut t_max_x = if dx > 0.0 {
        ((cx + 1) as f64 - x0) / dx
    } else if dx < 0.0 {
        (x0 - cx as f64) / -dx
    } else {
        f64::INFINITY
    };
    let mut t_max_y = if dy > 0.0 {
        ((cy + 1) as f64 - y0) / dy
    } else if dy < 0.0 {
        (y0 - cy as f64) / -dy
    } else {
        f64::INFINITY
    };

    visit_cell(cx, cy);
    let steps = (ex - cx).abs() + (ey - cy).abs();
    for _ in 0..steps {
        if t_max_x < t_max_y {
            cx += step_x;
            t_max_x += t_delta_x;
        } else {
            cy += step_y;
            t_max_y += t_delta_y;
        }
        visit_cell(cx, cy);
    }
}

/// Liang-Barsky clip of a segment against `[0, width] x [0, height]`.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    width: f64,
    height: f64,
) -> Option<((f64, f64), (f64, f64))> {
    if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for (p, q) in [
        (-dx, a.0),
        (dx, width - a.0),
        (-dy, a.1),
        (dy, height - a.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
    }

    Some((
        (a.0 + t0 * dx, a.1 + t0 * dy),
        (a.0 + t1 * dx, a.1 + t1 * dy),
    ))
}
