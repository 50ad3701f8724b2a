//! Single-band GeoTIFF reading and writing.
//!
//! Geo-referencing uses the ModelPixelScale/ModelTiepoint pair (or a
//! ModelTransformation matrix on read), a minimal GeoKey directory carrying
//! the EPSG code, and GDAL's ASCII nodata tag.

use crate::config::RasterConfig;
use crate::error::{RasterError, Result};
use crate::types::Raster;
use access_common::{Affine, CrsCode, Grid};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tracing::debug;

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

/// Pixel types that can be written to a GeoTIFF.
pub trait SampleType: Copy {
    type Color: ColorType<Inner = Self>;

    /// Replace an undefined value with the nodata sentinel.
    fn replace_nan(self, nodata: f64) -> Self;
}

impl SampleType for f64 {
    type Color = colortype::Gray64Float;

    fn replace_nan(self, nodata: f64) -> Self {
        if self.is_nan() {
            nodata
        } else {
            self
        }
    }
}

impl SampleType for f32 {
    type Color = colortype::Gray32Float;

    fn replace_nan(self, nodata: f64) -> Self {
        if self.is_nan() {
            nodata as f32
        } else {
            self
        }
    }
}

impl SampleType for u8 {
    type Color = colortype::Gray8;

    fn replace_nan(self, _nodata: f64) -> Self {
        self
    }
}

/// Write `raster` to `path`. With a nodata sentinel, `NaN` pixels are
/// replaced by it and the GDAL nodata tag is set.
pub fn write_geotiff<T>(path: &Path, raster: &Raster<T>, nodata: Option<f64>) -> Result<()>
where
    T: SampleType,
    [T]: TiffValue,
{
    let grid = raster.grid();
    let t = grid.transform();
    let mut writer = BufWriter::new(File::create(path)?);
    {
        let mut encoder = TiffEncoder::new(&mut writer)?;
        let mut image = encoder.new_image::<T::Color>(grid.width() as u32, grid.height() as u32)?;

        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &[t.a, -t.e, 0.0][..])?;
        image.encoder().write_tag(
            Tag::ModelTiepointTag,
            &[0.0, 0.0, 0.0, t.c, t.f, 0.0][..],
        )?;
        image
            .encoder()
            .write_tag(Tag::GeoKeyDirectoryTag, &geo_keys(grid.crs())[..])?;

        let data: Vec<T> = match nodata {
            Some(nd) => {
                image
                    .encoder()
                    .write_tag(Tag::GdalNodata, format_nodata(nd).as_str())?;
                raster.data().iter().map(|v| v.replace_nan(nd)).collect()
            }
            None => raster.data().to_vec(),
        };
        image.write_data(&data)?;
    }
    writer.flush()?;

    debug!(
        path = %path.display(),
        width = grid.width(),
        height = grid.height(),
        crs = %grid.crs(),
        "Wrote GeoTIFF"
    );
    Ok(())
}

/// Read a single-band GeoTIFF with default limits.
pub fn read_geotiff(path: &Path) -> Result<Raster<f64>> {
    read_geotiff_with(path, &RasterConfig::default())
}

/// Read a single-band GeoTIFF as `f64`, mapping nodata pixels to `NaN`.
pub fn read_geotiff_with(path: &Path, config: &RasterConfig) -> Result<Raster<f64>> {
    if !path.is_file() {
        return Err(RasterError::NotFound(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))?;

    let mut limits = Limits::default();
    limits.decoding_buffer_size = config.decoding_limit_bytes();
    limits.intermediate_buffer_size = config.decoding_limit_bytes();
    decoder = decoder.with_limits(limits);

    match decoder.colortype()? {
        tiff::ColorType::Gray(_) => {}
        other => {
            return Err(RasterError::invalid_geotiff(
                path,
                format!("expected a single band, found {:?}", other),
            ))
        }
    }

    let (width, height) = decoder.dimensions()?;
    let transform = read_transform(&mut decoder, path)?;
    let crs = read_crs(&mut decoder, path)?;
    let nodata = decoder
        .get_tag_ascii_string(Tag::GdalNodata)
        .ok()
        .and_then(|s| s.trim_matches(|c: char| c == '\0' || c.is_whitespace()).parse::<f64>().ok());

    let mut data = decode_samples(decoder.read_image()?);
    if let Some(nd) = nodata {
        for v in data.iter_mut().filter(|v| **v == nd) {
            *v = f64::NAN;
        }
    }

    let grid = Grid::new(transform, height as usize, width as usize, crs)?;
    debug!(path = %path.display(), width, height, crs = %crs, "Read GeoTIFF");
    Ok(Raster::new(grid, data)?.with_nodata(nodata))
}

fn geo_keys(crs: CrsCode) -> Vec<u16> {
    let (model_type, crs_key) = if crs.is_geographic() {
        (2, GEOGRAPHIC_TYPE)
    } else {
        (1, PROJECTED_CS_TYPE)
    };
    vec![
        1, 1, 0, 3,
        GT_MODEL_TYPE, 0, 1, model_type,
        GT_RASTER_TYPE, 0, 1, 1,
        crs_key, 0, 1, crs.epsg() as u16,
    ]
}

fn format_nodata(nodata: f64) -> String {
    if nodata.fract() == 0.0 && nodata.abs() < 1e15 {
        format!("{}", nodata as i64)
    } else {
        format!("{}", nodata)
    }
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>, path: &Path) -> Result<Affine> {
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::ModelTransformationTag) {
        if m.len() >= 16 {
            return Ok(Affine::new(m[0], m[1], m[3], m[4], m[5], m[7]));
        }
    }

    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag);
    let pixel_scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag);
    match (tiepoint, pixel_scale) {
        (Ok(tp), Ok(scale)) if tp.len() >= 6 && scale.len() >= 2 => {
            // Tiepoint format: [i, j, k, x, y, z] maps pixel (i, j) to world (x, y)
            let (sx, sy) = (scale[0], scale[1]);
            Ok(Affine::new(
                sx,
                0.0,
                tp[3] - tp[0] * sx,
                0.0,
                -sy,
                tp[4] + tp[1] * sy,
            ))
        }
        _ => Err(RasterError::invalid_geotiff(
            path,
            "missing ModelPixelScale/ModelTiepoint tags",
        )),
    }
}

fn read_crs<R: Read + Seek>(decoder: &mut Decoder<R>, path: &Path) -> Result<CrsCode> {
    let keys = decoder
        .get_tag_u16_vec(Tag::GeoKeyDirectoryTag)
        .map_err(|_| RasterError::invalid_geotiff(path, "missing GeoKeyDirectory tag"))?;

    // Header is [version, revision, minor, count], then 4 values per key
    let entries = keys.get(4..).unwrap_or(&[]);
    for key in entries.chunks_exact(4) {
        let (id, location, value) = (key[0], key[1], key[3]);
        if location == 0 && (id == PROJECTED_CS_TYPE || id == GEOGRAPHIC_TYPE) {
            return CrsCode::from_epsg(value as u32).ok_or_else(|| {
                RasterError::invalid_geotiff(path, format!("unsupported EPSG code {}", value))
            });
        }
    }
    Err(RasterError::invalid_geotiff(path, "no EPSG code in GeoKeyDirectory"))
}

fn decode_samples(result: DecodingResult) -> Vec<f64> {
    match result {
        DecodingResult::F32(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::F64(data) => data,
        DecodingResult::I16(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::U16(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::U8(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I8(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
    }
}
