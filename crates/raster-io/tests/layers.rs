//! Rasters moving between files, CRSs and geometries.

use access_common::{Affine, CrsCode, Grid};
use geo::{polygon, Geometry};
use raster_io::{
    read_geotiff, rasterize_mask, resample, write_geotiff, InterpolationMethod, Raster,
    RasterizeOptions, FRICTION_NODATA,
};

#[test]
fn test_utm_layer_onto_mercator_grid() {
    let utm = CrsCode::Utm {
        zone: 31,
        north: true,
    };
    let src_grid = Grid::new(Affine::from_origin(490_000.0, 20_000.0, 1000.0, 1000.0), 20, 20, utm)
        .unwrap();
    let dst_grid = Grid::new(
        Affine::from_origin(329_000.0, 15_000.0, 1000.0, 1000.0),
        10,
        10,
        CrsCode::Epsg3857,
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("slope.tif");
    write_geotiff(&path, &Raster::filled(&src_grid, 7.0), None).unwrap();

    let src = read_geotiff(&path).unwrap();
    assert_eq!(src.grid().crs(), utm);
    let out = resample(&src, &dst_grid, InterpolationMethod::Nearest);
    assert_eq!(out.grid(), &dst_grid);
    assert!(out.data().iter().all(|v| *v == 7.0));
}

#[test]
fn test_mask_persisted_as_category_layer() {
    let grid = Grid::new(Affine::from_origin(0.0, 400.0, 100.0, 100.0), 4, 4, CrsCode::Epsg3857)
        .unwrap();
    let square: Geometry<f64> = polygon![
        (x: 0.0, y: 200.0),
        (x: 200.0, y: 200.0),
        (x: 200.0, y: 400.0),
        (x: 0.0, y: 400.0),
    ]
    .into();
    let mask = rasterize_mask([&square], &grid, RasterizeOptions::default());
    assert_eq!(mask.count(), 4);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aoi.tif");
    write_geotiff(&path, &mask.map(u8::from), None).unwrap();
    let back = read_geotiff(&path).unwrap();
    assert_eq!(back.get(0, 0), Some(1.0));
    assert_eq!(back.get(3, 3), Some(0.0));
}

#[test]
fn test_friction_sentinel_reads_back_as_nan() {
    let grid = Grid::new(Affine::from_origin(0.0, 200.0, 100.0, 100.0), 2, 2, CrsCode::Epsg3857)
        .unwrap();
    let friction = Raster::new(grid, vec![0.9, f64::NAN, 0.72, 0.9]).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("friction.tif");
    write_geotiff(&path, &friction, Some(FRICTION_NODATA)).unwrap();

    let back = read_geotiff(&path).unwrap();
    assert!(back.get(0, 1).unwrap().is_nan());
    assert_eq!(back.valid_count(), 3);
    assert_eq!(back.min_max(), Some((0.72, 0.9)));
}

/// GeoTIFF laid out the way GDAL writes it: a ModelTransformation matrix,
/// an ASCII citation key and a NUL-terminated nodata string.
fn write_gdal_style_transform(path: &std::path::Path) {
    use tiff::encoder::{colortype, TiffEncoder};
    use tiff::tags::Tag;

    let file = std::fs::File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    let mut image = encoder.new_image::<colortype::Gray32Float>(3, 2).unwrap();
    let matrix = [
        250.0, 0.0, 0.0, 330_000.0,
        0.0, -250.0, 0.0, 1_620_000.0,
        0.0, 0.0, 0.0, 0.0,
        0.0, 0.0, 0.0, 1.0,
    ];
    image
        .encoder()
        .write_tag(Tag::ModelTransformationTag, &matrix[..])
        .unwrap();
    let keys: [u16; 20] = [
        1, 1, 0, 4,
        1024, 0, 1, 1,
        1025, 0, 1, 1,
        1026, 34737, 22, 0,
        3072, 0, 1, 32628,
    ];
    image.encoder().write_tag(Tag::GeoKeyDirectoryTag, &keys[..]).unwrap();
    image
        .encoder()
        .write_tag(Tag::GeoAsciiParamsTag, "WGS 84 / UTM zone 28N|")
        .unwrap();
    image.encoder().write_tag(Tag::GdalNodata, "-9999").unwrap();
    image
        .write_data(&[1.5f32, -9999.0, 3.0, 4.0, 5.0, 6.25][..])
        .unwrap();
}

#[test]
fn test_reads_gdal_style_transform() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("population.tif");
    write_gdal_style_transform(&path);

    let raster = read_geotiff(&path).unwrap();
    let expected = Grid::new(
        Affine::from_origin(330_000.0, 1_620_000.0, 250.0, 250.0),
        2,
        3,
        CrsCode::Utm {
            zone: 28,
            north: true,
        },
    )
    .unwrap();
    assert_eq!(raster.grid(), &expected);
    assert_eq!(raster.nodata(), Some(-9999.0));
    assert_eq!(raster.get(0, 0), Some(1.5));
    assert!(raster.get(0, 1).unwrap().is_nan());
    assert_eq!(raster.get(1, 2), Some(6.25));
}

#[test]
fn test_reads_tiepoint_away_from_origin() {
    use tiff::encoder::{colortype, TiffEncoder};
    use tiff::tags::Tag;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("elevation.tif");
    {
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        let mut image = encoder.new_image::<colortype::Gray16>(4, 3).unwrap();
        // Pixel (2, 1) is tied to (1060, 5970)
        image
            .encoder()
            .write_tag(Tag::ModelTiepointTag, &[2.0, 1.0, 0.0, 1060.0, 5970.0, 0.0][..])
            .unwrap();
        image
            .encoder()
            .write_tag(Tag::ModelPixelScaleTag, &[30.0, 30.0, 0.0][..])
            .unwrap();
        let keys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 3072, 0, 1, 3857];
        image.encoder().write_tag(Tag::GeoKeyDirectoryTag, &keys[..]).unwrap();
        let data: Vec<u16> = (0..12).map(|v| 100 + v).collect();
        image.write_data(&data[..]).unwrap();
    }

    let raster = read_geotiff(&path).unwrap();
    let t = raster.grid().transform();
    assert_eq!((t.c, t.f), (1000.0, 6000.0));
    assert_eq!((t.a, t.e), (30.0, -30.0));
    assert_eq!(raster.grid().crs(), CrsCode::Epsg3857);
    assert_eq!(raster.nodata(), None);
    assert_eq!(raster.get(2, 3), Some(111.0));
}
