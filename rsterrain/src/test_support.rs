//! Synthetic SRTM fixtures shared by the unit tests.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Side of a 3 arc-second tile, the smallest size GDAL's SRTMHGT driver accepts
pub const SRTM3_SIDE: usize = 1201;

/// Big-endian `.hgt` payload of `side x side` samples, row 0 being the north edge.
pub fn hgt_bytes(side: usize, value: impl Fn(usize, usize) -> i16) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(side * side * 2);
    for row in 0..side {
        for col in 0..side {
            bytes.extend_from_slice(&value(row, col).to_be_bytes());
        }
    }
    bytes
}

pub fn write_zip(path: &Path, members: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, data) in members {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// Write `<dir>/<tile>.SRTMGL3.hgt.zip` holding `<tile>.hgt`
pub fn write_tile_zip(
    dir: &Path,
    tile: &str,
    side: usize,
    value: impl Fn(usize, usize) -> i16,
) -> PathBuf {
    let bytes = hgt_bytes(side, value);
    let zip_path = dir.join(format!("{}.SRTMGL3.hgt.zip", tile));
    let member = format!("{}.hgt", tile);
    write_zip(&zip_path, &[(member.as_str(), &bytes[..])]);
    zip_path
}

/// Georeferencing written into a test GeoTIFF
pub enum Georef {
    /// ModelPixelScale and ModelTiepoint
    Tiepoint { scale: [f64; 3], tiepoint: [f64; 6] },
    /// 4x4 ModelTransformation matrix, row-major
    Matrix([f64; 16]),
}

/// Single-band Float32 GeoTIFF
pub fn write_geotiff(
    path: &Path,
    width: u32,
    height: u32,
    data: &[f32],
    georef: &Georef,
    nodata: Option<&str>,
) {
    let file = File::create(path).unwrap();
    let mut encoder = TiffEncoder::new(file).unwrap();
    let mut image = encoder
        .new_image::<colortype::Gray32Float>(width, height)
        .unwrap();

    match georef {
        Georef::Tiepoint { scale, tiepoint } => {
            image
                .encoder()
                .write_tag(Tag::ModelPixelScaleTag, &scale[..])
                .unwrap();
            image
                .encoder()
                .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
                .unwrap();
        }
        Georef::Matrix(matrix) => {
            image
                .encoder()
                .write_tag(Tag::ModelTransformationTag, &matrix[..])
                .unwrap();
        }
    }
    if let Some(nodata) = nodata {
        image.encoder().write_tag(Tag::GdalNodata, nodata).unwrap();
    }
    image.write_data(data).unwrap();
}

/// Zip a GeoTIFF tile as `<dir>/<tile>.SRTMGL1.tif.zip` holding `<tile>.tif`
pub fn write_geotiff_zip(
    dir: &Path,
    tile: &str,
    width: u32,
    height: u32,
    data: &[f32],
    georef: &Georef,
    nodata: Option<&str>,
) -> PathBuf {
    let member = format!("{}.tif", tile);
    let tif_path = dir.join(&member);
    write_geotiff(&tif_path, width, height, data, georef, nodata);
    let bytes = std::fs::read(&tif_path).unwrap();
    std::fs::remove_file(&tif_path).unwrap();

    let zip_path = dir.join(format!("{}.SRTMGL1.tif.zip", tile));
    write_zip(&zip_path, &[(member.as_str(), &bytes[..])]);
    zip_path
}
