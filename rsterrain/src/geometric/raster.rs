use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

use crate::errors::TerrainError;
use crate::geo_core::{BoundingBox, GeoTransform};
use crate::NODATA_SENTINEL;

/// Single-band elevation raster, row-major from the north-west corner
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    /// `width * height` samples
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub transform: GeoTransform,
    /// Void marker declared by the source, checked alongside -32768
    pub nodata: Option<f32>,
}

impl Raster {
    /// Wrap row-major `data`; its length must be `width * height`
    pub fn new(
        data: Vec<f32>,
        width: usize,
        height: usize,
        transform: GeoTransform,
        nodata: Option<f32>,
    ) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Raster {
            data,
            width,
            height,
            transform,
            nodata,
        }
    }

    /// Raster filled with its nodata value
    pub fn filled(width: usize, height: usize, transform: GeoTransform, nodata: f32) -> Self {
        Raster::new(vec![nodata; width * height], width, height, transform, Some(nodata))
    }

    /// Open an `.hgt` or GeoTIFF elevation file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("hgt") => read_hgt(path),
            Some("tif") | Some("tiff") => read_geotiff(path),
            _ => Err(TerrainError::UnsupportedRaster(path.display().to_string()).into()),
        }
    }

    /// Value at `(row, col)`; panics outside the grid
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.width + col]
    }

    /// Overwrite the value at `(row, col)`
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.width + col] = value;
    }

    /// True for the SRTM void sentinel and for this raster's own nodata value
    pub fn is_nodata(&self, value: f32) -> bool {
        if value == NODATA_SENTINEL {
            return true;
        }
        match self.nodata {
            Some(nd) if nd.is_nan() => value.is_nan(),
            Some(nd) => value == nd,
            None => false,
        }
    }

    /// Outer edges of the raster (pixel corners, not centers)
    pub fn bounds(&self) -> BoundingBox {
        let (x0, y0) = self.transform.origin();
        let t = &self.transform.0;
        let x1 = x0 + self.width as f64 * t[1];
        let y1 = y0 + self.height as f64 * t[5];
        BoundingBox::new(x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }
}

/// South-west corner `(lat, lon)` encoded in a file name such as
/// `N37W123.hgt` or `n37w123.SRTMGL1.hgt`.
pub fn parse_tile_origin(file_name: &str) -> Result<(i32, i32), TerrainError> {
    let bytes = file_name.as_bytes();
    for window in bytes.windows(7) {
        let ns = window[0].to_ascii_uppercase();
        let ew = window[3].to_ascii_uppercase();
        let digits = |range: std::ops::Range<usize>| window[range].iter().all(u8::is_ascii_digit);

        if matches!(ns, b'N' | b'S') && matches!(ew, b'E' | b'W') && digits(1..3) && digits(4..7) {
            // Slices are ASCII digits, so both parses succeed
            let lat: i32 = std::str::from_utf8(&window[1..3])
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| TerrainError::TileNameParse(file_name.to_string()))?;
            let lon: i32 = std::str::from_utf8(&window[4..7])
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| TerrainError::TileNameParse(file_name.to_string()))?;

            let lat = if ns == b'S' { -lat } else { lat };
            let lon = if ew == b'W' { -lon } else { lon };
            return Ok((lat, lon));
        }
    }
    Err(TerrainError::TileNameParse(file_name.to_string()))
}

/// Read a raw SRTM `.hgt` tile.
///
/// The file is a square grid of big-endian i16 covering one degree, with the
/// outer rows/columns sitting exactly on the integer degree lines. Georeferencing
/// therefore starts half a pixel outside the tile corner.
pub fn read_hgt(path: &Path) -> Result<Raster> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| TerrainError::TileNameParse(path.display().to_string()))?;
    let (lat, lon) = parse_tile_origin(file_name)?;

    let bytes = std::fs::read(path).context(format!("Failed to read HGT file: {:?}", path))?;
    let samples = bytes.len() / 2;
    let side = (samples as f64).sqrt().round() as usize;

    if bytes.len() % 2 != 0 || side < 2 || side * side != samples {
        return Err(TerrainError::InvalidRaster {
            path: path.display().to_string(),
            reason: format!("{} bytes is not a square grid of 16-bit samples", bytes.len()),
        }
        .into());
    }

    let data: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|b| i16::from_be_bytes([b[0], b[1]]) as f32)
        .collect();

    let pixel = 1.0 / (side - 1) as f64;
    let transform = GeoTransform::north_up(
        lon as f64 - pixel / 2.0,
        lat as f64 + 1.0 + pixel / 2.0,
        pixel,
        pixel,
    );

    Ok(Raster::new(data, side, side, transform, Some(NODATA_SENTINEL)))
}

/// Read a single-band GeoTIFF
pub fn read_geotiff(path: &Path) -> Result<Raster> {
    let file = File::open(path).context(format!("Failed to open GeoTIFF: {:?}", path))?;
    let mut decoder = Decoder::new(BufReader::new(file))
        .context(format!("Failed to decode TIFF header: {:?}", path))?
        .with_limits(Limits::unlimited());

    let (width, height) = decoder
        .dimensions()
        .context(format!("Failed to read TIFF dimensions: {:?}", path))?;
    let (width, height) = (width as usize, height as usize);

    let transform = read_geotransform(&mut decoder)
        .ok_or_else(|| TerrainError::MissingGeoreference(path.display().to_string()))?;
    ensure_north_up(&transform, path)?;
    let nodata = read_nodata_value(&mut decoder).unwrap_or(NODATA_SENTINEL);

    let image = decoder
        .read_image()
        .context(format!("Failed to decode TIFF image data: {:?}", path))?;
    let data: Vec<f32> = match image {
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U8(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
    };

    if data.len() != width * height {
        return Err(TerrainError::InvalidRaster {
            path: path.display().to_string(),
            reason: format!(
                "expected {} samples for {}x{}, got {} (multi-band rasters are not supported)",
                width * height,
                width,
                height,
                data.len()
            ),
        }
        .into());
    }

    Ok(Raster::new(data, width, height, transform, Some(nodata)))
}

/// Reject anything but a north-up transform with a positive pixel size
fn ensure_north_up(transform: &GeoTransform, path: &Path) -> Result<(), TerrainError> {
    if transform.is_north_up() {
        return Ok(());
    }
    Err(TerrainError::InvalidRaster {
        path: path.display().to_string(),
        reason: format!(
            "geotransform {:?} is not north-up with a positive pixel size",
            transform.0
        ),
    })
}

/// Open a tile with GDAL (SRTMHGT, GTiff or any other raster driver) and
/// check that its georeferencing is north-up.
#[cfg(feature = "gdal")]
pub fn open_dataset(path: &Path) -> Result<gdal::Dataset> {
    let dataset =
        gdal::Dataset::open(path).context(format!("Failed to open raster with GDAL: {:?}", path))?;
    let transform = dataset
        .geo_transform()
        .map(GeoTransform)
        .map_err(|_| TerrainError::MissingGeoreference(path.display().to_string()))?;
    ensure_north_up(&transform, path)?;
    Ok(dataset)
}

fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag);
    let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag);

    if let (Ok(tiepoint), Ok(scale)) = (tiepoint, scale) {
        if tiepoint.len() >= 6 && scale.len() >= 2 {
            // [i, j, k, x, y, z]: raster (i, j) sits at model (x, y)
            let (i, j, x, y) = (tiepoint[0], tiepoint[1], tiepoint[3], tiepoint[4]);
            let (sx, sy) = (scale[0], scale[1]);
            return Some(GeoTransform([x - i * sx, sx, 0.0, y + j * sy, 0.0, -sy]));
        }
    }

    let matrix = decoder
        .get_tag_f64_vec(Tag::ModelTransformationTag)
        .ok()?;
    if matrix.len() >= 8 {
        return Some(GeoTransform([
            matrix[3], matrix[0], matrix[1], matrix[7], matrix[4], matrix[5],
        ]));
    }
    None
}

fn read_nodata_value<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f32> {
    decoder
        .get_tag_ascii_string(Tag::GdalNodata)
        .ok()
        .and_then(|s| s.trim_matches(|c: char| c.is_whitespace() || c == '\0').parse().ok())
}
