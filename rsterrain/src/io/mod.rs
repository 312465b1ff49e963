//! Point file formats.
//!
//! Every format stores one feature per point with a `Point(lon, lat)`
//! geometry in EPSG:4326 and two attributes: `elevation` and `city` (the
//! region label).

pub mod csv_file;
pub mod geojson_file;
#[cfg(feature = "gdal")]
pub mod shapefile;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::errors::TerrainError;
use crate::geometric::points::TerrainPoints;

/// Attribute holding the elevation in meters
pub const ELEVATION_FIELD: &str = "elevation";
/// Attribute holding the region label
pub const REGION_FIELD: &str = "city";

/// Vector format of the point file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Shapefile,
    Geojson,
    Csv,
}

impl Default for OutputFormat {
    fn default() -> Self {
        if cfg!(feature = "gdal") {
            OutputFormat::Shapefile
        } else {
            OutputFormat::Geojson
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Shapefile => "ESRI Shapefile",
            OutputFormat::Geojson => "GeoJSON",
            OutputFormat::Csv => "CSV",
        };
        f.write_str(name)
    }
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Shapefile => "shp",
            OutputFormat::Geojson => "geojson",
            OutputFormat::Csv => "csv",
        }
    }

    /// `terrain.<ext>`
    pub fn file_name(&self) -> String {
        format!("terrain.{}", self.extension())
    }

    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "shp" => Some(OutputFormat::Shapefile),
            "geojson" | "json" => Some(OutputFormat::Geojson),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }
}

/// One point read back from a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub x: f64,
    pub y: f64,
    pub elevation: f64,
    pub city: Option<String>,
}

/// Contents of a point file
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPoints {
    pub crs: Option<String>,
    pub records: Vec<PointRecord>,
}

/// Write `points` to `path` in `format`
pub fn write_points(points: &TerrainPoints, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Geojson => geojson_file::write(points, path),
        OutputFormat::Csv => csv_file::write(points, path),
        #[cfg(feature = "gdal")]
        OutputFormat::Shapefile => shapefile::write(points, path),
        #[cfg(not(feature = "gdal"))]
        OutputFormat::Shapefile => Err(TerrainError::FormatUnavailable("Shapefile").into()),
    }
}

/// Read a point file, picking the reader from the extension
pub fn read_points(path: &Path) -> Result<LoadedPoints> {
    let format = OutputFormat::from_path(path)
        .ok_or_else(|| TerrainError::UnsupportedFormat(path.display().to_string()))?;

    match format {
        OutputFormat::Geojson => geojson_file::read(path),
        OutputFormat::Csv => csv_file::read(path),
        #[cfg(feature = "gdal")]
        OutputFormat::Shapefile => shapefile::read(path),
        #[cfg(not(feature = "gdal"))]
        OutputFormat::Shapefile => Err(TerrainError::FormatUnavailable("Shapefile").into()),
    }
}
