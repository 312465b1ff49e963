use thiserror::Error;

/// Errors raised by the terrain conversion pipeline.
///
/// Most public functions return `anyhow::Result`; these variants are the
/// ones a caller may want to match on after `downcast_ref`.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// Bounding box with inverted or non-finite edges.
    #[error("Invalid bounding box ({min_x}, {min_y}, {max_x}, {max_y})")]
    InvalidBoundingBox {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    /// A file name that does not carry an SRTM tile name like `N37W123`.
    #[error("Cannot parse SRTM tile name from: {0}")]
    TileNameParse(String),

    /// Raster extension we have no reader for.
    #[error("Unsupported raster file: {0}")]
    UnsupportedRaster(String),

    /// Raster whose layout does not match its format.
    #[error("Invalid raster {path}: {reason}")]
    InvalidRaster { path: String, reason: String },

    /// GeoTIFF without pixel scale/tiepoint or transformation tags.
    #[error("Missing georeferencing tags in: {0}")]
    MissingGeoreference(String),

    /// Merge called without any raster.
    #[error("Cannot build a mosaic from zero rasters")]
    EmptyMosaic,

    /// Clip window does not overlap the raster.
    #[error("Bounding box ({min_x}, {min_y}, {max_x}, {max_y}) does not overlap the raster")]
    BoundingBoxOutsideRaster {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    /// Point file extension we have no reader for.
    #[error("Unsupported point file: {0}")]
    UnsupportedFormat(String),

    /// Vector file without any point.
    #[error("Dataset is empty: {0}")]
    EmptyDataset(String),

    /// Vector file lacking the `elevation` attribute.
    #[error("'elevation' column missing in: {0}")]
    MissingElevation(String),

    /// Output format compiled out of this build.
    #[error("{0} support requires the `gdal` feature")]
    FormatUnavailable(&'static str),
}
