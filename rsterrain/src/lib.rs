pub mod collect;
pub mod commons;
pub mod errors;
pub mod geo_core;
pub mod geometric;
pub mod io;

pub use errors::TerrainError;
pub use geo_core::{BoundingBox, GeoTransform};
pub use geometric::terrain::{ConverterConfig, Terrain, TerrainOutcome};
pub use io::OutputFormat;

// SRTM void marker, never written as a point
pub const NODATA_SENTINEL: f32 = -32768.0;

/// CRS carried by every file this crate writes
pub const CRS_WGS84: &str = "EPSG:4326";

#[cfg(test)]
pub(crate) mod test_support;
