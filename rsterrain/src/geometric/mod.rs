pub mod clip;
pub mod mosaic;
pub mod points;
pub mod raster;
pub mod terrain;
