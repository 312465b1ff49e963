use anyhow::Result;
use tracing::debug;

use super::raster::Raster;
use crate::errors::TerrainError;
use crate::geo_core::GeoTransform;
use crate::NODATA_SENTINEL;

/// Merge tiles into an in-memory GDAL VRT.
///
/// `datasets` are in priority order: where tiles overlap, the first one with
/// valid data wins. The VRT spans the union of the tiles at the first tile's
/// resolution and reads as the first tile's nodata value where no tile has data.
#[cfg(feature = "gdal")]
pub fn build_vrt(mut datasets: Vec<gdal::Dataset>) -> Result<gdal::Dataset> {
    use anyhow::Context;
    use gdal::programs::raster::{build_vrt as gdal_build_vrt, BuildVRTOptions};
    use std::path::Path;

    let first = datasets.first().ok_or(TerrainError::EmptyMosaic)?;
    let transform = GeoTransform(
        first
            .geo_transform()
            .context("Failed to read the first tile's geotransform")?,
    );
    let (res_x, res_y) = transform.pixel_size();
    let nodata = first
        .rasterband(1)
        .context("Failed to access band 1 of the first tile")?
        .no_data_value()
        .unwrap_or(NODATA_SENTINEL as f64);

    let options = BuildVRTOptions::new(vec![
        "-tr".to_string(),
        res_x.to_string(),
        res_y.to_string(),
        "-vrtnodata".to_string(),
        nodata.to_string(),
    ])
    .context("Failed to build VRT options")?;

    // Later VRT sources are drawn over earlier ones
    datasets.reverse();
    let vrt = gdal_build_vrt(None::<&Path>, &datasets, Some(options))
        .context("Failed to build VRT mosaic")?;

    let (width, height) = vrt.raster_size();
    debug!(
        "VRT mosaic of {} tiles: {}x{} pixels",
        datasets.len(),
        width,
        height
    );
    Ok(vrt)
}

/// Merge rasters into a single north-up mosaic.
///
/// The mosaic spans the union of the inputs at the first raster's
/// resolution. Each output pixel takes its value from the first input (in
/// slice order) holding valid data under the pixel center, so overlapping
/// tile edges keep the earlier tile's samples.
pub fn merge(rasters: &[Raster]) -> Result<Raster> {
    let first = rasters.first().ok_or(TerrainError::EmptyMosaic)?;
    let (res_x, res_y) = first.transform.pixel_size();

    let mut west = f64::INFINITY;
    let mut south = f64::INFINITY;
    let mut east = f64::NEG_INFINITY;
    let mut north = f64::NEG_INFINITY;
    for raster in rasters {
        let b = raster.bounds();
        west = west.min(b.min_x);
        south = south.min(b.min_y);
        east = east.max(b.max_x);
        north = north.max(b.max_y);
    }

    let width = ((east - west) / res_x).round() as usize;
    let height = ((north - south) / res_y).round() as usize;
    let nodata = first.nodata.unwrap_or(NODATA_SENTINEL);
    let transform = GeoTransform::north_up(west, north, res_x, res_y);

    debug!(
        "Mosaic of {} rasters: {}x{} pixels, bounds ({}, {}, {}, {})",
        rasters.len(),
        width,
        height,
        west,
        south,
        east,
        north
    );

    let mut mosaic = Raster::filled(width, height, transform, nodata);

    for src in rasters {
        let b = src.bounds();
        let col_start = ((b.min_x - west) / res_x).floor().max(0.0) as usize;
        let col_stop = (((b.max_x - west) / res_x).ceil() as usize).min(width);
        let row_start = ((north - b.max_y) / res_y).floor().max(0.0) as usize;
        let row_stop = (((north - b.min_y) / res_y).ceil() as usize).min(height);

        for row in row_start..row_stop {
            for col in col_start..col_stop {
                if !mosaic.is_nodata(mosaic.get(row, col)) {
                    continue;
                }

                let (x, y) = mosaic.transform.pixel_center(row, col);
                let (src_col, src_row) = src.transform.to_pixel(x, y);
                if src_col < 0.0 || src_row < 0.0 {
                    continue;
                }
                let (src_col, src_row) = (src_col.floor() as usize, src_row.floor() as usize);
                if src_col >= src.width || src_row >= src.height {
                    continue;
                }

                let value = src.get(src_row, src_col);
                if !src.is_nodata(value) {
                    mosaic.set(row, col, value);
                }
            }
        }
    }

    Ok(mosaic)
}
