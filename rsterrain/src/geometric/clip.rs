use anyhow::Result;

use super::raster::Raster;
use crate::errors::TerrainError;
use crate::geo_core::{BoundingBox, GeoTransform};
use crate::NODATA_SENTINEL;

/// Pixel window of a raster, in source row/column units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelWindow {
    pub row: usize,
    pub col: usize,
    pub width: usize,
    pub height: usize,
}

/// Window of a `width x height` grid covering `bbox`.
///
/// The window is taken in fractional pixel space with the start floored and
/// the stop ceiled, then intersected with the grid extent.
pub fn pixel_window(
    transform: &GeoTransform,
    width: usize,
    height: usize,
    bbox: &BoundingBox,
) -> Result<PixelWindow, TerrainError> {
    let (c0, r0) = transform.to_pixel(bbox.min_x, bbox.max_y);
    let (c1, r1) = transform.to_pixel(bbox.max_x, bbox.min_y);

    let col_start = c0.min(c1).floor().max(0.0);
    let col_stop = c0.max(c1).ceil().min(width as f64);
    let row_start = r0.min(r1).floor().max(0.0);
    let row_stop = r0.max(r1).ceil().min(height as f64);

    if col_stop <= col_start || row_stop <= row_start {
        return Err(TerrainError::BoundingBoxOutsideRaster {
            min_x: bbox.min_x,
            min_y: bbox.min_y,
            max_x: bbox.max_x,
            max_y: bbox.max_y,
        });
    }

    Ok(PixelWindow {
        row: row_start as usize,
        col: col_start as usize,
        width: (col_stop - col_start) as usize,
        height: (row_stop - row_start) as usize,
    })
}

/// Set every pixel whose center falls outside `bbox` to nodata. Centers on
/// the box edge are kept.
pub fn mask_outside(raster: &mut Raster, bbox: &BoundingBox) {
    let nodata = raster.nodata.unwrap_or(NODATA_SENTINEL);
    for row in 0..raster.height {
        for col in 0..raster.width {
            let (x, y) = raster.transform.pixel_center(row, col);
            if !bbox.contains(x, y) {
                raster.set(row, col, nodata);
            }
        }
    }
}

/// Crop `raster` to the pixel window covering `bbox` and blank out every
/// pixel whose center falls outside the box.
pub fn clip_to_bbox(raster: &Raster, bbox: &BoundingBox) -> Result<Raster> {
    let window = pixel_window(&raster.transform, raster.width, raster.height, bbox)?;

    let mut data = Vec::with_capacity(window.width * window.height);
    for row in window.row..window.row + window.height {
        let start = row * raster.width + window.col;
        data.extend_from_slice(&raster.data[start..start + window.width]);
    }

    let mut clipped = Raster::new(
        data,
        window.width,
        window.height,
        raster.transform.shifted(window.row, window.col),
        Some(raster.nodata.unwrap_or(NODATA_SENTINEL)),
    );
    mask_outside(&mut clipped, bbox);
    Ok(clipped)
}

/// Read the window of band 1 covering `bbox` through GDAL, then blank out
/// pixels whose center falls outside the box.
#[cfg(feature = "gdal")]
pub fn clip_dataset(dataset: &gdal::Dataset, bbox: &BoundingBox) -> Result<Raster> {
    use anyhow::Context;

    let transform = GeoTransform(
        dataset
            .geo_transform()
            .context("Failed to read mosaic geotransform")?,
    );
    let (width, height) = dataset.raster_size();
    let window = pixel_window(&transform, width, height, bbox)?;

    let band = dataset
        .rasterband(1)
        .context("Failed to access mosaic band 1")?;
    let nodata = band
        .no_data_value()
        .map(|v| v as f32)
        .unwrap_or(NODATA_SENTINEL);
    let buffer = band
        .read_as::<f32>(
            (window.col as isize, window.row as isize),
            (window.width, window.height),
            (window.width, window.height),
            None,
        )
        .context("Failed to read mosaic window")?;

    let mut clipped = Raster::new(
        buffer.data().to_vec(),
        window.width,
        window.height,
        transform.shifted(window.row, window.col),
        Some(nodata),
    );
    mask_outside(&mut clipped, bbox);
    Ok(clipped)
}
