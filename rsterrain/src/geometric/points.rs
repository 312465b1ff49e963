use geo::Point;
use tracing::warn;

use super::raster::Raster;
use crate::geo_core::GeoTransform;

/// Above this many points the output gets slow to write and to open
pub const LARGE_POINT_COUNT: usize = 1_000_000;

/// A valid raster cell, indexed in the full-resolution grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub row: usize,
    pub col: usize,
    /// Raw raster value in meters
    pub elevation: f32,
}

/// Valid cells of `raster`, keeping every `step`-th row and column.
///
/// A `step` of 0 behaves like 1.
pub fn sample(raster: &Raster, step: usize) -> Vec<Sample> {
    let step = step.max(1);
    let mut samples = Vec::new();

    for row in (0..raster.height).step_by(step) {
        for col in (0..raster.width).step_by(step) {
            let elevation = raster.get(row, col);
            if !raster.is_nodata(elevation) {
                samples.push(Sample {
                    row,
                    col,
                    elevation,
                });
            }
        }
    }

    samples
}

#[derive(Debug, Clone, PartialEq)]
pub struct TerrainPoint {
    /// Pixel center, `(lon, lat)` in EPSG:4326
    pub point: Point<f64>,
    pub elevation: f32,
}

/// Elevation points sharing one region label
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainPoints {
    /// Label written in the `city` attribute of every point
    pub region: String,
    pub points: Vec<TerrainPoint>,
}

impl TerrainPoints {
    /// Place every sample at its pixel center
    pub fn from_samples(samples: &[Sample], transform: &GeoTransform, region: &str) -> Self {
        if samples.len() > LARGE_POINT_COUNT {
            warn!(
                "Generating {} points (> {}). This may be slow.",
                samples.len(),
                LARGE_POINT_COUNT
            );
        }

        let points = samples
            .iter()
            .map(|s| {
                let (x, y) = transform.pixel_center(s.row, s.col);
                TerrainPoint {
                    point: Point::new(x, y),
                    elevation: s.elevation,
                }
            })
            .collect();

        TerrainPoints {
            region: region.to_string(),
            points,
        }
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NODATA_SENTINEL;
    use approx::assert_relative_eq;

    fn raster() -> Raster {
        // 5x4 grid, value = row * 10 + col, one void at (2, 2)
        let mut data: Vec<f32> = (0..20).map(|i| ((i / 5) * 10 + i % 5) as f32).collect();
        data[2 * 5 + 2] = NODATA_SENTINEL;
        let gt = GeoTransform::north_up(10.0, 50.0, 0.5, 0.25);
        Raster::new(data, 5, 4, gt, Some(NODATA_SENTINEL))
    }

    #[test]
    fn test_sample_drops_nodata() {
        let samples = sample(&raster(), 1);
        assert_eq!(samples.len(), 19);
        assert!(!samples.iter().any(|s| s.row == 2 && s.col == 2));
        assert_eq!(
            samples[7],
            Sample {
                row: 1,
                col: 2,
                elevation: 12.0
            }
        );
    }

    #[test]
    fn test_sample_stride_keeps_full_resolution_indices() {
        let samples = sample(&raster(), 2);
        let cells: Vec<(usize, usize)> = samples.iter().map(|s| (s.row, s.col)).collect();
        // (2, 2) is void
        assert_eq!(cells, vec![(0, 0), (0, 2), (0, 4), (2, 0), (2, 4)]);
        assert_eq!(samples[4].elevation, 24.0);

        assert_eq!(sample(&raster(), 0).len(), sample(&raster(), 1).len());
    }

    #[test]
    fn test_points_at_pixel_centers() {
        let r = raster();
        let samples = sample(&r, 2);
        let points = TerrainPoints::from_samples(&samples, &r.transform, "N49.50E10");

        assert_eq!(points.len(), 5);
        assert_eq!(points.region, "N49.50E10");
        let last = &points.points[4];
        assert_relative_eq!(last.point.x(), 10.0 + 4.5 * 0.5);
        assert_relative_eq!(last.point.y(), 50.0 - 2.5 * 0.25);
        assert_eq!(last.elevation, 24.0);
    }
}
