use anyhow::Result;
use geo::{BoundingRect, MultiPoint, Point};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::errors::TerrainError;
use crate::geo_core::BoundingBox;
use crate::io::{LoadedPoints, OutputFormat};

/// Summary of a point file
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSummary {
    pub feature_count: usize,
    pub crs: Option<String>,
    pub bounds: BoundingBox,
    pub elevation_min: f64,
    pub elevation_max: f64,
    pub elevation_mean: f64,
}

impl TerrainSummary {
    /// Count, bounds and elevation statistics; fails on an empty file
    pub fn from_points(loaded: &LoadedPoints) -> Result<Self> {
        if loaded.records.is_empty() {
            return Err(TerrainError::EmptyDataset("no features".to_string()).into());
        }

        let multi: MultiPoint<f64> = loaded
            .records
            .iter()
            .map(|r| Point::new(r.x, r.y))
            .collect();
        let rect = multi
            .bounding_rect()
            .ok_or_else(|| TerrainError::EmptyDataset("no geometry".to_string()))?;

        let mut elevation_min = f64::INFINITY;
        let mut elevation_max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for record in &loaded.records {
            elevation_min = elevation_min.min(record.elevation);
            elevation_max = elevation_max.max(record.elevation);
            sum += record.elevation;
        }

        Ok(TerrainSummary {
            feature_count: loaded.records.len(),
            crs: loaded.crs.clone(),
            bounds: BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y),
            elevation_min,
            elevation_max,
            elevation_mean: sum / loaded.records.len() as f64,
        })
    }
}

impl fmt::Display for TerrainSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Verification Report ===")?;
        writeln!(f, "Feature Count: {}", self.feature_count)?;
        writeln!(
            f,
            "CRS (Coordinate System): {}",
            self.crs.as_deref().unwrap_or("unknown")
        )?;
        writeln!(
            f,
            "Bounds (MinX, MinY, MaxX, MaxY): ({}, {}, {}, {})",
            self.bounds.min_x, self.bounds.min_y, self.bounds.max_x, self.bounds.max_y
        )?;
        writeln!(f, "Elevation Min: {:.2} m", self.elevation_min)?;
        writeln!(f, "Elevation Max: {:.2} m", self.elevation_max)?;
        writeln!(f, "Elevation Mean: {:.2} m", self.elevation_mean)?;
        write!(f, "===========================")
    }
}

/// Point file to inspect: `file` when given, otherwise the converter's output
/// location for `bbox`.
pub fn resolve_target(
    file: Option<&Path>,
    bbox: Option<&BoundingBox>,
    output_dir: &Path,
    format: OutputFormat,
) -> Option<PathBuf> {
    match (file, bbox) {
        (Some(file), _) => Some(file.to_path_buf()),
        (None, Some(bbox)) => Some(
            output_dir
                .join(bbox.folder_name())
                .join(format.file_name()),
        ),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::PointRecord;
    use approx::assert_relative_eq;

    fn record(x: f64, y: f64, elevation: f64) -> PointRecord {
        PointRecord {
            x,
            y,
            elevation,
            city: None,
        }
    }

    #[test]
    fn test_summary_statistics() {
        let loaded = LoadedPoints {
            crs: Some("EPSG:4326".to_string()),
            records: vec![
                record(-122.9, 37.1, 10.0),
                record(-122.1, 37.8, 40.0),
                record(-122.5, 37.4, -5.0),
            ],
        };

        let summary = TerrainSummary::from_points(&loaded).unwrap();
        assert_eq!(summary.feature_count, 3);
        assert_relative_eq!(summary.bounds.min_x, -122.9);
        assert_relative_eq!(summary.bounds.max_y, 37.8);
        assert_relative_eq!(summary.elevation_min, -5.0);
        assert_relative_eq!(summary.elevation_max, 40.0);
        assert_relative_eq!(summary.elevation_mean, 15.0);

        let report = summary.to_string();
        assert!(report.contains("Feature Count: 3"));
        assert!(report.contains("Elevation Mean: 15.00 m"));
    }

    #[test]
    fn test_summary_of_empty_dataset_fails() {
        let loaded = LoadedPoints {
            crs: None,
            records: vec![],
        };
        let err = TerrainSummary::from_points(&loaded).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TerrainError>(),
            Some(TerrainError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_resolve_target() {
        let out = Path::new("output");
        let bbox = BoundingBox::new(-122.5, 37.0, -122.0, 38.0);

        assert_eq!(
            resolve_target(None, Some(&bbox), out, OutputFormat::Csv),
            Some(PathBuf::from("output/N37W122.50_N38W122/terrain.csv"))
        );
        assert_eq!(
            resolve_target(Some(Path::new("x.geojson")), Some(&bbox), out, OutputFormat::Csv),
            Some(PathBuf::from("x.geojson"))
        );
        assert_eq!(resolve_target(None, None, out, OutputFormat::Csv), None);
    }
}
