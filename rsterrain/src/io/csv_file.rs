use anyhow::{Context, Result};
use csv::{ReaderBuilder, Writer};
use std::path::Path;

use super::{LoadedPoints, PointRecord, ELEVATION_FIELD};
use crate::errors::TerrainError;
use crate::geometric::points::TerrainPoints;
use crate::CRS_WGS84;

/// Write `x,y,elevation,city` rows
pub fn write(points: &TerrainPoints, path: &Path) -> Result<()> {
    let mut writer =
        Writer::from_path(path).context(format!("Failed to create CSV file: {:?}", path))?;

    for p in &points.points {
        writer
            .serialize(PointRecord {
                x: p.point.x(),
                y: p.point.y(),
                elevation: p.elevation as f64,
                city: Some(points.region.clone()),
            })
            .context("Failed to write CSV record")?;
    }

    writer
        .flush()
        .context(format!("Failed to write CSV file: {:?}", path))?;
    Ok(())
}

/// Read `x,y,elevation[,city]` rows; the `elevation` column is required
pub fn read(path: &Path) -> Result<LoadedPoints> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .context(format!("Failed to open CSV file: {:?}", path))?;

    let headers = reader.headers().context("Failed to read CSV headers")?;
    if !headers.iter().any(|h| h == ELEVATION_FIELD) {
        return Err(TerrainError::MissingElevation(path.display().to_string()).into());
    }

    let records = reader
        .deserialize::<PointRecord>()
        .collect::<Result<Vec<_>, _>>()
        .context(format!("Failed to parse CSV records: {:?}", path))?;

    Ok(LoadedPoints {
        // Plain lon/lat columns
        crs: Some(CRS_WGS84.to_string()),
        records,
    })
}
