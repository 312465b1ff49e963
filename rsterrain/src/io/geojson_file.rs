use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{LoadedPoints, PointRecord, ELEVATION_FIELD, REGION_FIELD};
use crate::errors::TerrainError;
use crate::geometric::points::TerrainPoints;
use crate::CRS_WGS84;

// Name GDAL uses for lon/lat WGS84 in GeoJSON `crs` members
const CRS84_URN: &str = "urn:ogc:def:crs:OGC:1.3:CRS84";

fn crs_member() -> JsonObject {
    let mut crs = JsonObject::new();
    crs.insert("type".to_string(), "name".into());
    crs.insert(
        "properties".to_string(),
        serde_json::json!({ "name": CRS84_URN }),
    );

    let mut members = JsonObject::new();
    members.insert("crs".to_string(), serde_json::Value::Object(crs));
    members
}

/// Write a FeatureCollection of points tagged with the CRS84 `crs` member
pub fn write(points: &TerrainPoints, path: &Path) -> Result<()> {
    let features = points
        .points
        .iter()
        .map(|p| {
            let mut feature = Feature::from(Geometry::new(Value::Point(vec![
                p.point.x(),
                p.point.y(),
            ])));
            feature.set_property(ELEVATION_FIELD, p.elevation as f64);
            feature.set_property(REGION_FIELD, points.region.clone());
            feature
        })
        .collect();

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(crs_member()),
    };

    let file = File::create(path).context(format!("Failed to create GeoJSON file: {:?}", path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &collection)
        .context(format!("Failed to serialize GeoJSON: {:?}", path))?;
    writer
        .flush()
        .context(format!("Failed to write GeoJSON file: {:?}", path))?;

    Ok(())
}

fn crs_from_members(members: Option<&JsonObject>) -> String {
    let name = members
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(|n| n.as_str());

    match name {
        Some(CRS84_URN) | None => CRS_WGS84.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Read point features back; a file without `crs` member is taken as EPSG:4326
pub fn read(path: &Path) -> Result<LoadedPoints> {
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read GeoJSON file: {:?}", path))?;
    let geojson: GeoJson = content
        .parse()
        .context(format!("Failed to parse GeoJSON: {:?}", path))?;

    let (features, crs) = match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = crs_from_members(fc.foreign_members.as_ref());
            (fc.features, crs)
        }
        GeoJson::Feature(f) => (vec![f], CRS_WGS84.to_string()),
        GeoJson::Geometry(_) => (vec![], CRS_WGS84.to_string()),
    };

    let mut records = Vec::with_capacity(features.len());
    for feature in &features {
        let (x, y) = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(coords)) if coords.len() >= 2 => (coords[0], coords[1]),
            _ => continue,
        };

        let elevation = feature
            .property(ELEVATION_FIELD)
            .and_then(|v| v.as_f64())
            .ok_or_else(|| TerrainError::MissingElevation(path.display().to_string()))?;
        let city = feature
            .property(REGION_FIELD)
            .and_then(|v| v.as_str())
            .map(str::to_string);

        records.push(PointRecord {
            x,
            y,
            elevation,
            city,
        });
    }

    Ok(LoadedPoints {
        crs: Some(crs),
        records,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometric::points::TerrainPoint;
    use geo::Point;
    use tempfile::TempDir;

    fn sample_points() -> TerrainPoints {
        TerrainPoints {
            region: "N37W123".to_string(),
            points: vec![
                TerrainPoint {
                    point: Point::new(-122.9, 37.1),
                    elevation: 12.0,
                },
                TerrainPoint {
                    point: Point::new(-122.8, 37.2),
                    elevation: -3.0,
                },
            ],
        }
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("terrain.geojson");
        write(&sample_points(), &path).unwrap();

        let loaded = read(&path).unwrap();
        assert_eq!(loaded.crs.as_deref(), Some("EPSG:4326"));
        assert_eq!(loaded.records.len(), 2);
        assert_eq!(
            loaded.records[1],
            PointRecord {
                x: -122.8,
                y: 37.2,
                elevation: -3.0,
                city: Some("N37W123".to_string()),
            }
        );
    }

    #[test]
    fn test_read_without_elevation_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("terrain.geojson");
        std::fs::write(
            &path,
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Point","coordinates":[1.0,2.0]},
                 "properties":{"height":4}}]}"#,
        )
        .unwrap();

        let err = read(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TerrainError>(),
            Some(TerrainError::MissingElevation(_))
        ));
    }
}
