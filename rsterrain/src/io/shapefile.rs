//! ESRI Shapefile through GDAL/OGR.

use anyhow::{Context, Result};
use gdal::spatial_ref::SpatialRef;
use gdal::vector::{
    FieldValue, Geometry, LayerAccess, LayerOptions, OGRFieldType, OGRwkbGeometryType,
};
use gdal::{Dataset, DriverManager};
use std::path::Path;

use super::{LoadedPoints, PointRecord, ELEVATION_FIELD, REGION_FIELD};
use crate::errors::TerrainError;
use crate::geometric::points::TerrainPoints;

/// Remove every sidecar of an existing shapefile so the driver can recreate it
fn remove_existing(path: &Path) -> Result<()> {
    for ext in &["shp", "shx", "dbf", "prj", "cpg"] {
        let file_path = path.with_extension(ext);
        if file_path.exists() {
            std::fs::remove_file(&file_path)
                .context(format!("Failed to remove existing file: {:?}", file_path))?;
        }
    }
    Ok(())
}

/// Write a point layer with EPSG:4326 `.prj`, replacing any existing shapefile
pub fn write(points: &TerrainPoints, path: &Path) -> Result<()> {
    remove_existing(path)?;

    let driver = DriverManager::get_driver_by_name("ESRI Shapefile")
        .context("Failed to get ESRI Shapefile driver")?;
    let mut dataset = driver
        .create_vector_only(path)
        .context(format!("Failed to create shapefile: {:?}", path))?;

    let srs = SpatialRef::from_epsg(4326).context("Failed to create spatial reference")?;
    let layer_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("terrain");

    let mut layer = dataset
        .create_layer(LayerOptions {
            name: layer_name,
            srs: Some(&srs),
            ty: OGRwkbGeometryType::wkbPoint,
            ..Default::default()
        })
        .context("Failed to create point layer")?;

    layer
        .create_defn_fields(&[
            (ELEVATION_FIELD, OGRFieldType::OFTReal),
            (REGION_FIELD, OGRFieldType::OFTString),
        ])
        .context("Failed to create attribute fields")?;

    for p in &points.points {
        let geometry = Geometry::from_wkt(&format!("POINT ({} {})", p.point.x(), p.point.y()))
            .context("Failed to build point geometry")?;
        layer
            .create_feature_fields(
                geometry,
                &[ELEVATION_FIELD, REGION_FIELD],
                &[
                    FieldValue::RealValue(p.elevation as f64),
                    FieldValue::StringValue(points.region.clone()),
                ],
            )
            .context("Failed to write point feature")?;
    }

    Ok(())
}

/// Read the first layer's point features
pub fn read(path: &Path) -> Result<LoadedPoints> {
    let dataset = Dataset::open(path).context(format!("Failed to open shapefile: {:?}", path))?;
    let mut layer = dataset
        .layer(0)
        .context("Failed to access the first layer")?;

    let crs = layer
        .spatial_ref()
        .context("Layer has no spatial reference")
        .ok()
        .and_then(|srs| {
            let name = srs.auth_name().ok()?;
            let code = srs.auth_code().ok()?;
            Some(format!("{}:{}", name, code))
        });

    let mut records = Vec::new();
    for feature in layer.features() {
        let (x, y, _) = match feature.geometry() {
            Some(geometry) => geometry.get_point(0),
            None => continue,
        };

        let elevation = feature
            .field_as_double_by_name(ELEVATION_FIELD)
            .ok()
            .flatten()
            .ok_or_else(|| TerrainError::MissingElevation(path.display().to_string()))?;
        let city = feature
            .field_as_string_by_name(REGION_FIELD)
            .ok()
            .flatten();

        records.push(PointRecord {
            x,
            y,
            elevation,
            city,
        });
    }

    Ok(LoadedPoints { crs, records })
}
