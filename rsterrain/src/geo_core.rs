use geo::{coord, Intersects, Rect};
use serde::{Deserialize, Serialize};

use crate::errors::TerrainError;

/// Bounding box in geographic coordinates (EPSG:4326)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64, // min longitude
    pub min_y: f64, // min latitude
    pub max_x: f64, // max longitude
    pub max_y: f64, // max latitude
}

/// Which hemisphere letters a coordinate value is written with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Lat,
    Lon,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        BoundingBox {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Build a bounding box, rejecting inverted or non-finite edges
    pub fn validated(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Result<Self, TerrainError> {
        let bbox = BoundingBox::new(min_x, min_y, max_x, max_y);
        bbox.validate()?;
        Ok(bbox)
    }

    pub fn validate(&self) -> Result<(), TerrainError> {
        let finite = [self.min_x, self.min_y, self.max_x, self.max_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.min_x > self.max_x || self.min_y > self.max_y {
            return Err(TerrainError::InvalidBoundingBox {
                min_x: self.min_x,
                min_y: self.min_y,
                max_x: self.max_x,
                max_y: self.max_y,
            });
        }
        Ok(())
    }

    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.min_x, y: self.min_y },
            coord! { x: self.max_x, y: self.max_y },
        )
    }

    /// Point-in-box test, edges included
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.to_rect().intersects(&coord! { x: x, y: y })
    }

    /// Integer 1x1 degree cells touched by the box, as `(lat, lon)` of their
    /// south-west corner, latitude-major.
    pub fn tile_cells(&self) -> Vec<(i32, i32)> {
        let lat_range = (self.min_y.floor() as i32)..=(self.max_y.floor() as i32);
        let lon_range = (self.min_x.floor() as i32)..=(self.max_x.floor() as i32);

        lat_range
            .flat_map(|lat| lon_range.clone().map(move |lon| (lat, lon)))
            .collect()
    }

    /// Label attached to every generated point, e.g. `N37W122.50`
    pub fn region_label(&self) -> String {
        format!(
            "{}{}",
            format_coord(self.min_y, Axis::Lat),
            format_coord(self.min_x, Axis::Lon)
        )
    }

    /// Output folder name, e.g. `N37W122.50_N38W122`
    pub fn folder_name(&self) -> String {
        format!(
            "{}_{}{}",
            self.region_label(),
            format_coord(self.max_y, Axis::Lat),
            format_coord(self.max_x, Axis::Lon)
        )
    }
}

/// Format a coordinate with its hemisphere letter.
///
/// Whole values drop their decimals (`N37`), anything else keeps exactly two
/// (`W122.50`). Zero counts as north/east.
pub fn format_coord(value: f64, axis: Axis) -> String {
    let direction = match (axis, value >= 0.0) {
        (Axis::Lat, true) => 'N',
        (Axis::Lat, false) => 'S',
        (Axis::Lon, true) => 'E',
        (Axis::Lon, false) => 'W',
    };

    let abs_val = value.abs();
    if abs_val.fract() == 0.0 {
        format!("{}{}", direction, abs_val as i64)
    } else {
        format!("{}{:.2}", direction, abs_val)
    }
}

/// Affine pixel-to-geographic transform in GDAL order:
/// `[x0, pixel_width, row_rotation, y0, col_rotation, pixel_height]`.
///
/// Rasters handled here are north-up, so `pixel_height` is negative and the
/// rotation terms are zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    pub fn north_up(x0: f64, y0: f64, pixel_width: f64, pixel_height: f64) -> Self {
        GeoTransform([x0, pixel_width, 0.0, y0, 0.0, -pixel_height.abs()])
    }

    /// Finite origin, positive pixel width, negative pixel height, no rotation
    pub fn is_north_up(&self) -> bool {
        let t = &self.0;
        t.iter().all(|v| v.is_finite()) && t[1] > 0.0 && t[5] < 0.0 && t[2] == 0.0 && t[4] == 0.0
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    /// Absolute pixel size `(width, height)` in degrees
    pub fn pixel_size(&self) -> (f64, f64) {
        (self.0[1].abs(), self.0[5].abs())
    }

    /// Geographic coordinate of a pixel center
    pub fn pixel_center(&self, row: usize, col: usize) -> (f64, f64) {
        let c = col as f64 + 0.5;
        let r = row as f64 + 0.5;
        let t = &self.0;
        (t[0] + c * t[1] + r * t[2], t[3] + c * t[4] + r * t[5])
    }

    /// Fractional `(col, row)` of a geographic coordinate
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let t = &self.0;
        ((x - t[0]) / t[1], (y - t[3]) / t[5])
    }

    /// Transform of a window starting at `(row_off, col_off)`
    pub fn shifted(&self, row_off: usize, col_off: usize) -> Self {
        let mut t = self.0;
        t[0] += col_off as f64 * self.0[1] + row_off as f64 * self.0[2];
        t[3] += col_off as f64 * self.0[4] + row_off as f64 * self.0[5];
        GeoTransform(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounding_box() {
        let bbox: BoundingBox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(bbox.min_x, 0.0);
        assert_eq!(bbox.max_x, 1.0);
        assert!(bbox.contains(1.0, 0.0));
        assert!(!bbox.contains(1.01, 0.5));
    }

    #[test]
    fn test_validated_rejects_inverted_box() {
        let err = BoundingBox::validated(-122.0, 38.0, -123.0, 37.0).unwrap_err();
        assert!(matches!(err, TerrainError::InvalidBoundingBox { .. }));
        assert!(BoundingBox::validated(f64::NAN, 0.0, 1.0, 1.0).is_err());
        assert!(BoundingBox::validated(-123.0, 37.0, -122.0, 38.0).is_ok());
    }

    #[test]
    fn test_tile_cells_cover_negative_ranges() {
        let bbox = BoundingBox::new(-123.5, 37.2, -122.1, 38.0);
        assert_eq!(
            bbox.tile_cells(),
            vec![(37, -124), (37, -123), (38, -124), (38, -123)]
        );

        let south = BoundingBox::new(10.5, -0.5, 10.7, -0.1);
        assert_eq!(south.tile_cells(), vec![(-1, 10)]);
    }

    #[test]
    fn test_format_coord() {
        assert_eq!(format_coord(37.0, Axis::Lat), "N37");
        assert_eq!(format_coord(-33.5, Axis::Lat), "S33.50");
        assert_eq!(format_coord(-122.25, Axis::Lon), "W122.25");
        assert_eq!(format_coord(0.0, Axis::Lon), "E0");
        assert_eq!(format_coord(151.123, Axis::Lon), "E151.12");
    }

    #[test]
    fn test_folder_name_and_region() {
        let bbox = BoundingBox::new(-122.5, 37.0, -122.0, 38.0);
        assert_eq!(bbox.region_label(), "N37W122.50");
        assert_eq!(bbox.folder_name(), "N37W122.50_N38W122");
    }

    #[test]
    fn test_is_north_up() {
        assert!(GeoTransform::north_up(-123.0, 38.0, 0.25, 0.5).is_north_up());
        assert!(!GeoTransform([-123.0, 0.0, 0.0, 38.0, 0.0, -0.5]).is_north_up());
        assert!(!GeoTransform([-123.0, f64::INFINITY, 0.0, 38.0, 0.0, -0.5]).is_north_up());
        assert!(!GeoTransform([-123.0, 0.25, 0.1, 38.0, 0.0, -0.5]).is_north_up());
        assert!(!GeoTransform([-123.0, 0.25, 0.0, 37.0, 0.0, 0.5]).is_north_up());
    }

    #[test]
    fn test_geo_transform_roundtrip() {
        let gt = GeoTransform::north_up(-123.05, 38.05, 0.1, 0.1);
        let (x, y) = gt.pixel_center(0, 0);
        assert_relative_eq!(x, -123.0, epsilon = 1e-9);
        assert_relative_eq!(y, 38.0, epsilon = 1e-9);

        let (col, row) = gt.to_pixel(-122.5, 37.5);
        assert_relative_eq!(col, 5.5, epsilon = 1e-9);
        assert_relative_eq!(row, 5.5, epsilon = 1e-9);

        let shifted = gt.shifted(2, 3);
        assert_relative_eq!(shifted.origin().0, -122.75, epsilon = 1e-9);
        assert_relative_eq!(shifted.origin().1, 37.85, epsilon = 1e-9);
    }
}
