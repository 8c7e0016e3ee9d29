//! Coordinate model and route point primitives

use serde::{Deserialize, Serialize};

/// Geographic coordinate in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude in decimal degrees
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Format coordinate as a string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Generate cache key for a current observation at this coordinate
    #[must_use]
    pub fn cache_key(&self, hour: &str) -> String {
        let (lat, lon) = self.rounded_coordinates(2);
        format!("current:{lat:.2}:{lon:.2}:{hour}")
    }
}

/// A coordinate with its position along a route
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct RoutePoint {
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Sequence index within the route, defines direction of travel
    pub index: usize,
}

impl RoutePoint {
    #[must_use]
    pub const fn new(coordinate: Coordinate, index: usize) -> Self {
        Self { coordinate, index }
    }

    /// Build an indexed point sequence from raw coordinates
    #[must_use]
    pub fn sequence(coordinates: impl IntoIterator<Item = Coordinate>) -> Vec<Self> {
        coordinates
            .into_iter()
            .enumerate()
            .map(|(index, coordinate)| Self::new(coordinate, index))
            .collect()
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub northeast: Coordinate,
    pub southwest: Coordinate,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(southwest: Coordinate, northeast: Coordinate) -> Self {
        Self {
            northeast,
            southwest,
        }
    }

    /// Smallest box containing every coordinate, `None` when empty
    #[must_use]
    pub fn enclosing<'a>(coordinates: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        let mut iter = coordinates.into_iter();
        let first = iter.next()?;
        let (mut south, mut west, mut north, mut east) =
            (first.latitude, first.longitude, first.latitude, first.longitude);
        for c in iter {
            south = south.min(c.latitude);
            north = north.max(c.latitude);
            west = west.min(c.longitude);
            east = east.max(c.longitude);
        }
        Some(Self::new(
            Coordinate::new(south, west),
            Coordinate::new(north, east),
        ))
    }

    #[must_use]
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        (self.southwest.latitude..=self.northeast.latitude).contains(&coordinate.latitude)
            && (self.southwest.longitude..=self.northeast.longitude)
                .contains(&coordinate.longitude)
    }

    /// Evenly spaced `size` x `size` grid spanning the box, row by row from the south-west
    #[must_use]
    pub fn grid(&self, size: usize) -> Vec<Coordinate> {
        if size <= 1 {
            return vec![Coordinate::new(
                (self.southwest.latitude + self.northeast.latitude) / 2.0,
                (self.southwest.longitude + self.northeast.longitude) / 2.0,
            )];
        }
        let lat_step = (self.northeast.latitude - self.southwest.latitude) / (size - 1) as f64;
        let lon_step = (self.northeast.longitude - self.southwest.longitude) / (size - 1) as f64;
        (0..size)
            .flat_map(|row| {
                (0..size).map(move |col| {
                    Coordinate::new(
                        self.southwest.latitude + lat_step * row as f64,
                        self.southwest.longitude + lon_step * col as f64,
                    )
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_cache_key() {
        let location = Coordinate::new(44.977_8, -93.265_0);
        let key = location.cache_key("2024-01-15T08");
        assert_eq!(key, "current:44.98:-93.27:2024-01-15T08");
    }

    #[test]
    fn test_coordinate_rounded_coordinates() {
        let location = Coordinate::new(46.818_234, 8.227_456);
        let (lat, lon) = location.rounded_coordinates(2);
        assert_eq!(lat, 46.82);
        assert_eq!(lon, 8.23);
    }

    #[test]
    fn test_route_point_sequence_is_indexed() {
        let points = RoutePoint::sequence([
            Coordinate::new(1.0, 1.0),
            Coordinate::new(2.0, 2.0),
            Coordinate::new(3.0, 3.0),
        ]);
        let indices: Vec<usize> = points.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_bounding_box_grid() {
        let bbox = BoundingBox::new(Coordinate::new(44.0, -94.0), Coordinate::new(46.0, -92.0));
        let grid = bbox.grid(3);
        assert_eq!(grid.len(), 9);
        assert_eq!(grid[0], Coordinate::new(44.0, -94.0));
        assert_eq!(grid[4], Coordinate::new(45.0, -93.0));
        assert_eq!(grid[8], Coordinate::new(46.0, -92.0));
        assert!(grid.iter().all(|c| bbox.contains(c)));

        assert_eq!(bbox.grid(1), vec![Coordinate::new(45.0, -93.0)]);
    }

    #[test]
    fn test_enclosing_box() {
        let coords = [
            Coordinate::new(44.97, -93.26),
            Coordinate::new(46.78, -92.10),
            Coordinate::new(45.50, -92.90),
        ];
        let bbox = BoundingBox::enclosing(coords.iter()).unwrap();
        assert_eq!(bbox.southwest, Coordinate::new(44.97, -93.26));
        assert_eq!(bbox.northeast, Coordinate::new(46.78, -92.10));
        assert!(BoundingBox::enclosing(std::iter::empty()).is_none());
    }
}
