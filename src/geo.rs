//! Great-circle distance between coordinates

use haversine::{Location as HaversineLocation, Units, distance as haversine_distance};

use crate::models::Coordinate;

/// Distance in meters using the haversine formula (spherical Earth, R = 6371 km)
#[must_use]
pub fn distance(from: &Coordinate, to: &Coordinate) -> f64 {
    let from_haversine = HaversineLocation {
        latitude: from.latitude,
        longitude: from.longitude,
    };
    let to_haversine = HaversineLocation {
        latitude: to.latitude,
        longitude: to.longitude,
    };
    haversine_distance(from_haversine, to_haversine, Units::Kilometers) * 1000.0
}

/// Whether `point` lies within `radius_m` meters of any of `targets`
#[must_use]
pub fn within_radius(point: &Coordinate, targets: &[Coordinate], radius_m: f64) -> bool {
    targets.iter().any(|t| distance(point, t) <= radius_m)
}

/// The candidate closest to `point`, `None` when there are no candidates
pub fn nearest<'a, T>(
    point: &Coordinate,
    candidates: &'a [T],
    location: impl Fn(&T) -> Coordinate,
) -> Option<&'a T> {
    candidates
        .iter()
        .map(|c| (c, distance(point, &location(c))))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(c, _)| c)
}
