//! Route point sampling
//!
//! Reduces a dense polyline to points spaced roughly `interval` meters apart.
//! The point count governs weather-query cost, so callers pick the interval:
//! fine spacing for short historical corridors, coarse spacing otherwise.

use crate::geo;
use crate::models::RoutePoint;

/// Downsample `points` to approximately `interval_m` spacing
///
/// The first point is always kept. A point is emitted once the distance travelled
/// since the last emission reaches `interval_m`. The last point is appended unless
/// a point with the same coordinate was already emitted.
#[must_use]
pub fn sample(points: &[RoutePoint], interval_m: f64) -> Vec<RoutePoint> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };

    let mut sampled = vec![*first];
    let mut total_distance = 0.0;
    let mut last_sampled_distance = 0.0;

    for pair in points.windows(2) {
        total_distance += geo::distance(&pair[0].coordinate, &pair[1].coordinate);

        if total_distance - last_sampled_distance >= interval_m {
            sampled.push(pair[1]);
            last_sampled_distance = total_distance;
        }
    }

    if !sampled.iter().any(|p| p.coordinate == last.coordinate) {
        sampled.push(*last);
    }

    sampled
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Coordinate;
    use proptest::prelude::*;

    const METERS_PER_DEGREE_LAT: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

    /// Points every `step_m` meters due north from (40, -90)
    fn meridian(total_m: f64, step_m: f64) -> Vec<RoutePoint> {
        let count = (total_m / step_m).round() as usize;
        RoutePoint::sequence((0..=count).map(|i| {
            Coordinate::new(40.0 + (i as f64 * step_m) / METERS_PER_DEGREE_LAT, -90.0)
        }))
    }

    #[test]
    fn test_empty_input() {
        assert!(sample(&[], 50_000.0).is_empty());
    }

    #[test]
    fn test_single_point() {
        let points = RoutePoint::sequence([Coordinate::new(45.0, -93.0)]);
        assert_eq!(sample(&points, 50_000.0), points);
    }

    #[test]
    fn test_two_hundred_km_at_fifty_km_yields_five_points() {
        let points = meridian(200_000.0, 1_000.0);
        let sampled = sample(&points, 50_000.0);

        assert_eq!(sampled.len(), 5);
        assert_eq!(sampled.first(), points.first());
        assert_eq!(sampled.last(), points.last());
        let last_count = sampled
            .iter()
            .filter(|p| p.index == points.len() - 1)
            .count();
        assert_eq!(last_count, 1);
    }

    #[test]
    fn test_short_route_keeps_endpoints_only() {
        let points = meridian(10_000.0, 1_000.0);
        let sampled = sample(&points, 50_000.0);
        assert_eq!(sampled.len(), 2);
        assert_eq!(sampled[0].index, 0);
        assert_eq!(sampled[1].index, points.len() - 1);
    }

    #[test]
    fn test_finer_interval_yields_more_points() {
        let points = meridian(200_000.0, 1_000.0);
        assert!(sample(&points, 25_000.0).len() > sample(&points, 50_000.0).len());
    }

    #[test]
    fn test_order_preserved() {
        let points = meridian(300_000.0, 5_000.0);
        let sampled = sample(&points, 40_000.0);
        assert!(sampled.windows(2).all(|w| w[0].index < w[1].index));
    }

    proptest! {
        #[test]
        fn endpoints_included_exactly_once(
            coords in prop::collection::vec((-80.0f64..80.0, -179.0f64..179.0), 1..40),
            interval in 1_000.0f64..500_000.0,
        ) {
            let points = RoutePoint::sequence(
                coords.into_iter().map(|(lat, lon)| Coordinate::new(lat, lon)),
            );
            let sampled = sample(&points, interval);
            let last_index = points.len() - 1;

            prop_assert_eq!(sampled.first(), points.first());
            prop_assert_eq!(sampled.iter().filter(|p| p.index == 0).count(), 1);
            prop_assert_eq!(
                sampled.iter().filter(|p| p.coordinate == points[last_index].coordinate).count(),
                1
            );
            prop_assert!(sampled.windows(2).all(|w| w[0].index < w[1].index));
        }
    }
}
