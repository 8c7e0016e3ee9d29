//! Road-type variants of route geometries

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{RoadType, RouteGeometry, RouteVariant};

/// Identifies a variant: which base geometry and which road-type assumption
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct VariantKey {
    pub base: usize,
    pub road_type: RoadType,
}

pub struct VariantGenerator {
    max_base_routes: usize,
}

impl Default for VariantGenerator {
    fn default() -> Self {
        Self::new(3)
    }
}

impl VariantGenerator {
    #[must_use]
    pub fn new(max_base_routes: usize) -> Self {
        Self {
            max_base_routes: max_base_routes.max(1),
        }
    }

    /// Label each distinct base geometry with the road types it is scored under
    ///
    /// Every base yields a highway and a local variant, plus an arterial one unless
    /// its summary already names a via-road.
    #[must_use]
    pub fn variants(&self, bases: &[RouteGeometry]) -> BTreeMap<VariantKey, RouteVariant> {
        let mut variants = BTreeMap::new();

        let distinct = dedup_geometries(bases);
        for (base, geometry) in distinct.into_iter().take(self.max_base_routes).enumerate() {
            let mut labels = vec![RoadType::Highway];
            if !names_via_road(&geometry.summary) {
                labels.push(RoadType::Arterial);
            }
            labels.push(RoadType::Local);

            for road_type in labels {
                variants.insert(
                    VariantKey { base, road_type },
                    RouteVariant {
                        name: variant_name(road_type, base, &geometry.summary),
                        road_type,
                        geometry: geometry.clone(),
                    },
                );
            }
        }

        variants
    }
}

/// Drop geometries describing the same physical path, keeping first occurrences
#[must_use]
pub fn dedup_geometries(geometries: &[RouteGeometry]) -> Vec<&RouteGeometry> {
    let mut distinct: Vec<&RouteGeometry> = Vec::new();
    for geometry in geometries {
        if !distinct.iter().any(|seen| same_path(seen, geometry)) {
            distinct.push(geometry);
        }
    }
    distinct
}

fn same_path(a: &RouteGeometry, b: &RouteGeometry) -> bool {
    if a.polyline.is_empty() && b.polyline.is_empty() {
        a.points == b.points
    } else {
        a.polyline == b.polyline
    }
}

fn names_via_road(summary: &str) -> bool {
    summary
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| word == "via")
}

fn variant_name(road_type: RoadType, base: usize, summary: &str) -> String {
    match (summary.trim(), base) {
        ("", 0) => road_type.route_title().to_string(),
        ("", base) => format!("{} {}", road_type.route_title(), base + 1),
        (summary, _) => format!("{} ({summary})", road_type.route_title()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinate, RoutePoint};

    fn geometry(summary: &str, polyline: &str) -> RouteGeometry {
        RouteGeometry {
            points: RoutePoint::sequence([
                Coordinate::new(44.98, -93.27),
                Coordinate::new(46.79, -92.10),
            ]),
            summary: summary.to_string(),
            distance_text: "155 mi".to_string(),
            duration_text: "2 hours 34 mins".to_string(),
            distance_meters: 249_448,
            duration_seconds: 9_240,
            bounds: None,
            polyline: polyline.to_string(),
        }
    }

    #[test]
    fn test_identical_polylines_yield_one_variant_set() {
        let generator = VariantGenerator::default();
        let once = generator.variants(&[geometry("I-35 N", "abc")]);
        let twice = generator.variants(&[geometry("I-35 N", "abc"), geometry("I-35 N", "abc")]);
        assert_eq!(once, twice);
        assert_eq!(twice.keys().filter(|k| k.base == 1).count(), 0);
    }

    #[test]
    fn test_labels_per_base() {
        let variants = VariantGenerator::default().variants(&[geometry("I-35 N", "abc")]);
        let labels: Vec<RoadType> = variants.keys().map(|k| k.road_type).collect();
        assert_eq!(labels, vec![RoadType::Highway, RoadType::Arterial, RoadType::Local]);
        assert_eq!(
            variants[&VariantKey { base: 0, road_type: RoadType::Highway }].name,
            "Highway Route (I-35 N)"
        );
    }

    #[test]
    fn test_via_road_summary_skips_arterial() {
        let variants = VariantGenerator::default().variants(&[geometry("US-61 via MN-23", "abc")]);
        assert!(!variants.keys().any(|k| k.road_type == RoadType::Arterial));
        assert!(variants.keys().any(|k| k.road_type == RoadType::Highway));
        assert!(variants.keys().any(|k| k.road_type == RoadType::Local));
        assert!(!names_via_road("Viaduct Ave"));
    }

    #[test]
    fn test_base_routes_are_capped() {
        let bases: Vec<RouteGeometry> =
            (0..5).map(|i| geometry("I-94", &format!("p{i}"))).collect();
        let variants = VariantGenerator::new(3).variants(&bases);
        assert_eq!(variants.keys().map(|k| k.base).max(), Some(2));
        assert_eq!(variants.len(), 9);
    }

    #[test]
    fn test_unnamed_routes_are_numbered() {
        let variants =
            VariantGenerator::default().variants(&[geometry("", "a"), geometry("", "b")]);
        let local = |base| VariantKey {
            base,
            road_type: RoadType::Local,
        };
        assert_eq!(variants[&local(0)].name, "Local Roads");
        assert_eq!(variants[&local(1)].name, "Local Roads 2");
    }

    #[test]
    fn test_empty_input() {
        assert!(VariantGenerator::default().variants(&[]).is_empty());
    }
}
