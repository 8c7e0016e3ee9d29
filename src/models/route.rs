//! Route geometry and road-type variants

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{BoundingBox, RoutePoint};

/// One path from origin to destination as returned by the routing provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RouteGeometry {
    pub points: Vec<RoutePoint>,
    /// Provider summary, usually the main road names
    pub summary: String,
    pub distance_text: String,
    pub duration_text: String,
    pub distance_meters: u64,
    pub duration_seconds: u64,
    pub bounds: Option<BoundingBox>,
    /// Encoded overview polyline, identifies the physical path
    pub polyline: String,
}

/// Road-type label, ordered from best to least maintained
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RoadType {
    Highway,
    Arterial,
    Local,
    Scenic,
}

impl RoadType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RoadType::Highway => "highway",
            RoadType::Arterial => "arterial",
            RoadType::Local => "local",
            RoadType::Scenic => "scenic",
        }
    }

    /// Next better-maintained road type
    #[must_use]
    pub fn better_maintained(self) -> Self {
        match self {
            RoadType::Highway | RoadType::Arterial => RoadType::Highway,
            RoadType::Local => RoadType::Arterial,
            RoadType::Scenic => RoadType::Local,
        }
    }

    /// Short label used in variant names
    #[must_use]
    pub fn route_title(&self) -> &'static str {
        match self {
            RoadType::Highway => "Highway Route",
            RoadType::Arterial => "Arterial Route",
            RoadType::Local => "Local Roads",
            RoadType::Scenic => "Scenic Route",
        }
    }
}

impl fmt::Display for RoadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoadType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "highway" => Ok(RoadType::Highway),
            "arterial" => Ok(RoadType::Arterial),
            "local" => Ok(RoadType::Local),
            "scenic" => Ok(RoadType::Scenic),
            other => Err(format!("unknown road type '{other}'")),
        }
    }
}

/// A route geometry tagged with the road-type assumption used for scoring
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RouteVariant {
    pub name: String,
    pub road_type: RoadType,
    pub geometry: RouteGeometry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_road_type_round_trip_through_str() {
        for road_type in [
            RoadType::Highway,
            RoadType::Arterial,
            RoadType::Local,
            RoadType::Scenic,
        ] {
            assert_eq!(road_type.as_str().parse::<RoadType>().unwrap(), road_type);
        }
        assert!("gravel".parse::<RoadType>().is_err());
    }

    #[test]
    fn test_better_maintained() {
        assert_eq!(RoadType::Scenic.better_maintained(), RoadType::Local);
        assert_eq!(RoadType::Local.better_maintained(), RoadType::Arterial);
        assert_eq!(RoadType::Arterial.better_maintained(), RoadType::Highway);
        assert_eq!(RoadType::Highway.better_maintained(), RoadType::Highway);
    }
}
