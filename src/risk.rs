//! Ice risk model
//!
//! Heuristic additive scoring: each physical factor contributes an independent
//! term and the sum is clamped to `[0, 1]`. The constants are tuning values, kept
//! together in [`RiskPolicy`] so they can be recalibrated without touching the
//! aggregation code. The score is only meant to order routes, not to predict ice.

use serde::Serialize;

use crate::geo;
use crate::models::{Coordinate, RiskLevel, RoadType, WeatherObservation};

/// Known bridges and overpasses on winter corridors
pub const KNOWN_BRIDGES: &[Coordinate] = &[
    // I-35W Saint Anthony Falls Bridge, Minneapolis
    Coordinate::new(44.9787, -93.2450),
    // Blatnik Bridge, Duluth / Superior
    Coordinate::new(46.7494, -92.1000),
    // Bong Bridge, Duluth / Superior
    Coordinate::new(46.7267, -92.1558),
    // Peace Bridge, Buffalo
    Coordinate::new(42.9068, -78.9046),
    // Grand Island bridges, I-190
    Coordinate::new(43.0478, -78.9714),
    // Ambassador Bridge, Detroit
    Coordinate::new(42.3118, -83.0738),
    // Zilwaukee Bridge, I-75
    Coordinate::new(43.4767, -83.9295),
    // Mackinac Bridge
    Coordinate::new(45.8174, -84.7278),
    // George Washington Bridge
    Coordinate::new(40.8517, -73.9527),
    // Mario Cuomo Bridge, Tarrytown
    Coordinate::new(41.0706, -73.8869),
    // Hennepin Avenue Bridge, Minneapolis
    Coordinate::new(44.9845, -93.2636),
];

/// Additive constants of the ice risk heuristic
#[derive(Debug, Clone, Serialize)]
pub struct RiskPolicy {
    pub version: &'static str,

    /// Glaze-ice band around freezing, inclusive bounds in °C
    pub freezing_band: (f64, f64),
    pub freezing_band_risk: f64,
    /// Cold side adjacent band, lower bound inclusive
    pub cold_band_low: f64,
    /// Warm side adjacent band, upper bound inclusive
    pub warm_band_high: f64,
    pub adjacent_band_risk: f64,
    /// Below this temperature snow dominates over glaze ice
    pub extreme_cold_below: f64,
    pub extreme_cold_risk: f64,

    pub humidity_threshold: f64,
    pub humidity_base_risk: f64,
    pub humidity_max_extra: f64,

    pub snowfall_threshold_mm: f64,
    pub snowfall_base_risk: f64,
    pub snowfall_max_extra: f64,
    pub snowfall_saturation_mm: f64,
    /// Liquid precipitation counts while at or below this temperature
    pub freezing_precipitation_max_temp: f64,
    pub precipitation_base_risk: f64,
    pub precipitation_max_extra: f64,
    pub precipitation_saturation_mm: f64,

    pub wind_threshold_kmh: f64,
    pub wind_base_risk: f64,
    pub wind_max_extra: f64,
    pub wind_saturation_kmh: f64,

    pub highway_offset: f64,
    pub arterial_offset: f64,
    pub local_offset: f64,
    pub scenic_offset: f64,

    pub rural_keywords: &'static [&'static str],
    pub rural_offset: f64,
    pub interstate_keywords: &'static [&'static str],
    pub interstate_offset: f64,
    pub mountain_keywords: &'static [&'static str],
    pub mountain_offset: f64,

    pub bridge_radius_m: f64,
    pub bridge_offset: f64,
    pub northern_latitude: f64,
    pub northern_offset: f64,
    pub far_northern_latitude: f64,
    pub far_northern_offset: f64,
    pub elevation_base_latitude: f64,
    pub elevation_per_degree: f64,
    pub elevation_max: f64,

    /// Samples strictly above this count as high-risk segments
    pub high_risk_threshold: f64,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        Self {
            version: "2024.1",

            freezing_band: (-3.0, 1.0),
            freezing_band_risk: 0.55,
            cold_band_low: -8.0,
            warm_band_high: 4.0,
            adjacent_band_risk: 0.35,
            extreme_cold_below: -15.0,
            extreme_cold_risk: 0.25,

            humidity_threshold: 75.0,
            humidity_base_risk: 0.15,
            humidity_max_extra: 0.10,

            snowfall_threshold_mm: 2.0,
            snowfall_base_risk: 0.2,
            snowfall_max_extra: 0.1,
            snowfall_saturation_mm: 10.0,
            freezing_precipitation_max_temp: 2.0,
            precipitation_base_risk: 0.2,
            precipitation_max_extra: 0.2,
            precipitation_saturation_mm: 5.0,

            wind_threshold_kmh: 20.0,
            wind_base_risk: 0.1,
            wind_max_extra: 0.1,
            wind_saturation_kmh: 20.0,

            highway_offset: -0.15,
            arterial_offset: 0.05,
            local_offset: 0.25,
            scenic_offset: 0.35,

            rural_keywords: &[
                "rural",
                "county",
                "back road",
                "backroad",
                "unpaved",
                "gravel",
                "unmaintained",
                "township",
            ],
            rural_offset: 0.2,
            interstate_keywords: &[
                "interstate",
                "freeway",
                "expressway",
                "thruway",
                "turnpike",
                "motorway",
            ],
            interstate_offset: -0.1,
            mountain_keywords: &["mountain", "pass", "summit", "ridge", "steep grade"],
            mountain_offset: 0.15,

            bridge_radius_m: 5_000.0,
            bridge_offset: 0.2,
            northern_latitude: 42.0,
            northern_offset: 0.1,
            far_northern_latitude: 45.0,
            far_northern_offset: 0.1,
            elevation_base_latitude: 40.0,
            elevation_per_degree: 0.005,
            elevation_max: 0.1,

            high_risk_threshold: 0.6,
        }
    }
}

/// Scores weather observations for ice risk
#[derive(Debug, Clone, Default)]
pub struct IceRiskModel {
    policy: RiskPolicy,
}

impl IceRiskModel {
    #[must_use]
    pub fn new(policy: RiskPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &RiskPolicy {
        &self.policy
    }

    /// Ice risk in `[0, 1]` at `location` for the given road context
    #[must_use]
    pub fn risk(
        &self,
        observation: &WeatherObservation,
        location: &Coordinate,
        road_type: RoadType,
        route_context: &str,
    ) -> f64 {
        let total = self.temperature_term(observation.temperature)
            + self.humidity_term(observation.humidity)
            + self.precipitation_term(observation)
            + self.wind_term(observation.wind_speed)
            + self.road_term(road_type, route_context)
            + self.location_term(location);

        if total.is_nan() {
            return 0.0;
        }
        total.clamp(0.0, 1.0)
    }

    /// Category for a risk scalar
    #[must_use]
    pub fn risk_level(risk: f64) -> RiskLevel {
        RiskLevel::from_risk(risk)
    }

    #[must_use]
    pub fn is_near_bridge(&self, location: &Coordinate) -> bool {
        geo::within_radius(location, KNOWN_BRIDGES, self.policy.bridge_radius_m)
    }

    fn temperature_term(&self, temp: f64) -> f64 {
        let p = &self.policy;
        let (band_low, band_high) = p.freezing_band;
        if (band_low..=band_high).contains(&temp) {
            p.freezing_band_risk
        } else if (p.cold_band_low..band_low).contains(&temp)
            || (temp > band_high && temp <= p.warm_band_high)
        {
            p.adjacent_band_risk
        } else if temp < p.extreme_cold_below {
            p.extreme_cold_risk
        } else {
            0.0
        }
    }

    fn humidity_term(&self, humidity: f64) -> f64 {
        let p = &self.policy;
        if humidity <= p.humidity_threshold {
            return 0.0;
        }
        let excess = ((humidity - p.humidity_threshold) / (100.0 - p.humidity_threshold)).min(1.0);
        p.humidity_base_risk + p.humidity_max_extra * excess
    }

    fn precipitation_term(&self, observation: &WeatherObservation) -> f64 {
        let p = &self.policy;
        let mut term = 0.0;

        let snowfall = observation.snowfall.unwrap_or(0.0);
        if snowfall > p.snowfall_threshold_mm {
            let intensity =
                ((snowfall - p.snowfall_threshold_mm) / p.snowfall_saturation_mm).min(1.0);
            term += p.snowfall_base_risk + p.snowfall_max_extra * intensity;
        }

        if observation.precipitation > 0.0
            && observation.temperature <= p.freezing_precipitation_max_temp
        {
            let intensity = (observation.precipitation / p.precipitation_saturation_mm).min(1.0);
            term += p.precipitation_base_risk + p.precipitation_max_extra * intensity;
        }

        term
    }

    fn wind_term(&self, wind_speed: f64) -> f64 {
        let p = &self.policy;
        if wind_speed <= p.wind_threshold_kmh {
            return 0.0;
        }
        let excess = ((wind_speed - p.wind_threshold_kmh) / p.wind_saturation_kmh).min(1.0);
        p.wind_base_risk + p.wind_max_extra * excess
    }

    fn road_term(&self, road_type: RoadType, route_context: &str) -> f64 {
        let p = &self.policy;
        let mut term = match road_type {
            RoadType::Highway => p.highway_offset,
            RoadType::Arterial => p.arterial_offset,
            RoadType::Local => p.local_offset,
            RoadType::Scenic => p.scenic_offset,
        };

        let context = route_context.to_lowercase();
        let mentions = |keywords: &[&str]| keywords.iter().any(|k| context.contains(k));
        if mentions(p.rural_keywords) {
            term += p.rural_offset;
        }
        if mentions(p.interstate_keywords) || mentions_interstate_number(&context) {
            term += p.interstate_offset;
        }
        if mentions(p.mountain_keywords) {
            term += p.mountain_offset;
        }
        term
    }

    fn location_term(&self, location: &Coordinate) -> f64 {
        let p = &self.policy;
        let mut term = 0.0;

        if self.is_near_bridge(location) {
            term += p.bridge_offset;
        }
        if location.latitude > p.northern_latitude {
            term += p.northern_offset;
        }
        if location.latitude > p.far_northern_latitude {
            term += p.far_northern_offset;
        }
        if location.latitude > p.elevation_base_latitude {
            term += ((location.latitude - p.elevation_base_latitude) * p.elevation_per_degree)
                .min(p.elevation_max);
        }
        term
    }
}

/// Interstate shields like "I-35" or "i-90"
fn mentions_interstate_number(lowercase_context: &str) -> bool {
    lowercase_context
        .match_indices("i-")
        .any(|(idx, _)| {
            let preceded_by_word = lowercase_context[..idx]
                .chars()
                .next_back()
                .is_some_and(char::is_alphanumeric);
            let followed_by_digit = lowercase_context[idx + 2..]
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit());
            !preceded_by_word && followed_by_digit
        })
}
