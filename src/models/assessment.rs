//! Per-route risk assessment results

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{RoadType, RoutePoint, RouteVariant, WeatherObservation};

/// Categorical ice risk level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Map a risk scalar to its category, lower bounds inclusive
    #[must_use]
    pub fn from_risk(risk: f64) -> Self {
        if risk >= 0.8 {
            RiskLevel::High
        } else if risk >= 0.6 {
            RiskLevel::Medium
        } else if risk >= 0.3 {
            RiskLevel::Low
        } else {
            RiskLevel::Minimal
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Minimal => "minimal",
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Driver experience tier supplied by the client
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverExperience {
    Beginner,
    #[default]
    Intermediate,
    Expert,
}

impl DriverExperience {
    /// Average risk at or above which a route exceeds this tier's comfort level
    #[must_use]
    pub fn risk_ceiling(&self) -> Option<f64> {
        match self {
            DriverExperience::Beginner => Some(0.5),
            DriverExperience::Intermediate => Some(0.7),
            DriverExperience::Expert => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverExperience::Beginner => "beginner",
            DriverExperience::Intermediate => "intermediate",
            DriverExperience::Expert => "expert",
        }
    }

    /// Tiers for which a route with this average risk is within the ceiling
    #[must_use]
    pub fn suitable_for(average_risk: f64) -> Vec<DriverExperience> {
        [
            DriverExperience::Beginner,
            DriverExperience::Intermediate,
            DriverExperience::Expert,
        ]
        .into_iter()
        .filter(|tier| tier.risk_ceiling().is_none_or(|ceiling| average_risk < ceiling))
        .collect()
    }
}

impl fmt::Display for DriverExperience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriverExperience {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(DriverExperience::Beginner),
            "intermediate" => Ok(DriverExperience::Intermediate),
            "expert" => Ok(DriverExperience::Expert),
            other => Err(format!(
                "unknown driver experience '{other}', expected beginner, intermediate or expert"
            )),
        }
    }
}

/// Weather and risk at one sampled route point
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WeatherSample {
    pub location: RoutePoint,
    pub weather: WeatherObservation,
    #[serde(rename = "ice_risk")]
    pub risk: f64,
    pub road_type: RoadType,
    /// Within bridge proximity of a known bridge or overpass
    pub near_bridge: bool,
}

/// Aggregate risk profile of one route variant
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RouteAssessment {
    pub name: String,
    pub road_type: RoadType,
    pub summary: String,
    pub distance: String,
    pub duration: String,
    pub polyline: String,
    #[serde(rename = "weather_points")]
    pub samples: Vec<WeatherSample>,
    #[serde(rename = "avg_ice_risk")]
    pub average_risk: f64,
    #[serde(rename = "max_ice_risk")]
    pub max_risk: f64,
    pub risk_variance: f64,
    pub high_risk_segments: usize,
    pub risk_level: RiskLevel,
    pub suitable_for: Vec<DriverExperience>,
}

impl RouteAssessment {
    /// Roll samples up into route statistics
    ///
    /// Samples are ordered by sequence index. With no samples every statistic is zero.
    #[must_use]
    pub fn from_samples(
        variant: &RouteVariant,
        mut samples: Vec<WeatherSample>,
        high_risk_threshold: f64,
    ) -> Self {
        samples.sort_by_key(|s| s.location.index);

        let count = samples.len() as f64;
        let (average_risk, max_risk, risk_variance) = if samples.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let mean = samples.iter().map(|s| s.risk).sum::<f64>() / count;
            let max = samples.iter().map(|s| s.risk).fold(f64::MIN, f64::max);
            let variance = samples.iter().map(|s| (s.risk - mean).powi(2)).sum::<f64>() / count;
            (mean, max, variance)
        };
        let high_risk_segments = samples
            .iter()
            .filter(|s| s.risk > high_risk_threshold)
            .count();

        Self {
            name: variant.name.clone(),
            road_type: variant.road_type,
            summary: variant.geometry.summary.clone(),
            distance: variant.geometry.distance_text.clone(),
            duration: variant.geometry.duration_text.clone(),
            polyline: variant.geometry.polyline.clone(),
            samples,
            average_risk,
            max_risk,
            risk_variance,
            high_risk_segments,
            risk_level: RiskLevel::from_risk(average_risk),
            suitable_for: DriverExperience::suitable_for(average_risk),
        }
    }

    /// Safety score in 0..=100, higher is safer
    #[must_use]
    pub fn safety_score(&self) -> u8 {
        ((1.0 - self.average_risk).clamp(0.0, 1.0) * 100.0).round() as u8
    }

    #[must_use]
    pub fn crosses_bridge(&self) -> bool {
        self.samples.iter().any(|s| s.near_bridge)
    }
}
